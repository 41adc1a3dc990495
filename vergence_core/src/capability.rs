// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data capabilities and their aggregation.
//!
//! A *capability* is a data feed (gaze, head position, eye-camera images, …)
//! that must be registered with the runtime before the corresponding queries
//! return live data. [`Capabilities`] is a small bitmask over the known
//! feeds.
//!
//! [`CapabilityAggregator`] owns the set that is currently registered. Once
//! per frame it recomputes the union of what every live consumer needs plus
//! a forced set, and registers only the *delta* with the runtime.
//!
//! # Registration points
//!
//! The runtime exposes two independent registration points: the session
//! handle ([`HmdRuntime`]) and its low-level [`Transport`]. Both receive the
//! same delta in the same order (unregister first, then register) so they
//! never disagree about what is enabled.
//!
//! # Failure policy
//!
//! Registration is best effort. A failing call is logged and the attempted
//! set still becomes current; the aggregator does not roll back or retry.
//! This keeps a runtime that rejects a capability from being asked again on
//! every frame.
//!
//! [`Transport`]: crate::runtime::Transport

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

use crate::runtime::{CapabilityRegistrar, HmdRuntime};

/// A set of data capabilities.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Capabilities(u32);

impl Capabilities {
    /// The empty set.
    pub const NONE: Self = Self(0);
    /// Combined and per-eye gaze rays.
    pub const GAZE: Self = Self(1 << 0);
    /// Head orientation.
    pub const ORIENTATION: Self = Self(1 << 1);
    /// Head position.
    pub const POSITION: Self = Self(1 << 2);
    /// Focus distance and vergence point.
    pub const GAZE_DEPTH: Self = Self(1 << 3);
    /// Eye-camera images.
    pub const EYE_IMAGES: Self = Self(1 << 4);
    /// Pupil diameter and iris metrics.
    pub const PUPIL_METRICS: Self = Self(1 << 5);
    /// Position-tracking camera images.
    pub const POSITION_IMAGES: Self = Self(1 << 6);
    /// Proximity-sensor user presence.
    pub const USER_PRESENCE: Self = Self(1 << 7);
    /// Every known capability.
    pub const ALL: Self = Self(0xff);

    const NAMED: [(Self, &'static str); 8] = [
        (Self::GAZE, "GAZE"),
        (Self::ORIENTATION, "ORIENTATION"),
        (Self::POSITION, "POSITION"),
        (Self::GAZE_DEPTH, "GAZE_DEPTH"),
        (Self::EYE_IMAGES, "EYE_IMAGES"),
        (Self::PUPIL_METRICS, "PUPIL_METRICS"),
        (Self::POSITION_IMAGES, "POSITION_IMAGES"),
        (Self::USER_PRESENCE, "USER_PRESENCE"),
    ];

    /// Returns the raw bit representation.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Creates a set from raw bits, dropping unknown bits.
    #[inline]
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every capability in `other` is in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` and `other` share any capability.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Set union.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set intersection.
    #[inline]
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Capabilities in `self` that are not in `other`.
    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterates the named capabilities contained in this set.
    pub fn iter_names(self) -> impl Iterator<Item = (Self, &'static str)> {
        Self::NAMED
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Capabilities {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl BitAnd for Capabilities {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl Not for Capabilities {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Capabilities(")?;
        if self.is_empty() {
            f.write_str("NONE")?;
        }
        for (i, (_, name)) in self.iter_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}

/// The registration calls issued by one [`CapabilityAggregator::recompute`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapabilityDelta {
    /// Capabilities newly registered.
    pub added: Capabilities,
    /// Capabilities unregistered.
    pub removed: Capabilities,
}

impl CapabilityDelta {
    /// Returns `true` if no registration call was issued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps the runtime's registered capabilities equal to what live consumers
/// need.
///
/// The registered set always equals the union of the required capabilities
/// of every registered consumer plus the forced set passed to
/// [`recompute`](Self::recompute). Inactive consumers report an empty set;
/// the registry supplies the last reported set of a consumer it cannot
/// borrow.
#[derive(Debug, Default)]
pub struct CapabilityAggregator {
    current: Capabilities,
}

impl CapabilityAggregator {
    /// Creates an aggregator with nothing registered.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Capabilities::NONE,
        }
    }

    /// Returns the set the aggregator last applied.
    #[must_use]
    pub const fn current(&self) -> Capabilities {
        self.current
    }

    /// Computes the union of the consumers' required capabilities and
    /// `forced`.
    pub fn required(
        consumers: impl IntoIterator<Item = Capabilities>,
        forced: Capabilities,
    ) -> Capabilities {
        consumers.into_iter().fold(forced, Capabilities::union)
    }

    /// Recomputes the required set from each consumer's requirements and
    /// registers the delta with both registration points.
    pub fn recompute<R: HmdRuntime + ?Sized>(
        &mut self,
        consumers: impl IntoIterator<Item = Capabilities>,
        forced: Capabilities,
        runtime: &mut R,
    ) -> CapabilityDelta {
        let target = Self::required(consumers, forced);
        self.apply(target, runtime)
    }

    /// Makes `target` the registered set, issuing calls only for the
    /// difference from the current set.
    pub fn apply<R: HmdRuntime + ?Sized>(
        &mut self,
        target: Capabilities,
        runtime: &mut R,
    ) -> CapabilityDelta {
        if target == self.current {
            return CapabilityDelta::default();
        }
        let delta = CapabilityDelta {
            added: target.difference(self.current),
            removed: self.current.difference(target),
        };
        log::debug!("capabilities: +{:?} -{:?}", delta.added, delta.removed);
        sync_registrar(runtime.transport(), &delta, "transport");
        sync_registrar(runtime, &delta, "session");
        self.current = target;
        delta
    }

    /// Unregisters everything currently registered.
    pub fn reset<R: HmdRuntime + ?Sized>(&mut self, runtime: &mut R) -> CapabilityDelta {
        self.apply(Capabilities::NONE, runtime)
    }
}

fn sync_registrar<T: CapabilityRegistrar + ?Sized>(
    registrar: &mut T,
    delta: &CapabilityDelta,
    point: &str,
) {
    if !delta.removed.is_empty()
        && let Err(err) = registrar.unregister_capabilities(delta.removed)
    {
        log::warn!("{point}: unregistering {:?} failed: {err}", delta.removed);
    }
    if !delta.added.is_empty()
        && let Err(err) = registrar.register_capabilities(delta.added)
    {
        log::warn!("{point}: registering {:?} failed: {err}", delta.added);
    }
}
