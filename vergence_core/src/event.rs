// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge-triggered device events.
//!
//! The driver compares each frame's [`FrameState`](crate::state::FrameState)
//! with the previous one and emits one [`DeviceEvent`] per changed field.
//! Hosts either subscribe callbacks on the [`EventBus`] or read the frame's
//! events back from [`FrameDriver::events`](crate::driver::FrameDriver::events).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::eye::Eye;
use crate::tracking::{CalibrationState, EyeOpenness};

/// A change in device state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The headset connected (`true`) or disconnected (`false`).
    ConnectedChanged(bool),
    /// The headset finished (`true`) or lost (`false`) its startup.
    ReadyChanged(bool),
    /// A calibration began.
    CalibrationStarted,
    /// A calibration finished with the given result.
    CalibrationEnded(CalibrationState),
    /// The user started or stopped shifting attention.
    ShiftingAttentionChanged(bool),
    /// One eye opened, closed, or became unknown.
    EyeOpennessChanged {
        /// Which eye.
        eye: Eye,
        /// New openness.
        openness: EyeOpenness,
    },
    /// The user put on or took off the headset.
    UserPresenceChanged(bool),
    /// The headset-adjustment guide appeared or disappeared.
    AdjustmentVisibilityChanged(bool),
}

impl DeviceEvent {
    /// The event's discriminant.
    #[must_use]
    pub const fn kind(&self) -> DeviceEventKind {
        match self {
            Self::ConnectedChanged(_) => DeviceEventKind::Connected,
            Self::ReadyChanged(_) => DeviceEventKind::Ready,
            Self::CalibrationStarted => DeviceEventKind::CalibrationStarted,
            Self::CalibrationEnded(_) => DeviceEventKind::CalibrationEnded,
            Self::ShiftingAttentionChanged(_) => DeviceEventKind::ShiftingAttention,
            Self::EyeOpennessChanged { .. } => DeviceEventKind::EyeOpenness,
            Self::UserPresenceChanged(_) => DeviceEventKind::UserPresence,
            Self::AdjustmentVisibilityChanged(_) => DeviceEventKind::AdjustmentVisibility,
        }
    }
}

/// Discriminant of a [`DeviceEvent`], used to subscribe to one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceEventKind {
    /// [`DeviceEvent::ConnectedChanged`].
    Connected,
    /// [`DeviceEvent::ReadyChanged`].
    Ready,
    /// [`DeviceEvent::CalibrationStarted`].
    CalibrationStarted,
    /// [`DeviceEvent::CalibrationEnded`].
    CalibrationEnded,
    /// [`DeviceEvent::ShiftingAttentionChanged`].
    ShiftingAttention,
    /// [`DeviceEvent::EyeOpennessChanged`].
    EyeOpenness,
    /// [`DeviceEvent::UserPresenceChanged`].
    UserPresence,
    /// [`DeviceEvent::AdjustmentVisibilityChanged`].
    AdjustmentVisibility,
}

impl DeviceEventKind {
    /// Number of kinds.
    pub const COUNT: usize = 8;

    /// Returns a short label for logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Ready => "ready",
            Self::CalibrationStarted => "calibration-started",
            Self::CalibrationEnded => "calibration-ended",
            Self::ShiftingAttention => "shifting-attention",
            Self::EyeOpenness => "eye-openness",
            Self::UserPresence => "user-presence",
            Self::AdjustmentVisibility => "adjustment-visibility",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Identifies a subscription for [`EventBus::unsubscribe`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

type Listener = Box<dyn FnMut(&DeviceEvent)>;

/// Per-kind subscriber lists.
///
/// Listeners run synchronously on the driver thread, in subscription order,
/// with kind-specific listeners before catch-all ones.
pub struct EventBus {
    by_kind: [Vec<(SubscriptionId, Listener)>; DeviceEventKind::COUNT],
    any: Vec<(SubscriptionId, Listener)>,
    next_id: u32,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_kind: core::array::from_fn(|_| Vec::new()),
            any: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribes to one kind of event.
    pub fn subscribe(
        &mut self,
        kind: DeviceEventKind,
        listener: impl FnMut(&DeviceEvent) + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.by_kind[kind.index()].push((id, Box::new(listener)));
        id
    }

    /// Subscribes to every event.
    pub fn subscribe_all(&mut self, listener: impl FnMut(&DeviceEvent) + 'static) -> SubscriptionId {
        let id = self.allocate_id();
        self.any.push((id, Box::new(listener)));
        id
    }

    /// Removes a subscription. Returns `false` if it was not found.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for list in self.by_kind.iter_mut().chain(core::iter::once(&mut self.any)) {
            if let Some(pos) = list.iter().position(|(sid, _)| *sid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Delivers `event` to its listeners.
    pub fn dispatch(&mut self, event: &DeviceEvent) {
        for (_, listener) in &mut self.by_kind[event.kind().index()] {
            listener(event);
        }
        for (_, listener) in &mut self.any {
            listener(event);
        }
    }

    /// Total number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.iter().map(Vec::len).sum::<usize>() + self.any.len()
    }

    /// Returns `true` if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}
