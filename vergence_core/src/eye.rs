// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-eye identifiers and containers.

use core::fmt;
use core::ops::{Index, IndexMut};

/// One of the two eyes of a stereo display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Eye {
    /// Left eye.
    Left,
    /// Right eye.
    Right,
}

impl Eye {
    /// Both eyes, in render order.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Returns a short label for logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Which eyes a consumer renders into.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EyeMask(u8);

impl EyeMask {
    /// Renders into neither eye.
    pub const NONE: Self = Self(0);
    /// Renders into the left eye only.
    pub const LEFT: Self = Self(1);
    /// Renders into the right eye only.
    pub const RIGHT: Self = Self(2);
    /// Renders into both eyes.
    pub const BOTH: Self = Self(3);

    /// Returns `true` if the mask includes `eye`.
    #[inline]
    #[must_use]
    pub const fn contains(self, eye: Eye) -> bool {
        let bit = match eye {
            Eye::Left => Self::LEFT.0,
            Eye::Right => Self::RIGHT.0,
        };
        self.0 & bit != 0
    }
}

impl Default for EyeMask {
    fn default() -> Self {
        Self::BOTH
    }
}

impl fmt::Debug for EyeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NONE => "NONE",
            Self::LEFT => "LEFT",
            Self::RIGHT => "RIGHT",
            _ => "BOTH",
        };
        write!(f, "EyeMask({name})")
    }
}

/// A left/right pair of values indexed by [`Eye`].
///
/// Indexing is total: there is no out-of-range eye, so reads and writes can
/// never disagree about bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerEye<T> {
    /// Left-eye value.
    pub left: T,
    /// Right-eye value.
    pub right: T,
}

impl<T> PerEye<T> {
    /// Creates a pair from its two values.
    #[inline]
    pub const fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Applies `f` to both values.
    #[inline]
    pub fn map<U>(self, mut f: impl FnMut(Eye, T) -> U) -> PerEye<U> {
        PerEye {
            left: f(Eye::Left, self.left),
            right: f(Eye::Right, self.right),
        }
    }

    /// Iterates `(eye, value)` in render order.
    pub fn iter(&self) -> impl Iterator<Item = (Eye, &T)> {
        [(Eye::Left, &self.left), (Eye::Right, &self.right)].into_iter()
    }
}

impl<T: Clone> PerEye<T> {
    /// Creates a pair holding `value` for both eyes.
    #[inline]
    pub fn splat(value: T) -> Self {
        Self {
            left: value.clone(),
            right: value,
        }
    }
}

impl<T> Index<Eye> for PerEye<T> {
    type Output = T;

    #[inline]
    fn index(&self, eye: Eye) -> &T {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Eye> for PerEye<T> {
    #[inline]
    fn index_mut(&mut self, eye: Eye) -> &mut T {
        match eye {
            Eye::Left => &mut self.left,
            Eye::Right => &mut self.right,
        }
    }
}
