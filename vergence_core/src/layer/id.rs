// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer, surface, and native-handle identity types.

use core::fmt;
use core::num::NonZeroU64;

/// An opaque compositor layer handle issued by
/// [`HmdRuntime::create_layer`](crate::runtime::HmdRuntime::create_layer).
///
/// The value has no meaning to this crate beyond identity; it is only ever
/// handed back to the runtime that issued it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

/// An opaque render surface allocated through
/// [`HmdRuntime::create_surface`](crate::runtime::HmdRuntime::create_surface).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// A GPU-native texture handle backing a surface.
///
/// Non-zero by construction: a surface whose native object has not been
/// materialized yet reports `None` instead of a null handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(NonZeroU64);

impl NativeHandle {
    /// Wraps a raw handle, returning `None` for null.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns the raw handle value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:#x})", self.0.get())
    }
}
