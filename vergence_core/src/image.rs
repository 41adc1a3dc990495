// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Auxiliary camera images.
//!
//! Eye-camera and position-camera frames are polled every frame but only
//! replace the cached copy when the runtime actually produced a newer,
//! non-empty image.

use alloc::vec::Vec;
use core::fmt;

use crate::capability::Capabilities;
use crate::time::HostTime;

/// Which camera an image comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Infrared eye-tracking cameras.
    EyeCamera,
    /// Outside-in or inside-out position-tracking cameras.
    PositionCamera,
}

impl ImageKind {
    /// The capability that must be registered for the runtime to produce
    /// this image.
    #[must_use]
    pub const fn capability(self) -> Capabilities {
        match self {
            Self::EyeCamera => Capabilities::EYE_IMAGES,
            Self::PositionCamera => Capabilities::POSITION_IMAGES,
        }
    }
}

/// A grayscale camera frame.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFrame {
    /// Row-major 8-bit pixels, `width * height` bytes.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Capture time on the runtime clock.
    pub timestamp: HostTime,
}

impl fmt::Debug for ImageFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// The cached latest frame of one camera.
#[derive(Clone, Debug, Default)]
pub struct ImageSlot {
    frame: Option<ImageFrame>,
}

impl ImageSlot {
    /// Returns the cached frame, if any.
    #[must_use]
    pub fn frame(&self) -> Option<&ImageFrame> {
        self.frame.as_ref()
    }

    /// Timestamp of the cached frame, or [`HostTime::ZERO`].
    #[must_use]
    pub fn timestamp(&self) -> HostTime {
        self.latest().unwrap_or(HostTime::ZERO)
    }

    /// Timestamp of the cached frame, if there is one.
    #[must_use]
    pub fn latest(&self) -> Option<HostTime> {
        self.frame.as_ref().map(|f| f.timestamp)
    }

    /// Replaces the cached frame if `frame` is newer and non-empty.
    ///
    /// Returns `true` if the cache changed.
    pub fn refresh(&mut self, frame: ImageFrame) -> bool {
        if frame.width == 0 || frame.height == 0 {
            return false;
        }
        if self.frame.is_some() && frame.timestamp <= self.timestamp() {
            return false;
        }
        self.frame = Some(frame);
        true
    }

    /// Drops the cached frame.
    pub fn clear(&mut self) {
        self.frame = None;
    }
}
