// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering consumers.
//!
//! A consumer is anything that draws into a layer's eye surfaces: a scene
//! camera, a UI overlay, a debug gaze cursor. The driver never owns
//! consumers; the host keeps them alive and registers a shared handle.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::capability::Capabilities;
use crate::eye::{Eye, EyeMask};
use crate::layer::{Extent, LayerId, SurfaceId};
use crate::pose::Pose;

/// Where and how one eye of a layer is being rendered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeTarget {
    /// The layer being composed.
    pub layer: LayerId,
    /// The eye being rendered.
    pub eye: Eye,
    /// Surface to draw into.
    pub surface: SurfaceId,
    /// Surface size in pixels.
    pub extent: Extent,
    /// Head pose this frame is rendered with.
    pub pose: Pose,
}

/// Something that renders into a compositor layer.
pub trait RenderConsumer {
    /// Draw order within a layer; lower values render first.
    fn priority(&self) -> f32;

    /// Data feeds this consumer needs while active.
    ///
    /// An inactive consumer returns [`Capabilities::NONE`].
    fn required_capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Which eyes this consumer draws into.
    fn eye_mask(&self) -> EyeMask {
        EyeMask::BOTH
    }

    /// Draws this consumer's content for one eye.
    fn render_into(&mut self, eye: Eye, target: &EyeTarget);
}

/// A shared, non-owning handle to a consumer.
///
/// Identity is pointer identity; see [`same_consumer`].
pub type SharedConsumer = Rc<RefCell<dyn RenderConsumer>>;

/// Returns `true` if `a` and `b` are the same consumer.
#[inline]
#[must_use]
pub fn same_consumer(a: &SharedConsumer, b: &SharedConsumer) -> bool {
    Rc::ptr_eq(a, b)
}
