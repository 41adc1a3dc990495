// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime call log.

use std::cell::RefCell;
use std::rc::Rc;

use vergence_core::capability::Capabilities;
use vergence_core::eye::Eye;
use vergence_core::image::ImageKind;
use vergence_core::layer::{Extent, LayerId, SurfaceId};

/// One recorded call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    /// Session `register_capabilities`.
    Register(Capabilities),
    /// Session `unregister_capabilities`.
    Unregister(Capabilities),
    /// Transport `register_capabilities`.
    TransportRegister(Capabilities),
    /// Transport `unregister_capabilities`.
    TransportUnregister(Capabilities),
    /// `is_hardware_connected` and its answer.
    IsConnected(bool),
    /// `is_hardware_ready`.
    IsReady,
    /// `fetch_eye_tracking_data`.
    FetchEyeTracking,
    /// `fetch_pose_data`.
    FetchPose,
    /// Transport `last_submitted_pose`.
    LastSubmittedPose,
    /// `ideal_layer_dimensions`.
    IdealDimensions(LayerId),
    /// `create_layer` and the issued id.
    CreateLayer(LayerId),
    /// `delete_layer`.
    DeleteLayer(LayerId),
    /// `create_surface` and the issued id.
    CreateSurface(SurfaceId, Extent),
    /// `destroy_surface`.
    DestroySurface(SurfaceId),
    /// `clear_surface`.
    Clear(SurfaceId),
    /// `flush`.
    Flush,
    /// `set_eye_texture`.
    SetEyeTexture(LayerId, Eye),
    /// A consumer's `render_into`, recorded by [`RecordingConsumer`].
    ///
    /// [`RecordingConsumer`]: crate::RecordingConsumer
    Render {
        /// Consumer tag.
        consumer: u32,
        /// Target layer.
        layer: LayerId,
        /// Target eye.
        eye: Eye,
    },
    /// `submit`.
    Submit(LayerId),
    /// `blit_to_display`.
    Blit,
    /// `await_end_of_frame`.
    AwaitEndOfFrame,
    /// `wait_for_render_pose`.
    WaitForRenderPose,
    /// `is_compositor_ready`.
    IsCompositorReady,
    /// `image`.
    Image(ImageKind),
    /// `shutdown`.
    Shutdown,
}

/// A shared, append-only list of [`Call`]s.
///
/// Cloning the log yields another handle to the same list.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call.
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    /// Copies the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Removes and returns the recorded calls.
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// Forgets the recorded calls.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Number of recorded calls matching `pred`.
    #[must_use]
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Index of the first call matching `pred`.
    #[must_use]
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(pred)
    }

    /// Index of the last call matching `pred`.
    #[must_use]
    pub fn rposition(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.borrow().iter().rposition(pred)
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
