// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime contract for HMD backends.
//!
//! Vergence splits device-specific work into *backend* crates. A backend
//! implements two traits over the vendor runtime:
//!
//! - **[`Transport`]**: the low-level connection to the runtime service. It
//!   has its own capability registration point and is the authority on which
//!   pose the compositor is actually rendering with.
//!
//! - **[`HmdRuntime`]**: the session handle. Tracking queries, layer and
//!   surface management, compositor submission, and the blocking frame
//!   barriers.
//!
//! Both share [`CapabilityRegistrar`] so the
//! [`CapabilityAggregator`](crate::capability::CapabilityAggregator) can keep
//! them consistent.
//!
//! # Crate boundaries
//!
//! `vergence_core` owns the data model, the frame driver, and this contract
//! module. Backend crates depend on `vergence_core` and provide device glue.
//! Application code depends on both and hands the backend to
//! [`FrameDriver::new`](crate::driver::FrameDriver::new).
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! let mut driver = FrameDriver::new(runtime, SessionConfig::new());
//! driver.register(LayerConfig::BASE, scene_camera.clone());
//! loop {
//!     match driver.tick() {
//!         TickOutcome::Rendered { .. } => {}
//!         TickOutcome::Polling => sleep_until_next_host_frame(),
//!         _ => {}
//!     }
//! }
//! let runtime = driver.shutdown();
//! ```

use core::fmt;

use crate::capability::Capabilities;
use crate::eye::{Eye, PerEye};
use crate::image::{ImageFrame, ImageKind};
use crate::layer::{Extent, LayerConfig, LayerId, NativeHandle, SurfaceDesc, SurfaceId};
use crate::pose::Pose;
use crate::time::HostTime;
use crate::tracking::{EyeTrackingData, PoseData};

/// A runtime entry point, named in [`RuntimeError::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeCall {
    /// Capability registration or unregistration.
    Capabilities,
    /// Eye-tracking or pose fetch.
    Fetch,
    /// Ideal layer dimension query.
    LayerDimensions,
    /// Layer creation or deletion.
    Layer,
    /// Surface allocation.
    Surface,
    /// `set_eye_texture`.
    EyeTexture,
    /// Compositor submission.
    Submit,
    /// The render-pose barrier.
    WaitPose,
    /// Camera image query.
    Image,
    /// Any other call.
    Other,
}

impl RuntimeCall {
    /// Returns a short label for logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capabilities => "capabilities",
            Self::Fetch => "fetch",
            Self::LayerDimensions => "layer dimensions",
            Self::Layer => "layer",
            Self::Surface => "surface",
            Self::EyeTexture => "eye texture",
            Self::Submit => "submit",
            Self::WaitPose => "wait pose",
            Self::Image => "image",
            Self::Other => "runtime",
        }
    }
}

/// Errors returned by runtime calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime service is not connected.
    NotConnected,
    /// The call timed out.
    Timeout,
    /// The layer handle is unknown to the runtime.
    InvalidLayer(LayerId),
    /// The runtime does not support these capabilities.
    Unsupported(Capabilities),
    /// The runtime reported a failure code.
    Failed {
        /// Which call failed.
        call: RuntimeCall,
        /// Vendor status code.
        code: i32,
    },
}

impl RuntimeError {
    /// Returns `true` for connectivity errors that are expected to clear on
    /// their own.
    ///
    /// A transient error during the fetch step skips the rest of the frame
    /// without treating the headset as disconnected.
    #[inline]
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Timeout)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => f.write_str("runtime not connected"),
            Self::Timeout => f.write_str("runtime call timed out"),
            Self::InvalidLayer(id) => write!(f, "invalid layer {}", id.0),
            Self::Unsupported(caps) => write!(f, "unsupported capabilities {caps:?}"),
            Self::Failed { call, code } => write!(f, "{} call failed ({code})", call.as_str()),
        }
    }
}

impl core::error::Error for RuntimeError {}

/// A point where data capabilities are enabled.
pub trait CapabilityRegistrar {
    /// Enables `caps` in addition to what is already enabled.
    fn register_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError>;

    /// Disables `caps`.
    fn unregister_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError>;
}

/// The low-level connection to the runtime service.
pub trait Transport: CapabilityRegistrar {
    /// The pose the compositor used for the most recent submission.
    ///
    /// This, not the freshly fetched head pose, is what consumers render
    /// with, so that what is drawn matches what is reprojected.
    fn last_submitted_pose(&mut self) -> Result<Pose, RuntimeError>;
}

/// The session handle of an HMD runtime.
///
/// Every method is called from the thread that owns the
/// [`FrameDriver`](crate::driver::FrameDriver). The two blocking barriers,
/// [`await_end_of_frame`](Self::await_end_of_frame) and
/// [`wait_for_render_pose`](Self::wait_for_render_pose), are the only points
/// where the driver expects to be suspended.
pub trait HmdRuntime: CapabilityRegistrar {
    /// The low-level transport.
    fn transport(&mut self) -> &mut dyn Transport;

    /// Reads the runtime's monotonic clock.
    fn now(&self) -> HostTime;

    /// Returns `true` while a headset is attached and the service sees it.
    ///
    /// Used both for the presence poll while disconnected and for the
    /// per-frame connection check.
    fn is_hardware_connected(&mut self) -> bool;

    /// Returns `true` once the headset has finished its own startup.
    fn is_hardware_ready(&mut self) -> Result<bool, RuntimeError>;

    /// Fetches the latest eye-tracking sample.
    fn fetch_eye_tracking_data(&mut self) -> Result<EyeTrackingData, RuntimeError>;

    /// Fetches the latest head-pose sample.
    fn fetch_pose_data(&mut self) -> Result<PoseData, RuntimeError>;

    /// The runtime's preferred per-eye pixel size for `layer`.
    fn ideal_layer_dimensions(&mut self, layer: LayerId) -> Result<Extent, RuntimeError>;

    /// Creates a compositor layer.
    fn create_layer(&mut self, config: &LayerConfig) -> Result<LayerId, RuntimeError>;

    /// Releases a compositor layer.
    fn delete_layer(&mut self, layer: LayerId);

    /// Allocates a render surface.
    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceId, RuntimeError>;

    /// Releases a render surface.
    fn destroy_surface(&mut self, surface: SurfaceId);

    /// The GPU-native handle of a surface, once it has been materialized.
    ///
    /// Freshly created surfaces typically report `None` until they have been
    /// written and flushed at least once.
    fn native_handle(&mut self, surface: SurfaceId) -> Option<NativeHandle>;

    /// Clears a surface to transparent black.
    fn clear_surface(&mut self, surface: SurfaceId);

    /// Flushes pending GPU work.
    fn flush(&mut self);

    /// Tells the compositor which texture backs one eye of a layer.
    fn set_eye_texture(
        &mut self,
        layer: LayerId,
        eye: Eye,
        handle: NativeHandle,
    ) -> Result<(), RuntimeError>;

    /// Submits a layer's current eye textures, rendered with `pose`.
    fn submit(&mut self, layer: LayerId, pose: &Pose) -> Result<(), RuntimeError>;

    /// Copies a stereo pair to the desktop mirror window.
    fn blit_to_display(&mut self, surfaces: &PerEye<SurfaceId>);

    /// Blocks until the host's rendering for this frame may begin.
    fn await_end_of_frame(&mut self) {}

    /// Blocks until the compositor has a render pose for the next frame.
    fn wait_for_render_pose(&mut self) -> Result<(), RuntimeError>;

    /// Returns `true` once the compositor accepts submissions.
    fn is_compositor_ready(&mut self) -> bool;

    /// The latest camera image of `kind`, or `None` if it is not newer
    /// than `newer_than`.
    ///
    /// Implementations check the timestamp before copying pixels.
    fn image(
        &mut self,
        kind: ImageKind,
        newer_than: Option<HostTime>,
    ) -> Result<Option<ImageFrame>, RuntimeError>;

    /// Closes the session.
    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn transient_classification() {
        assert!(RuntimeError::NotConnected.is_transient());
        assert!(RuntimeError::Timeout.is_transient());
        assert!(!RuntimeError::InvalidLayer(LayerId(3)).is_transient());
        let failed = RuntimeError::Failed {
            call: RuntimeCall::Submit,
            code: -2,
        };
        assert!(!failed.is_transient());
    }

    #[test]
    fn display_messages() {
        let failed = RuntimeError::Failed {
            call: RuntimeCall::LayerDimensions,
            code: 7,
        };
        assert_eq!(failed.to_string(), "layer dimensions call failed (7)");
        assert_eq!(
            RuntimeError::Unsupported(Capabilities::GAZE).to_string(),
            "unsupported capabilities Capabilities(GAZE)"
        );
    }
}
