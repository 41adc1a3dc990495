// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking samples fetched from the runtime and the values derived from
//! them each frame.

use crate::eye::{Eye, PerEye};
use crate::image::ImageSlot;
use crate::pose::{Pose, Quat, Ray, Vec3};
use crate::state::FrameState;
use crate::time::HostTime;

/// Validity of a gaze or pupil measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GazeStatus {
    /// No usable measurement.
    #[default]
    Invalid,
    /// Measurement is valid.
    Valid,
}

/// Whether an eye is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EyeOpenness {
    /// Eye is open.
    Open,
    /// Eye is closed.
    Closed,
    /// The tracker cannot tell.
    #[default]
    Unknown,
}

/// Eye-tracking calibration status of the current user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationState {
    /// No calibration has been run for this user.
    #[default]
    NotCalibrated,
    /// A calibration is in progress.
    Calibrating,
    /// Calibration succeeded.
    Calibrated,
    /// The last calibration attempt failed.
    Failed,
}

impl CalibrationState {
    /// Returns `true` while a calibration is running.
    #[inline]
    #[must_use]
    pub const fn is_calibrating(self) -> bool {
        matches!(self, Self::Calibrating)
    }
}

/// One eye's share of an eye-tracking sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EyeSample {
    /// Gaze ray from this eye.
    pub gaze: Ray,
    /// Gaze validity.
    pub gaze_status: GazeStatus,
    /// Open, closed, or unknown.
    pub openness: EyeOpenness,
    /// Pupil diameter in millimeters.
    pub pupil_diameter: f64,
    /// Pupil measurement validity.
    pub pupil_status: GazeStatus,
}

/// An eye-tracking sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EyeTrackingData {
    /// Capture time on the runtime clock.
    pub timestamp: HostTime,
    /// Tracker frame counter.
    pub frame_number: u64,
    /// Validity of the combined gaze.
    pub status: GazeStatus,
    /// Combined (cyclopean) gaze ray.
    pub combined: Ray,
    /// Per-eye samples.
    pub eyes: PerEye<EyeSample>,
    /// Distance to the focus point in meters.
    pub focus_distance: f64,
    /// Stability of the focus estimate in `[0, 1]`.
    pub focus_stability: f64,
    /// Point where the two gaze rays converge.
    pub convergence: Vec3,
    /// Calibration status.
    pub calibration: CalibrationState,
    /// The user is shifting attention (saccade in progress).
    pub shifting_attention: bool,
    /// The proximity sensor reports a user.
    pub user_present: bool,
}

/// A head-pose sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoseData {
    /// Capture time on the runtime clock.
    pub timestamp: HostTime,
    /// Head pose in tracking space.
    pub head: Pose,
    /// Offset from the seated origin to the standing origin.
    pub standing_origin: Vec3,
    /// The runtime's headset-adjustment guide is on screen.
    pub adjustment_visible: bool,
}

/// The latest tracking values, as seen by consumers during a frame.
///
/// Updated by the driver once per frame. Fields keep their previous value
/// when the corresponding fetch fails.
#[derive(Clone, Debug, Default)]
pub struct TrackingState {
    /// Latest eye-tracking sample.
    pub eye: EyeTrackingData,
    /// Latest head-pose sample.
    pub pose: PoseData,
    /// The pose the compositor will render with (from the transport).
    pub render_pose: Pose,
    /// Render-pose position in world units.
    pub world_position: Vec3,
    /// Standing position (render pose plus standing origin) in world units.
    pub standing_position: Vec3,
    /// Render-pose orientation.
    pub orientation: Quat,
    /// Latest eye-camera image.
    pub eye_image: ImageSlot,
    /// Latest position-camera image.
    pub position_image: ImageSlot,
}

impl TrackingState {
    /// Recomputes the world-space values from the render pose.
    pub fn derive_world(&mut self, world_scale: f64) {
        self.world_position = self.render_pose.position * world_scale;
        self.standing_position =
            (self.render_pose.position + self.pose.standing_origin) * world_scale;
        self.orientation = self.render_pose.orientation;
    }

    /// The combined gaze ray.
    #[must_use]
    pub fn gaze(&self) -> Ray {
        self.eye.combined
    }

    /// Openness of one eye.
    #[must_use]
    pub fn eye_openness(&self, eye: Eye) -> EyeOpenness {
        self.eye.eyes[eye].openness
    }
}

/// An owned copy of one frame's query surface.
///
/// The driver is tied to its thread; worker threads (a gaze logger, a
/// network relay) receive these instead.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Runtime time at the start of the frame.
    pub now: HostTime,
    /// Edge-tracked device state.
    pub state: FrameState,
    /// Eye-tracking sample.
    pub eye: EyeTrackingData,
    /// Render pose.
    pub render_pose: Pose,
    /// Render-pose position in world units.
    pub world_position: Vec3,
    /// Standing position in world units.
    pub standing_position: Vec3,
}
