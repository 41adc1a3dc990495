// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame device state snapshot and its edge detection.

use alloc::vec::Vec;

use crate::eye::{Eye, PerEye};
use crate::event::DeviceEvent;
use crate::tracking::{CalibrationState, EyeOpenness};

/// The device state fields that raise events when they change.
///
/// Built whole once per frame from the latest fetched data and compared
/// against the previous frame's value with [`diff`](Self::diff).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameState {
    /// A headset is connected.
    pub connected: bool,
    /// The headset has finished starting up.
    pub ready: bool,
    /// Calibration status.
    pub calibration: CalibrationState,
    /// The user is shifting attention.
    pub shifting_attention: bool,
    /// The proximity sensor reports a user.
    pub user_present: bool,
    /// Per-eye openness.
    pub eyes: PerEye<EyeOpenness>,
    /// The adjustment guide is visible.
    pub adjustment_visible: bool,
}

impl FrameState {
    /// Appends one event per field that differs between `self` (previous)
    /// and `next`.
    ///
    /// Calibration raises [`DeviceEvent::CalibrationStarted`] when it enters
    /// [`CalibrationState::Calibrating`] and [`DeviceEvent::CalibrationEnded`]
    /// with the resulting state when it leaves it; other calibration changes
    /// are not edges.
    pub fn diff(&self, next: &Self, out: &mut Vec<DeviceEvent>) {
        if self.connected != next.connected {
            out.push(DeviceEvent::ConnectedChanged(next.connected));
        }
        if self.ready != next.ready {
            out.push(DeviceEvent::ReadyChanged(next.ready));
        }
        match (
            self.calibration.is_calibrating(),
            next.calibration.is_calibrating(),
        ) {
            (false, true) => out.push(DeviceEvent::CalibrationStarted),
            (true, false) => out.push(DeviceEvent::CalibrationEnded(next.calibration)),
            _ => {}
        }
        if self.shifting_attention != next.shifting_attention {
            out.push(DeviceEvent::ShiftingAttentionChanged(
                next.shifting_attention,
            ));
        }
        for eye in Eye::ALL {
            if self.eyes[eye] != next.eyes[eye] {
                out.push(DeviceEvent::EyeOpennessChanged {
                    eye,
                    openness: next.eyes[eye],
                });
            }
        }
        if self.user_present != next.user_present {
            out.push(DeviceEvent::UserPresenceChanged(next.user_present));
        }
        if self.adjustment_visible != next.adjustment_visible {
            out.push(DeviceEvent::AdjustmentVisibilityChanged(
                next.adjustment_visible,
            ));
        }
    }
}
