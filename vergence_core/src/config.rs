// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session configuration.

use crate::capability::Capabilities;
use crate::time::Duration;

/// Smallest render scale the driver will allocate surfaces for.
pub const MIN_RENDER_SCALE: f64 = 0.01;

/// Tunables for a [`FrameDriver`](crate::driver::FrameDriver).
///
/// All values are plain data and may be persisted (see the `serde`
/// feature). Scales can also be changed on a running driver with
/// [`set_render_scale`](crate::driver::FrameDriver::set_render_scale) and
/// [`set_world_scale`](crate::driver::FrameDriver::set_world_scale).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Multiplier from tracking-space meters to world units.
    pub world_scale: f64,
    /// Multiplier applied to the runtime's ideal eye-surface size.
    ///
    /// Expected in `(0, 2.5]`; values below [`MIN_RENDER_SCALE`] are clamped.
    pub render_scale: f64,
    /// Capabilities registered regardless of consumers.
    pub forced_capabilities: Capabilities,
    /// The host draws its own desktop mirror; skip the default blit.
    pub custom_desktop_view: bool,
    /// How often to poll for a headset while none is connected.
    pub hardware_poll_interval: Duration,
    /// How often to repeat the "no headset" warning.
    pub absent_log_interval: Duration,
}

impl SessionConfig {
    /// Default configuration: unit scales, nothing forced, one-second
    /// presence polling, and a warning every five seconds while absent.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            world_scale: 1.0,
            render_scale: 1.0,
            forced_capabilities: Capabilities::NONE,
            custom_desktop_view: false,
            hardware_poll_interval: Duration::from_secs(1),
            absent_log_interval: Duration::from_secs(5),
        }
    }

    /// Returns this configuration with a different world scale.
    #[must_use]
    pub const fn with_world_scale(mut self, scale: f64) -> Self {
        self.world_scale = scale;
        self
    }

    /// Returns this configuration with a different render scale.
    #[must_use]
    pub const fn with_render_scale(mut self, scale: f64) -> Self {
        self.render_scale = scale;
        self
    }

    /// Returns this configuration with additional forced capabilities.
    #[must_use]
    pub const fn with_forced_capabilities(mut self, caps: Capabilities) -> Self {
        self.forced_capabilities = self.forced_capabilities.union(caps);
        self
    }

    /// Returns this configuration with the desktop blit disabled.
    #[must_use]
    pub const fn with_custom_desktop_view(mut self, custom: bool) -> Self {
        self.custom_desktop_view = custom;
        self
    }

    /// Returns this configuration with a different presence poll interval.
    #[must_use]
    pub const fn with_hardware_poll_interval(mut self, interval: Duration) -> Self {
        self.hardware_poll_interval = interval;
        self
    }

    /// The render scale actually used for sizing surfaces.
    ///
    /// NaN and values below [`MIN_RENDER_SCALE`] map to the minimum.
    #[must_use]
    pub fn effective_render_scale(&self) -> f64 {
        if self.render_scale >= MIN_RENDER_SCALE {
            self.render_scale
        } else {
            MIN_RENDER_SCALE
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
