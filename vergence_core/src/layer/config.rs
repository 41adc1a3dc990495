// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor layer configuration and surface sizing.

use kurbo::Size;

use crate::eye::Eye;

/// How the compositor blends a layer's color with the layers below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlphaMode {
    /// Alpha is ignored.
    #[default]
    Opaque,
    /// Color is premultiplied by alpha.
    Premultiplied,
    /// Color is not premultiplied.
    Straight,
}

/// The compositor's treatment of a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerKind {
    /// A full-field stereo projection, reprojected with head motion.
    #[default]
    Projection,
    /// A head-locked overlay composited above projection layers.
    Overlay,
}

/// Parameters of a compositor layer creation request.
///
/// Two registrations with equal configurations share one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerConfig {
    /// Blend mode.
    pub alpha: AlphaMode,
    /// Reproject the layer to the latest pose before display.
    pub timewarp: bool,
    /// Fade the layer out when tracking is lost.
    pub fading: bool,
    /// Apply lens distortion correction.
    pub distortion: bool,
    /// Projection or overlay.
    pub kind: LayerKind,
    /// Submit depth alongside color.
    pub depth: bool,
}

impl LayerConfig {
    /// The base scene layer: opaque projection with every correction on.
    pub const BASE: Self = Self {
        alpha: AlphaMode::Opaque,
        timewarp: true,
        fading: true,
        distortion: true,
        kind: LayerKind::Projection,
        depth: false,
    };

    /// A premultiplied head-locked overlay.
    pub const OVERLAY: Self = Self {
        alpha: AlphaMode::Premultiplied,
        timewarp: false,
        fading: true,
        distortion: true,
        kind: LayerKind::Overlay,
        depth: false,
    };

    /// Returns this configuration with a different alpha mode.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: AlphaMode) -> Self {
        self.alpha = alpha;
        self
    }

    /// Returns this configuration with depth submission toggled.
    #[must_use]
    pub const fn with_depth(mut self, depth: bool) -> Self {
        self.depth = depth;
        self
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self::BASE
    }
}

/// Integer pixel dimensions of one eye's surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// Creates an extent.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either axis is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scales both axes by `factor`, truncating to whole pixels.
    ///
    /// Each axis is at least one pixel so a tiny scale never produces an
    /// unallocatable surface.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "truncation to whole pixels is the sizing policy"
    )]
    pub fn scaled(self, factor: f64) -> Self {
        let size = (Size::new(f64::from(self.width), f64::from(self.height)) * factor).trunc();
        Self {
            width: (size.width as u32).max(1),
            height: (size.height as u32).max(1),
        }
    }
}

/// Parameters of a surface allocation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    /// Pixel dimensions.
    pub extent: Extent,
    /// Which eye the surface renders.
    pub eye: Eye,
    /// Allocate a depth attachment.
    pub depth: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_truncates() {
        let e = Extent::new(1512, 1680);
        assert_eq!(e.scaled(1.0), e);
        assert_eq!(e.scaled(0.5), Extent::new(756, 840));
        assert_eq!(Extent::new(101, 99).scaled(1.5), Extent::new(151, 148));
        assert_eq!(Extent::new(100, 100).scaled(2.0), Extent::new(200, 200));
    }

    #[test]
    fn scaled_never_reaches_zero() {
        assert_eq!(Extent::new(10, 10).scaled(0.01), Extent::new(1, 1));
        assert_eq!(Extent::new(10, 10).scaled(f64::NAN), Extent::new(1, 1));
    }

    #[test]
    fn configs_compare_by_value() {
        assert_eq!(LayerConfig::default(), LayerConfig::BASE);
        assert_ne!(LayerConfig::BASE, LayerConfig::OVERLAY);
        assert_ne!(LayerConfig::BASE, LayerConfig::BASE.with_depth(true));
    }
}
