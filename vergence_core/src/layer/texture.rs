// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer stereo render surfaces.

use alloc::collections::BTreeMap;

use super::{Extent, LayerId, SurfaceDesc, SurfaceId};
use crate::eye::{Eye, PerEye};
use crate::runtime::{HmdRuntime, RuntimeError};

/// Whether a pair may be submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairState {
    /// At least one native handle has not materialized yet.
    Pending,
    /// Both handles are known to the compositor.
    Ready,
}

/// Left and right surfaces of identical size.
#[derive(Debug, PartialEq, Eq)]
pub struct EyeTexturePair {
    surfaces: PerEye<SurfaceId>,
    extent: Extent,
    state: PairState,
}

impl EyeTexturePair {
    fn allocate<R: HmdRuntime + ?Sized>(
        runtime: &mut R,
        extent: Extent,
        depth: bool,
    ) -> Result<Self, RuntimeError> {
        let desc = |eye| SurfaceDesc { extent, eye, depth };
        let left = runtime.create_surface(&desc(Eye::Left))?;
        let right = match runtime.create_surface(&desc(Eye::Right)) {
            Ok(right) => right,
            Err(err) => {
                runtime.destroy_surface(left);
                return Err(err);
            }
        };
        Ok(Self {
            surfaces: PerEye::new(left, right),
            extent,
            state: PairState::Pending,
        })
    }

    /// The two surfaces.
    #[must_use]
    pub fn surfaces(&self) -> &PerEye<SurfaceId> {
        &self.surfaces
    }

    /// Per-eye pixel size.
    #[must_use]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Pending or ready.
    #[must_use]
    pub fn state(&self) -> PairState {
        self.state
    }

    /// Returns `true` once the pair may be submitted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == PairState::Ready
    }

    /// Clears both surfaces.
    pub fn clear<R: HmdRuntime + ?Sized>(&self, runtime: &mut R) {
        for (_, surface) in self.surfaces.iter() {
            runtime.clear_surface(*surface);
        }
    }

    /// Hands the native handles to the compositor once both exist.
    ///
    /// Returns `true` if the pair is ready afterwards. A failed
    /// `set_eye_texture` leaves the pair pending so the next frame retries.
    pub fn poll_ready<R: HmdRuntime + ?Sized>(&mut self, layer: LayerId, runtime: &mut R) -> bool {
        if self.is_ready() {
            return true;
        }
        let (Some(left), Some(right)) = (
            runtime.native_handle(self.surfaces.left),
            runtime.native_handle(self.surfaces.right),
        ) else {
            return false;
        };
        for (eye, handle) in [(Eye::Left, left), (Eye::Right, right)] {
            if let Err(err) = runtime.set_eye_texture(layer, eye, handle) {
                log::warn!("set_eye_texture({layer:?}, {}) failed: {err}", eye.as_str());
                return false;
            }
        }
        self.state = PairState::Ready;
        log::debug!("eye textures for {layer:?} ready at {:?}", self.extent);
        true
    }

    fn destroy<R: HmdRuntime + ?Sized>(self, runtime: &mut R) {
        runtime.destroy_surface(self.surfaces.left);
        runtime.destroy_surface(self.surfaces.right);
    }
}

/// One [`EyeTexturePair`] per layer, reallocated when its size goes stale.
#[derive(Debug, Default)]
pub struct EyeTextureCache {
    pairs: BTreeMap<LayerId, EyeTexturePair>,
}

impl EyeTextureCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pairs: BTreeMap::new(),
        }
    }

    /// Returns the pair for `layer`, allocating a new pending pair if none is
    /// cached or the cached one no longer matches
    /// `ideal_layer_dimensions(layer) * render_scale`.
    ///
    /// If the dimension query fails the cached pair is returned unchanged.
    /// Returns `None` when there is no usable pair this frame.
    pub fn get_or_create<R: HmdRuntime + ?Sized>(
        &mut self,
        layer: LayerId,
        runtime: &mut R,
        render_scale: f64,
        depth: bool,
    ) -> Option<&mut EyeTexturePair> {
        let ideal = match runtime.ideal_layer_dimensions(layer) {
            Ok(ideal) => ideal,
            Err(err) => {
                log::warn!("ideal dimensions for {layer:?} unavailable: {err}");
                return self.pairs.get_mut(&layer);
            }
        };
        let target = ideal.scaled(render_scale);
        if self.pairs.get(&layer).is_none_or(|p| p.extent != target) {
            if let Some(stale) = self.pairs.remove(&layer) {
                log::debug!(
                    "eye textures for {layer:?}: {:?} -> {target:?}",
                    stale.extent
                );
                stale.destroy(runtime);
            }
            match EyeTexturePair::allocate(runtime, target, depth) {
                Ok(pair) => {
                    self.pairs.insert(layer, pair);
                }
                Err(err) => {
                    log::warn!("allocating eye textures for {layer:?} failed: {err}");
                    return None;
                }
            }
        }
        self.pairs.get_mut(&layer)
    }

    /// The cached pair for `layer`, if any.
    #[must_use]
    pub fn get(&self, layer: LayerId) -> Option<&EyeTexturePair> {
        self.pairs.get(&layer)
    }

    /// Destroys the pair for `layer`. Returns `false` if none was cached.
    pub fn release<R: HmdRuntime + ?Sized>(&mut self, layer: LayerId, runtime: &mut R) -> bool {
        match self.pairs.remove(&layer) {
            Some(pair) => {
                pair.destroy(runtime);
                true
            }
            None => false,
        }
    }

    /// Destroys every cached pair.
    pub fn clear<R: HmdRuntime + ?Sized>(&mut self, runtime: &mut R) {
        for (_, pair) in core::mem::take(&mut self.pairs) {
            pair.destroy(runtime);
        }
    }

    /// Number of cached pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockRuntime};
    use crate::runtime::RuntimeCall;

    const LAYER: LayerId = LayerId(7);

    #[test]
    fn pair_is_reused_until_scale_changes() {
        let mut rt = MockRuntime::new();
        let mut cache = EyeTextureCache::new();

        let a = *cache.get_or_create(LAYER, &mut rt, 1.0, false).unwrap().surfaces();
        assert_eq!(cache.get(LAYER).unwrap().extent(), Extent::new(100, 100));

        let b = *cache.get_or_create(LAYER, &mut rt, 2.0, false).unwrap().surfaces();
        assert_ne!(a, b, "new scale reallocates");
        assert_eq!(cache.get(LAYER).unwrap().extent(), Extent::new(200, 200));

        let c = *cache.get_or_create(LAYER, &mut rt, 2.0, false).unwrap().surfaces();
        assert_eq!(b, c, "unchanged scale reuses");

        assert_eq!(rt.count(|x| matches!(x, MockCall::CreateSurface(..))), 4);
        assert_eq!(rt.count(|x| matches!(x, MockCall::DestroySurface(_))), 2);
        assert_eq!(rt.live_surface_count(), 2);
    }

    #[test]
    fn ideal_dimension_change_reallocates() {
        let mut rt = MockRuntime::new();
        let mut cache = EyeTextureCache::new();
        cache.get_or_create(LAYER, &mut rt, 1.5, false);
        rt.ideal = Ok(Extent::new(101, 99));
        let pair = cache.get_or_create(LAYER, &mut rt, 1.5, false).unwrap();
        assert_eq!(pair.extent(), Extent::new(151, 148));
        assert_eq!(pair.state(), PairState::Pending);
    }

    #[test]
    fn failed_dimension_query_keeps_cached_pair() {
        let mut rt = MockRuntime::new();
        let mut cache = EyeTextureCache::new();
        let err = RuntimeError::Failed {
            call: RuntimeCall::LayerDimensions,
            code: 1,
        };

        rt.ideal = Err(err);
        assert!(cache.get_or_create(LAYER, &mut rt, 1.0, false).is_none(), "nothing cached");

        rt.ideal = Ok(Extent::new(64, 64));
        let a = *cache.get_or_create(LAYER, &mut rt, 1.0, false).unwrap().surfaces();
        rt.ideal = Err(err);
        let b = *cache.get_or_create(LAYER, &mut rt, 3.0, false).unwrap().surfaces();
        assert_eq!(a, b);
    }

    #[test]
    fn pair_becomes_ready_after_flush() {
        let mut rt = MockRuntime::new();
        let mut cache = EyeTextureCache::new();
        let pair = cache.get_or_create(LAYER, &mut rt, 1.0, false).unwrap();

        assert!(!pair.poll_ready(LAYER, &mut rt), "handles not materialized");
        pair.clear(&mut rt);
        rt.flush();
        assert!(pair.poll_ready(LAYER, &mut rt));
        assert!(pair.is_ready());
        assert!(pair.poll_ready(LAYER, &mut rt), "stays ready");

        let sets = rt.count(|x| matches!(x, MockCall::SetEyeTexture(..)));
        assert_eq!(sets, 2, "one call per eye, once");
    }

    #[test]
    fn release_destroys_surfaces() {
        let mut rt = MockRuntime::new();
        let mut cache = EyeTextureCache::new();
        cache.get_or_create(LAYER, &mut rt, 1.0, false);
        cache.get_or_create(LayerId(8), &mut rt, 1.0, false);
        assert!(cache.release(LAYER, &mut rt));
        assert!(!cache.release(LAYER, &mut rt));
        assert_eq!(cache.len(), 1);
        cache.clear(&mut rt);
        assert!(cache.is_empty());
        assert_eq!(rt.live_surface_count(), 0);
    }
}
