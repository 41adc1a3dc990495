// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor layers, their consumers, and their eye surfaces.
//!
//! A *layer* is a compositor output the runtime blends into the final image.
//! Each layer has:
//!
//! - An identity ([`LayerId`]) issued by the runtime when the layer is
//!   created for a given [`LayerConfig`].
//! - An ordered list of consumers, sorted by ascending
//!   [`priority`](crate::consumer::RenderConsumer::priority) with ties kept in
//!   arrival order ([`LayerRegistry`]).
//! - One stereo pair of render surfaces sized from the runtime's ideal
//!   dimensions and the render scale ([`EyeTextureCache`]).
//!
//! # Lifecycle
//!
//! Registration is deferred: [`LayerRegistry::register`] only queues the
//! consumer, and [`LayerRegistry::resolve_pending`] creates or reuses the
//! layer once per frame, right before rendering. The layer is deleted as
//! soon as its last consumer unregisters.
//!
//! Surfaces are *pending* until the runtime reports native handles for both
//! eyes, which usually happens only after they have been cleared and flushed
//! once. Pending pairs are cleared every frame but never submitted.

mod config;
mod id;
mod registry;
mod texture;

pub use config::{AlphaMode, Extent, LayerConfig, LayerKind, SurfaceDesc};
pub use id::{LayerId, NativeHandle, SurfaceId};
pub use registry::{LayerEntry, LayerRegistry, Removal};
pub use texture::{EyeTextureCache, EyeTexturePair, PairState};
