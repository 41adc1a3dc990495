// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session, capability, and compositor-layer orchestration for
//! head-mounted display runtimes.
//!
//! `vergence_core` sits between an HMD runtime (tracking, eye tracking, and a
//! layer compositor) and a host application's per-frame render loop. It is
//! `no_std` compatible (with `alloc`) and performs no I/O of its own: every
//! interaction with the device goes through the [`HmdRuntime`] contract that
//! backend crates implement.
//!
//! # Architecture
//!
//! One [`FrameDriver::tick`] runs per host frame:
//!
//! ```text
//!   Disconnected ──poll (interval)──► Active
//!        ▲                               │
//!        └────────── disconnect ─────────┤
//!                                        ▼
//!   CapabilityAggregator::recompute ──► fetch tracking ──► FrameState diff
//!                                                              │
//!                 ┌────────────────────────────────────────────┘
//!                 ▼
//!   LayerRegistry::resolve_pending ──► per layer: EyeTextureCache
//!                                        ──► RenderConsumer::render_into
//!                                        ──► HmdRuntime::submit
//!                 ┌────────────────────────────────────────────┘
//!                 ▼
//!   HmdRuntime::wait_for_render_pose
//! ```
//!
//! **[`capability`]** — Capability bitmask and the aggregator that keeps the
//! runtime's registered set equal to what live consumers need.
//!
//! **[`layer`]** — Compositor layer configuration, the priority-ordered
//! consumer registry, and the per-layer stereo texture cache.
//!
//! **[`driver`]** — The per-frame state machine and its read-only query
//! surface.
//!
//! **[`event`]** — Edge-triggered device events and their subscriber lists.
//!
//! **[`runtime`]** — The [`HmdRuntime`] and [`Transport`] traits that
//! backends implement.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) hooks for frame-loop
//! instrumentation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `serde` (disabled by default): Derives `Serialize`/`Deserialize` for
//!   [`SessionConfig`] and the value types it contains.
//!
//! [`HmdRuntime`]: runtime::HmdRuntime
//! [`Transport`]: runtime::Transport
//! [`FrameDriver::tick`]: driver::FrameDriver::tick
//! [`SessionConfig`]: config::SessionConfig

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod capability;
pub mod config;
pub mod consumer;
pub mod driver;
pub mod event;
pub mod eye;
pub mod image;
pub mod layer;
#[cfg(test)]
mod mock;
pub mod pose;
pub mod runtime;
pub mod state;
pub mod time;
pub mod trace;
pub mod tracking;
