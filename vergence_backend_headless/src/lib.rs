// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted in-memory HMD runtime for vergence.
//!
//! This crate provides a [`HeadlessRuntime`] that implements
//! [`HmdRuntime`](vergence_core::runtime::HmdRuntime) without any device or
//! GPU. Every call is appended to a shared [`CallLog`], so tests can assert
//! on the exact order in which the frame driver talks to the runtime.
//!
//! - **Clock**: a manual clock that only moves when told to
//!   ([`HeadlessRuntime::advance`]) or, optionally, by one frame period at
//!   every render-pose barrier.
//! - **Connection**: a script of `is_hardware_connected` answers; the last
//!   answer repeats once the script runs out.
//! - **Surfaces**: native handles appear at the first flush after a surface
//!   is created, like a GPU driver that allocates lazily.
//! - **Failures**: [`HeadlessRuntime::fail_next`] makes one future call of a
//!   given kind return an error.
//!
//! [`RecordingConsumer`] is a render consumer that logs its
//! `render_into` calls into the same log.

mod call;
mod consumer;
mod runtime;

pub use call::{Call, CallLog};
pub use consumer::RecordingConsumer;
pub use runtime::{FailPoint, HeadlessRuntime, HeadlessTransport};
