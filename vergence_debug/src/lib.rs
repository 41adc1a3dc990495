// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for vergence
//! diagnostics.
//!
//! This crate provides [`TraceSink`](vergence_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event, with
//!   phase durations.
//! - [`recorder::RecorderSink`]: compact binary recording, read back with
//!   [`recorder::decode`].
//! - [`chrome::export`]: Chrome Trace Event Format JSON from recorded bytes.
//!
//! All timestamps are runtime [`HostTime`](vergence_core::time::HostTime)
//! nanoseconds and are shown in microseconds.

pub mod chrome;
pub mod pretty;
pub mod recorder;
