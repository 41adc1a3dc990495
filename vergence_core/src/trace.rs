// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the [`FrameDriver`](crate::driver::FrameDriver) calls at each stage. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and the driver never
//! reads the clock on its behalf. When **on**, each method performs a single
//! `Option` branch before dispatching.
//!
//! Sinks compose: `Rc<RefCell<S>>` is a sink (so the host can keep a handle
//! to a recorder it gave away), and so is a pair `(A, B)`, which forwards
//! every event to both.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use crate::capability::Capabilities;
use crate::driver::TickOutcome;
use crate::event::DeviceEvent;
use crate::layer::{Extent, LayerId};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a driver tick is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Presence polling while disconnected.
    Poll,
    /// Capability recompute.
    Capabilities,
    /// Tracking, pose, and image fetch.
    Fetch,
    /// Frame-state diff and event dispatch.
    Events,
    /// End-of-frame barrier and pending-registration resolution.
    Resolve,
    /// Per-layer render and submit.
    Render,
    /// The render-pose barrier.
    WaitPose,
}

impl PhaseKind {
    /// Number of phases.
    pub const COUNT: usize = 7;

    /// Returns a short label for logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Capabilities => "capabilities",
            Self::Fetch => "fetch",
            Self::Events => "events",
            Self::Resolve => "resolve",
            Self::Render => "render",
            Self::WaitPose => "wait-pose",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted at the start of every tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Runtime time at the start of the tick.
    pub now: HostTime,
}

/// Marks the beginning or end of a tick phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Which phase.
    pub phase: PhaseKind,
    /// Runtime time at the boundary.
    pub timestamp: HostTime,
}

/// Emitted when the registered capability set changes.
#[derive(Clone, Copy, Debug)]
pub struct CapabilityChangeEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Newly registered capabilities.
    pub added: Capabilities,
    /// Unregistered capabilities.
    pub removed: Capabilities,
    /// The set now considered registered.
    pub current: Capabilities,
}

/// Emitted after a layer is submitted to the compositor.
#[derive(Clone, Copy, Debug)]
pub struct LayerSubmitEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// The submitted layer.
    pub layer: LayerId,
    /// Number of consumers rendered into the layer.
    pub consumers: u32,
    /// Per-eye surface size.
    pub extent: Extent,
    /// Whether the runtime accepted the submission.
    pub accepted: bool,
}

/// Emitted at the end of every tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameEndEvent {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Runtime time at the end of the tick.
    pub timestamp: HostTime,
    /// What the tick did.
    pub outcome: TickOutcome,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame driver.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the start of every tick.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a tick phase.
    fn on_phase_begin(&mut self, e: &PhaseEvent) {
        _ = e;
    }

    /// Called at the end of a tick phase.
    fn on_phase_end(&mut self, e: &PhaseEvent) {
        _ = e;
    }

    /// Called when the registered capability set changes.
    fn on_capabilities_changed(&mut self, e: &CapabilityChangeEvent) {
        _ = e;
    }

    /// Called after each layer submission.
    fn on_layer_submitted(&mut self, e: &LayerSubmitEvent) {
        _ = e;
    }

    /// Called for every device event the tick raised.
    fn on_device_event(&mut self, frame_index: u64, event: &DeviceEvent) {
        _ = (frame_index, event);
    }

    /// Called at the end of every tick.
    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink and combinators
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.borrow_mut().on_frame_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseEvent) {
        self.borrow_mut().on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEvent) {
        self.borrow_mut().on_phase_end(e);
    }

    fn on_capabilities_changed(&mut self, e: &CapabilityChangeEvent) {
        self.borrow_mut().on_capabilities_changed(e);
    }

    fn on_layer_submitted(&mut self, e: &LayerSubmitEvent) {
        self.borrow_mut().on_layer_submitted(e);
    }

    fn on_device_event(&mut self, frame_index: u64, event: &DeviceEvent) {
        self.borrow_mut().on_device_event(frame_index, event);
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        self.borrow_mut().on_frame_end(e);
    }
}

impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.0.on_frame_begin(e);
        self.1.on_frame_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseEvent) {
        self.0.on_phase_begin(e);
        self.1.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEvent) {
        self.0.on_phase_end(e);
        self.1.on_phase_end(e);
    }

    fn on_capabilities_changed(&mut self, e: &CapabilityChangeEvent) {
        self.0.on_capabilities_changed(e);
        self.1.on_capabilities_changed(e);
    }

    fn on_layer_submitted(&mut self, e: &LayerSubmitEvent) {
        self.0.on_layer_submitted(e);
        self.1.on_layer_submitted(e);
    }

    fn on_device_event(&mut self, frame_index: u64, event: &DeviceEvent) {
        self.0.on_device_event(frame_index, event);
        self.1.on_device_event(frame_index, event);
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        self.0.on_frame_end(e);
        self.1.on_frame_end(e);
    }
}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing and
/// [`is_active`](Self::is_active) is always `false`.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Removes and returns the sink.
    #[inline]
    pub fn take(&mut self) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a phase-begin [`PhaseEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a phase-end [`PhaseEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CapabilityChangeEvent`].
    #[inline]
    pub fn capabilities_changed(&mut self, e: &CapabilityChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_capabilities_changed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayerSubmitEvent`].
    #[inline]
    pub fn layer_submitted(&mut self, e: &LayerSubmitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer_submitted(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a device event.
    #[inline]
    pub fn device_event(&mut self, frame_index: u64, event: &DeviceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_device_event(frame_index, event);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (frame_index, event);
        }
    }

    /// Emits a [`FrameEndEvent`].
    #[inline]
    pub fn frame_end(&mut self, e: &FrameEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
