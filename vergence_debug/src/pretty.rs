// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Phase-end
//! lines include the phase duration, and frame-end lines the whole tick.

use std::io::Write;

use vergence_core::driver::TickOutcome;
use vergence_core::event::DeviceEvent;
use vergence_core::time::HostTime;
use vergence_core::trace::{
    CapabilityChangeEvent, FrameBeginEvent, FrameEndEvent, LayerSubmitEvent, PhaseEvent,
    PhaseKind, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    frame_start: Option<HostTime>,
    phase_start: [Option<HostTime>; PhaseKind::COUNT],
    quiet_polls: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("frame_start", &self.frame_start)
            .field("quiet_polls", &self.quiet_polls)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            frame_start: None,
            phase_start: [None; PhaseKind::COUNT],
            quiet_polls: false,
        }
    }

    /// Suppresses frame-begin lines, and the poll and frame-end lines of
    /// ticks that only polled for a headset.
    #[must_use]
    pub fn quiet_polls(mut self, quiet: bool) -> Self {
        self.quiet_polls = quiet;
        self
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn phase_slot(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Poll => 0,
        PhaseKind::Capabilities => 1,
        PhaseKind::Fetch => 2,
        PhaseKind::Events => 3,
        PhaseKind::Resolve => 4,
        PhaseKind::Render => 5,
        PhaseKind::WaitPose => 6,
    }
}

fn outcome_label(outcome: TickOutcome) -> String {
    match outcome {
        TickOutcome::Polling => "polling".into(),
        TickOutcome::Disconnected => "DISCONNECTED".into(),
        TickOutcome::Transient => "transient".into(),
        TickOutcome::DataOnly => "data-only".into(),
        TickOutcome::Rendered { layers_submitted } => format!("rendered layers={layers_submitted}"),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.frame_start = Some(e.now);
        if self.quiet_polls {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[frame] {} begin at {:.1}µs",
            e.frame_index,
            us(e.now),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseEvent) {
        self.phase_start[phase_slot(e.phase)] = Some(e.timestamp);
    }

    fn on_phase_end(&mut self, e: &PhaseEvent) {
        let Some(start) = self.phase_start[phase_slot(e.phase)].take() else {
            return;
        };
        if self.quiet_polls && e.phase == PhaseKind::Poll {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[phase] frame={} {} {:.1}µs",
            e.frame_index,
            e.phase.as_str(),
            (e.timestamp - start).as_micros_f64(),
        );
    }

    fn on_capabilities_changed(&mut self, e: &CapabilityChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[caps] frame={} +{:?} -{:?} now {:?}",
            e.frame_index, e.added, e.removed, e.current,
        );
    }

    fn on_layer_submitted(&mut self, e: &LayerSubmitEvent) {
        let status = if e.accepted { "ok" } else { "REJECTED" };
        let _ = writeln!(
            self.writer,
            "[layer] frame={} {:?} consumers={} {}x{} {status}",
            e.frame_index, e.layer, e.consumers, e.extent.width, e.extent.height,
        );
    }

    fn on_device_event(&mut self, frame_index: u64, event: &DeviceEvent) {
        let _ = writeln!(
            self.writer,
            "[device] frame={frame_index} {}: {event:?}",
            event.kind().as_str(),
        );
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        let start = self.frame_start.take().unwrap_or(e.timestamp);
        if self.quiet_polls && e.outcome == TickOutcome::Polling {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[frame] {} end {} total={:.1}µs",
            e.frame_index,
            outcome_label(e.outcome),
            (e.timestamp - start).as_micros_f64(),
        );
    }
}

#[cfg(test)]
mod tests {
    use vergence_core::capability::Capabilities;
    use vergence_core::layer::{Extent, LayerId};

    use super::*;

    fn lines(sink: PrettyPrintSink<Vec<u8>>) -> Vec<String> {
        String::from_utf8(sink.into_inner())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    fn phase(phase: PhaseKind, nanos: u64) -> PhaseEvent {
        PhaseEvent {
            frame_index: 3,
            phase,
            timestamp: HostTime(nanos),
        }
    }

    #[test]
    fn phase_end_reports_duration() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_phase_begin(&phase(PhaseKind::Render, 10_000));
        sink.on_phase_end(&phase(PhaseKind::Render, 12_500));
        assert_eq!(lines(sink), ["[phase] frame=3 render 2.5µs"]);
    }

    #[test]
    fn frame_lines_carry_outcome() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 3,
            now: HostTime(1_000),
        });
        sink.on_layer_submitted(&LayerSubmitEvent {
            frame_index: 3,
            layer: LayerId(1),
            consumers: 2,
            extent: Extent::new(64, 32),
            accepted: true,
        });
        sink.on_capabilities_changed(&CapabilityChangeEvent {
            frame_index: 3,
            added: Capabilities::GAZE,
            removed: Capabilities::NONE,
            current: Capabilities::GAZE,
        });
        sink.on_frame_end(&FrameEndEvent {
            frame_index: 3,
            timestamp: HostTime(4_000),
            outcome: TickOutcome::Rendered { layers_submitted: 1 },
        });
        let out = lines(sink);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], "[frame] 3 begin at 1.0µs");
        assert!(out[1].contains("consumers=2 64x32 ok"), "{}", out[1]);
        assert!(out[2].contains("+Capabilities(GAZE)"), "{}", out[2]);
        assert_eq!(out[3], "[frame] 3 end rendered layers=1 total=3.0µs");
    }

    #[test]
    fn quiet_polls_hides_idle_ticks() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new()).quiet_polls(true);
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            now: HostTime(0),
        });
        sink.on_phase_begin(&phase(PhaseKind::Poll, 0));
        sink.on_phase_end(&phase(PhaseKind::Poll, 100));
        sink.on_frame_end(&FrameEndEvent {
            frame_index: 0,
            timestamp: HostTime(200),
            outcome: TickOutcome::Polling,
        });
        sink.on_device_event(1, &DeviceEvent::ConnectedChanged(true));
        assert_eq!(lines(sink), ["[device] frame=1 connected: ConnectedChanged(true)"]);
    }
}
