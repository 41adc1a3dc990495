// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each tick becomes a `frame` duration slice with its phases nested inside.
//! Capability changes, layer submissions, and device events carry no
//! timestamp of their own and are placed at the most recent recorded time.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use vergence_core::driver::TickOutcome;
use vergence_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                last = us(e.now);
                events.push(json!({
                    "ph": "B",
                    "name": "frame",
                    "cat": "Frame",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "args": { "frame_index": e.frame_index }
                }));
            }
            RecordedEvent::PhaseBegin(e) | RecordedEvent::PhaseEnd(e) => {
                let ph = if matches!(recorded, RecordedEvent::PhaseBegin(_)) {
                    "B"
                } else {
                    "E"
                };
                last = us(e.timestamp);
                events.push(json!({
                    "ph": ph,
                    "name": e.phase.as_str(),
                    "cat": "Phase",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "args": { "frame_index": e.frame_index }
                }));
            }
            RecordedEvent::CapabilitiesChanged(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Capabilities",
                    "cat": "Session",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                        "added": format!("{:?}", e.added),
                        "removed": format!("{:?}", e.removed),
                        "current": format!("{:?}", e.current),
                    }
                }));
            }
            RecordedEvent::LayerSubmitted(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Submit",
                    "cat": "Layer",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "layer": e.layer.0,
                        "consumers": e.consumers,
                        "width": e.extent.width,
                        "height": e.extent.height,
                        "accepted": e.accepted,
                    }
                }));
            }
            RecordedEvent::Device { frame_index, event } => {
                events.push(json!({
                    "ph": "i",
                    "name": event.kind().as_str(),
                    "cat": "Device",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": frame_index,
                        "event": format!("{event:?}"),
                    }
                }));
            }
            RecordedEvent::FrameEnd(e) => {
                last = us(e.timestamp);
                let (outcome, layers) = match e.outcome {
                    TickOutcome::Polling => ("Polling", 0),
                    TickOutcome::Disconnected => ("Disconnected", 0),
                    TickOutcome::Transient => ("Transient", 0),
                    TickOutcome::DataOnly => ("DataOnly", 0),
                    TickOutcome::Rendered { layers_submitted } => ("Rendered", layers_submitted),
                };
                events.push(json!({
                    "ph": "E",
                    "name": "frame",
                    "cat": "Frame",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "outcome": outcome,
                        "layers_submitted": layers,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use vergence_core::event::DeviceEvent;
    use vergence_core::trace::{
        FrameBeginEvent, FrameEndEvent, PhaseEvent, PhaseKind, TraceSink,
    };

    fn parse(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap()
    }

    #[test]
    fn phases_nest_inside_frame_slice() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            now: HostTime(1_000_000),
        });
        rec.on_phase_begin(&PhaseEvent {
            frame_index: 0,
            phase: PhaseKind::Fetch,
            timestamp: HostTime(1_000_000),
        });
        rec.on_phase_end(&PhaseEvent {
            frame_index: 0,
            phase: PhaseKind::Fetch,
            timestamp: HostTime(1_000_500),
        });
        rec.on_device_event(0, &DeviceEvent::ConnectedChanged(true));
        rec.on_frame_end(&FrameEndEvent {
            frame_index: 0,
            timestamp: HostTime(1_002_000),
            outcome: TickOutcome::DataOnly,
        });

        let parsed = parse(&rec);
        assert_eq!(parsed.len(), 5);
        let ph: Vec<&str> = parsed.iter().map(|e| e["ph"].as_str().unwrap()).collect();
        assert_eq!(ph, ["B", "B", "E", "i", "E"]);
        assert_eq!(parsed[1]["name"], "fetch");
        assert_eq!(parsed[2]["ts"], 1000.5);

        // Device events inherit the last timestamp.
        assert_eq!(parsed[3]["name"], "connected");
        assert_eq!(parsed[3]["ts"], 1000.5);

        assert_eq!(parsed[4]["args"]["outcome"], "DataOnly");
        assert_eq!(parsed[4]["ts"], 1002.0);
    }

    #[test]
    fn export_empty_recording() {
        let parsed = parse(&RecorderSink::new());
        assert!(parsed.is_empty(), "no events");
    }
}
