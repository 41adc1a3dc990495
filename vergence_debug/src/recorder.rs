// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each starting with a one-byte tag.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`]; decoding
//! stops at the first unknown tag or truncated record.
//!
//! Device events are stored as a kind byte followed by two payload bytes, so
//! every device record has the same size.

use vergence_core::capability::Capabilities;
use vergence_core::driver::TickOutcome;
use vergence_core::event::DeviceEvent;
use vergence_core::eye::Eye;
use vergence_core::layer::{Extent, LayerId};
use vergence_core::time::HostTime;
use vergence_core::trace::{
    CapabilityChangeEvent, FrameBeginEvent, FrameEndEvent, LayerSubmitEvent, PhaseEvent,
    PhaseKind, TraceSink,
};
use vergence_core::tracking::{CalibrationState, EyeOpenness};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_CAPABILITIES: u8 = 4;
const TAG_LAYER_SUBMIT: u8 = 5;
const TAG_DEVICE_EVENT: u8 = 6;
const TAG_FRAME_END: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Poll => 0,
            PhaseKind::Capabilities => 1,
            PhaseKind::Fetch => 2,
            PhaseKind::Events => 3,
            PhaseKind::Resolve => 4,
            PhaseKind::Render => 5,
            PhaseKind::WaitPose => 6,
        });
    }

    fn write_phase_event(&mut self, tag: u8, e: &PhaseEvent) {
        self.write_u8(tag);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn write_device_event(&mut self, event: &DeviceEvent) {
        let (kind, a, b) = match *event {
            DeviceEvent::ConnectedChanged(v) => (0, u8::from(v), 0),
            DeviceEvent::ReadyChanged(v) => (1, u8::from(v), 0),
            DeviceEvent::CalibrationStarted => (2, 0, 0),
            DeviceEvent::CalibrationEnded(state) => (3, calibration_code(state), 0),
            DeviceEvent::ShiftingAttentionChanged(v) => (4, u8::from(v), 0),
            DeviceEvent::EyeOpennessChanged { eye, openness } => {
                (5, u8::from(eye == Eye::Right), openness_code(openness))
            }
            DeviceEvent::UserPresenceChanged(v) => (6, u8::from(v), 0),
            DeviceEvent::AdjustmentVisibilityChanged(v) => (7, u8::from(v), 0),
        };
        self.write_u8(kind);
        self.write_u8(a);
        self.write_u8(b);
    }

    fn write_outcome(&mut self, outcome: TickOutcome) {
        let (code, layers) = match outcome {
            TickOutcome::Polling => (0, 0),
            TickOutcome::Disconnected => (1, 0),
            TickOutcome::Transient => (2, 0),
            TickOutcome::DataOnly => (3, 0),
            TickOutcome::Rendered { layers_submitted } => (4, layers_submitted),
        };
        self.write_u8(code);
        self.write_u32(layers);
    }
}

fn calibration_code(state: CalibrationState) -> u8 {
    match state {
        CalibrationState::NotCalibrated => 0,
        CalibrationState::Calibrating => 1,
        CalibrationState::Calibrated => 2,
        CalibrationState::Failed => 3,
    }
}

fn openness_code(openness: EyeOpenness) -> u8 {
    match openness {
        EyeOpenness::Unknown => 0,
        EyeOpenness::Open => 1,
        EyeOpenness::Closed => 2,
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.nanos());
    }

    fn on_phase_begin(&mut self, e: &PhaseEvent) {
        self.write_phase_event(TAG_PHASE_BEGIN, e);
    }

    fn on_phase_end(&mut self, e: &PhaseEvent) {
        self.write_phase_event(TAG_PHASE_END, e);
    }

    fn on_capabilities_changed(&mut self, e: &CapabilityChangeEvent) {
        self.write_u8(TAG_CAPABILITIES);
        self.write_u64(e.frame_index);
        self.write_u32(e.added.bits());
        self.write_u32(e.removed.bits());
        self.write_u32(e.current.bits());
    }

    fn on_layer_submitted(&mut self, e: &LayerSubmitEvent) {
        self.write_u8(TAG_LAYER_SUBMIT);
        self.write_u64(e.frame_index);
        self.write_u64(e.layer.0);
        self.write_u32(e.consumers);
        self.write_u32(e.extent.width);
        self.write_u32(e.extent.height);
        self.write_u8(u8::from(e.accepted));
    }

    fn on_device_event(&mut self, frame_index: u64, event: &DeviceEvent) {
        self.write_u8(TAG_DEVICE_EVENT);
        self.write_u64(frame_index);
        self.write_device_event(event);
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        self.write_u8(TAG_FRAME_END);
        self.write_u64(e.frame_index);
        self.write_u64(e.timestamp.nanos());
        self.write_outcome(e.outcome);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A phase-begin [`PhaseEvent`].
    PhaseBegin(PhaseEvent),
    /// A phase-end [`PhaseEvent`].
    PhaseEnd(PhaseEvent),
    /// A [`CapabilityChangeEvent`].
    CapabilitiesChanged(CapabilityChangeEvent),
    /// A [`LayerSubmitEvent`].
    LayerSubmitted(LayerSubmitEvent),
    /// A device event raised during a frame.
    Device {
        /// Frame counter.
        frame_index: u64,
        /// The event.
        event: DeviceEvent,
    },
    /// A [`FrameEndEvent`].
    FrameEnd(FrameEndEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Poll,
            1 => PhaseKind::Capabilities,
            2 => PhaseKind::Fetch,
            3 => PhaseKind::Events,
            4 => PhaseKind::Resolve,
            5 => PhaseKind::Render,
            6 => PhaseKind::WaitPose,
            _ => return None,
        })
    }

    fn read_caps(&mut self) -> Option<Capabilities> {
        self.read_u32().map(Capabilities::from_bits_truncate)
    }

    fn decode_phase(&mut self) -> Option<PhaseEvent> {
        Some(PhaseEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        })
    }

    fn decode_device(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let kind = self.read_u8()?;
        let a = self.read_u8()?;
        let b = self.read_u8()?;
        let event = match kind {
            0 => DeviceEvent::ConnectedChanged(a != 0),
            1 => DeviceEvent::ReadyChanged(a != 0),
            2 => DeviceEvent::CalibrationStarted,
            3 => DeviceEvent::CalibrationEnded(match a {
                0 => CalibrationState::NotCalibrated,
                1 => CalibrationState::Calibrating,
                2 => CalibrationState::Calibrated,
                _ => CalibrationState::Failed,
            }),
            4 => DeviceEvent::ShiftingAttentionChanged(a != 0),
            5 => DeviceEvent::EyeOpennessChanged {
                eye: if a == 0 { Eye::Left } else { Eye::Right },
                openness: match b {
                    1 => EyeOpenness::Open,
                    2 => EyeOpenness::Closed,
                    _ => EyeOpenness::Unknown,
                },
            },
            6 => DeviceEvent::UserPresenceChanged(a != 0),
            7 => DeviceEvent::AdjustmentVisibilityChanged(a != 0),
            _ => return None,
        };
        Some(RecordedEvent::Device { frame_index, event })
    }

    fn decode_frame_end(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let timestamp = HostTime(self.read_u64()?);
        let code = self.read_u8()?;
        let layers_submitted = self.read_u32()?;
        let outcome = match code {
            0 => TickOutcome::Polling,
            1 => TickOutcome::Disconnected,
            2 => TickOutcome::Transient,
            3 => TickOutcome::DataOnly,
            4 => TickOutcome::Rendered { layers_submitted },
            _ => return None,
        };
        Some(RecordedEvent::FrameEnd(FrameEndEvent {
            frame_index,
            timestamp,
            outcome,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_FRAME_BEGIN => Some(RecordedEvent::FrameBegin(FrameBeginEvent {
                frame_index: self.read_u64()?,
                now: HostTime(self.read_u64()?),
            })),
            TAG_PHASE_BEGIN => self.decode_phase().map(RecordedEvent::PhaseBegin),
            TAG_PHASE_END => self.decode_phase().map(RecordedEvent::PhaseEnd),
            TAG_CAPABILITIES => Some(RecordedEvent::CapabilitiesChanged(CapabilityChangeEvent {
                frame_index: self.read_u64()?,
                added: self.read_caps()?,
                removed: self.read_caps()?,
                current: self.read_caps()?,
            })),
            TAG_LAYER_SUBMIT => Some(RecordedEvent::LayerSubmitted(LayerSubmitEvent {
                frame_index: self.read_u64()?,
                layer: LayerId(self.read_u64()?),
                consumers: self.read_u32()?,
                extent: Extent::new(self.read_u32()?, self.read_u32()?),
                accepted: self.read_bool()?,
            })),
            TAG_DEVICE_EVENT => self.decode_device(),
            TAG_FRAME_END => self.decode_frame_end(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_records_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 7,
            now: HostTime(1_000_000),
        });
        rec.on_phase_begin(&PhaseEvent {
            frame_index: 7,
            phase: PhaseKind::Render,
            timestamp: HostTime(1_200_000),
        });
        rec.on_phase_end(&PhaseEvent {
            frame_index: 7,
            phase: PhaseKind::Render,
            timestamp: HostTime(1_900_000),
        });
        rec.on_frame_end(&FrameEndEvent {
            frame_index: 7,
            timestamp: HostTime(2_000_000),
            outcome: TickOutcome::Rendered { layers_submitted: 3 },
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::FrameBegin(e) if e.now == HostTime(1_000_000)));
        match events[2] {
            RecordedEvent::PhaseEnd(e) => {
                assert_eq!(e.phase, PhaseKind::Render);
                assert_eq!(e.timestamp, HostTime(1_900_000));
            }
            other => panic!("expected PhaseEnd, got {other:?}"),
        }
        match events[3] {
            RecordedEvent::FrameEnd(e) => {
                assert_eq!(e.outcome, TickOutcome::Rendered { layers_submitted: 3 });
            }
            other => panic!("expected FrameEnd, got {other:?}"),
        }
    }

    #[test]
    fn layer_and_capability_records() {
        let mut rec = RecorderSink::new();
        rec.on_capabilities_changed(&CapabilityChangeEvent {
            frame_index: 2,
            added: Capabilities::GAZE,
            removed: Capabilities::EYE_IMAGES,
            current: Capabilities::GAZE | Capabilities::POSITION,
        });
        rec.on_layer_submitted(&LayerSubmitEvent {
            frame_index: 2,
            layer: LayerId(9),
            consumers: 2,
            extent: Extent::new(1512, 1680),
            accepted: false,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [
                RecordedEvent::CapabilitiesChanged(c),
                RecordedEvent::LayerSubmitted(l),
            ] => {
                assert_eq!(c.removed, Capabilities::EYE_IMAGES);
                assert_eq!(c.current, Capabilities::GAZE | Capabilities::POSITION);
                assert_eq!(l.layer, LayerId(9));
                assert_eq!(l.extent, Extent::new(1512, 1680));
                assert!(!l.accepted, "rejected submission");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn every_device_event_survives() {
        let all = [
            DeviceEvent::ConnectedChanged(true),
            DeviceEvent::ReadyChanged(false),
            DeviceEvent::CalibrationStarted,
            DeviceEvent::CalibrationEnded(CalibrationState::Failed),
            DeviceEvent::ShiftingAttentionChanged(true),
            DeviceEvent::EyeOpennessChanged {
                eye: Eye::Right,
                openness: EyeOpenness::Closed,
            },
            DeviceEvent::UserPresenceChanged(true),
            DeviceEvent::AdjustmentVisibilityChanged(false),
        ];
        let mut rec = RecorderSink::new();
        for e in &all {
            rec.on_device_event(4, e);
        }
        let decoded: Vec<DeviceEvent> = decode(rec.as_bytes())
            .map(|r| match r {
                RecordedEvent::Device { frame_index, event } => {
                    assert_eq!(frame_index, 4);
                    event
                }
                other => panic!("expected Device, got {other:?}"),
            })
            .collect();
        assert_eq!(decoded, all);
    }

    #[test]
    fn truncated_record_ends_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            now: HostTime(5),
        });
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            now: HostTime(6),
        });
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 1);
        assert_eq!(decode(&[0xff, 0, 0]).count(), 0, "unknown tag");
        assert_eq!(decode(&[]).count(), 0);
    }
}
