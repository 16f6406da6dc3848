// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. Strings are stored length-prefixed.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].

use marquee_core::performance::PerformanceSnapshot;
use marquee_core::scene::SceneId;
use marquee_core::time::HostTime;
use marquee_core::trace::{
    DiagnosticEvent, DiagnosticLevel, ExportEvent, ExportStage, FrameRateWarning,
    PerformanceSampleEvent, SceneTransitionEvent, TraceSink, TransitionPhase, TriggerEdgeEvent,
};
use marquee_core::trigger::{TriggerEdge, TriggerId};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PERFORMANCE_SAMPLE: u8 = 1;
const TAG_FRAME_RATE_WARNING: u8 = 2;
const TAG_SCENE_TRANSITION: u8 = 3;
const TAG_TRIGGER_EDGE: u8 = 4;
const TAG_DIAGNOSTIC: u8 = 5;
const TAG_EXPORT: u8 = 6;

const STAGE_STARTED: u8 = 0;
const STAGE_COMPLETED: u8 = 1;
const STAGE_FAILED: u8 = 2;

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

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u32(val);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_str(&mut self, s: &str) {
        let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }

    fn write_scene(&mut self, scene: SceneId) {
        self.write_u8(scene as u8);
    }

    fn write_phase(&mut self, p: TransitionPhase) {
        self.write_u8(match p {
            TransitionPhase::Begin => 0,
            TransitionPhase::Commit => 1,
            TransitionPhase::Settle => 2,
        });
    }

    fn write_edge(&mut self, edge: TriggerEdge) {
        self.write_u8(match edge {
            TriggerEdge::Enter => 0,
            TriggerEdge::Leave => 1,
            TriggerEdge::EnterBack => 2,
            TriggerEdge::LeaveBack => 3,
        });
    }

    fn write_level(&mut self, level: DiagnosticLevel) {
        self.write_u8(match level {
            DiagnosticLevel::Info => 0,
            DiagnosticLevel::Warn => 1,
            DiagnosticLevel::Error => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_performance_sample(&mut self, e: &PerformanceSampleEvent) {
        let s = &e.snapshot;
        self.write_u8(TAG_PERFORMANCE_SAMPLE);
        self.write_u64(e.at.ticks());
        self.write_u32(s.fps);
        self.write_f64(s.frame_time);
        self.write_f64(s.avg_frame_time);
        self.write_option_u32(s.memory_usage_mb);
        self.write_u8(s.performance_score);
        self.write_u8(u8::from(s.is_low_performance));
    }

    fn on_frame_rate_warning(&mut self, e: &FrameRateWarning) {
        self.write_u8(TAG_FRAME_RATE_WARNING);
        self.write_u64(e.at.ticks());
        self.write_u32(e.fps);
        self.write_u32(e.critical_fps);
    }

    fn on_scene_transition(&mut self, e: &SceneTransitionEvent) {
        self.write_u8(TAG_SCENE_TRANSITION);
        self.write_u64(e.at.ticks());
        self.write_phase(e.phase);
        self.write_scene(e.from);
        self.write_scene(e.to);
    }

    fn on_trigger_edge(&mut self, e: &TriggerEdgeEvent) {
        self.write_u8(TAG_TRIGGER_EDGE);
        self.write_u32(e.trigger.0);
        self.write_edge(e.edge);
        self.write_f64(e.scroll_y);
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        self.write_u8(TAG_DIAGNOSTIC);
        self.write_level(e.level);
        self.write_str(e.source);
        self.write_str(e.message);
    }

    fn on_export(&mut self, e: &ExportEvent<'_>) {
        self.write_u8(TAG_EXPORT);
        self.write_str(e.element_id);
        self.write_str(e.filename);
        match e.stage {
            ExportStage::Started => self.write_u8(STAGE_STARTED),
            ExportStage::Completed { pages } => {
                self.write_u8(STAGE_COMPLETED);
                self.write_u64(u64::try_from(pages).unwrap_or(u64::MAX));
            }
            ExportStage::Failed { reason } => {
                self.write_u8(STAGE_FAILED);
                self.write_str(reason);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Owned counterpart of [`ExportStage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedStage {
    /// See [`ExportStage::Started`].
    Started,
    /// See [`ExportStage::Completed`].
    Completed {
        /// Number of pages written.
        pages: u64,
    },
    /// See [`ExportStage::Failed`].
    Failed {
        /// Rendered error message.
        reason: String,
    },
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PerformanceSampleEvent`].
    PerformanceSample(PerformanceSampleEvent),
    /// A [`FrameRateWarning`].
    FrameRateWarning(FrameRateWarning),
    /// A [`SceneTransitionEvent`].
    SceneTransition(SceneTransitionEvent),
    /// A [`TriggerEdgeEvent`].
    TriggerEdge(TriggerEdgeEvent),
    /// A [`DiagnosticEvent`] with owned text.
    Diagnostic {
        /// Severity.
        level: DiagnosticLevel,
        /// Emitting component.
        source: String,
        /// Message text.
        message: String,
    },
    /// An [`ExportEvent`] with owned text.
    Export {
        /// Id of the exported subtree.
        element_id: String,
        /// Output file name, without extension.
        filename: String,
        /// Pipeline stage.
        stage: RecordedStage,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
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
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        Some(f64::from_bits(self.read_u64()?))
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        core::str::from_utf8(bytes).ok().map(String::from)
    }

    fn read_scene(&mut self) -> Option<SceneId> {
        SceneId::from_index(usize::from(self.read_u8()?))
    }

    fn read_phase(&mut self) -> Option<TransitionPhase> {
        Some(match self.read_u8()? {
            0 => TransitionPhase::Begin,
            1 => TransitionPhase::Commit,
            _ => TransitionPhase::Settle,
        })
    }

    fn read_edge(&mut self) -> Option<TriggerEdge> {
        Some(match self.read_u8()? {
            0 => TriggerEdge::Enter,
            1 => TriggerEdge::Leave,
            2 => TriggerEdge::EnterBack,
            _ => TriggerEdge::LeaveBack,
        })
    }

    fn read_level(&mut self) -> Option<DiagnosticLevel> {
        Some(match self.read_u8()? {
            0 => DiagnosticLevel::Info,
            1 => DiagnosticLevel::Warn,
            _ => DiagnosticLevel::Error,
        })
    }

    fn decode_performance_sample(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PerformanceSample(PerformanceSampleEvent {
            at: HostTime(self.read_u64()?),
            snapshot: PerformanceSnapshot {
                fps: self.read_u32()?,
                frame_time: self.read_f64()?,
                avg_frame_time: self.read_f64()?,
                memory_usage_mb: self.read_option_u32()?,
                performance_score: self.read_u8()?,
                is_low_performance: self.read_u8()? != 0,
            },
        }))
    }

    fn decode_frame_rate_warning(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameRateWarning(FrameRateWarning {
            at: HostTime(self.read_u64()?),
            fps: self.read_u32()?,
            critical_fps: self.read_u32()?,
        }))
    }

    fn decode_scene_transition(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SceneTransition(SceneTransitionEvent {
            at: HostTime(self.read_u64()?),
            phase: self.read_phase()?,
            from: self.read_scene()?,
            to: self.read_scene()?,
        }))
    }

    fn decode_trigger_edge(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TriggerEdge(TriggerEdgeEvent {
            trigger: TriggerId(self.read_u32()?),
            edge: self.read_edge()?,
            scroll_y: self.read_f64()?,
        }))
    }

    fn decode_diagnostic(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Diagnostic {
            level: self.read_level()?,
            source: self.read_string()?,
            message: self.read_string()?,
        })
    }

    fn decode_export(&mut self) -> Option<RecordedEvent> {
        let element_id = self.read_string()?;
        let filename = self.read_string()?;
        let stage = match self.read_u8()? {
            STAGE_STARTED => RecordedStage::Started,
            STAGE_COMPLETED => RecordedStage::Completed {
                pages: self.read_u64()?,
            },
            STAGE_FAILED => RecordedStage::Failed {
                reason: self.read_string()?,
            },
            _ => return None,
        };
        Some(RecordedEvent::Export {
            element_id,
            filename,
            stage,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PERFORMANCE_SAMPLE => self.decode_performance_sample(),
            TAG_FRAME_RATE_WARNING => self.decode_frame_rate_warning(),
            TAG_SCENE_TRANSITION => self.decode_scene_transition(),
            TAG_TRIGGER_EDGE => self.decode_trigger_edge(),
            TAG_DIAGNOSTIC => self.decode_diagnostic(),
            TAG_EXPORT => self.decode_export(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::trace::Tracer;

    fn sample() -> PerformanceSampleEvent {
        PerformanceSampleEvent {
            at: HostTime(2_000_000),
            snapshot: PerformanceSnapshot {
                fps: 42,
                frame_time: 23.5,
                avg_frame_time: 23.8,
                memory_usage_mb: Some(128),
                performance_score: 70,
                is_low_performance: false,
            },
        }
    }

    #[test]
    fn mixed_recording_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_performance_sample(&sample());
        rec.on_scene_transition(&SceneTransitionEvent {
            at: HostTime(2_100_000),
            phase: TransitionPhase::Commit,
            from: SceneId::Hero,
            to: SceneId::Contact,
        });
        rec.on_trigger_edge(&TriggerEdgeEvent {
            trigger: TriggerId(3),
            edge: TriggerEdge::LeaveBack,
            scroll_y: 359.5,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], RecordedEvent::PerformanceSample(sample()));
        match &events[1] {
            RecordedEvent::SceneTransition(e) => {
                assert_eq!(e.phase, TransitionPhase::Commit);
                assert_eq!(e.to, SceneId::Contact);
            }
            other => panic!("expected SceneTransition, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::TriggerEdge(e) => {
                assert_eq!(e.edge, TriggerEdge::LeaveBack);
                assert_eq!(e.scroll_y, 359.5);
            }
            other => panic!("expected TriggerEdge, got {other:?}"),
        }
    }

    #[test]
    fn text_events_keep_their_strings() {
        let mut rec = RecorderSink::new();
        Tracer::new(&mut rec).warn("scroll", "no scroll context attached");
        rec.on_export(&ExportEvent {
            element_id: "resume",
            filename: "cv",
            stage: ExportStage::Failed {
                reason: "element #resume not found",
            },
        });

        let events: Vec<_> = decode(&rec.into_bytes()).collect();
        assert_eq!(
            events,
            vec![
                RecordedEvent::Diagnostic {
                    level: DiagnosticLevel::Warn,
                    source: "scroll".into(),
                    message: "no scroll context attached".into(),
                },
                RecordedEvent::Export {
                    element_id: "resume".into(),
                    filename: "cv".into(),
                    stage: RecordedStage::Failed {
                        reason: "element #resume not found".into(),
                    },
                },
            ]
        );
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_frame_rate_warning(&FrameRateWarning {
            at: HostTime(1),
            fps: 12,
            critical_fps: 20,
        });
        rec.on_frame_rate_warning(&FrameRateWarning {
            at: HostTime(2),
            fps: 11,
            critical_fps: 20,
        });
        let bytes = rec.as_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        assert_eq!(decode(&[0xFF, 1, 2, 3]).count(), 0);
    }
}
