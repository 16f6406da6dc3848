// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Scene transitions and exports become duration slices (`B`/`E` pairs),
//! performance samples become counters, everything else is an instant.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use marquee_core::trace::TransitionPhase;

use crate::recorder::{RecordedEvent, RecordedStage, decode};

const TID_PERFORMANCE: u32 = 0;
const TID_SCENES: u32 = 1;
const TID_TRIGGERS: u32 = 2;
const TID_EXPORT: u32 = 3;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Host time is already in microseconds. Trigger edges, diagnostics and
/// export stages carry no timestamp of their own and are placed at the most
/// recent timestamped event.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0_u64;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PerformanceSample(e) => {
                last_ts = e.at.ticks();
                events.push(json!({
                    "ph": "C",
                    "name": "Performance",
                    "cat": "Sampler",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_PERFORMANCE,
                    "args": {
                        "fps": e.snapshot.fps,
                        "score": e.snapshot.performance_score,
                        "avg_frame_ms": e.snapshot.avg_frame_time,
                    }
                }));
            }
            RecordedEvent::FrameRateWarning(e) => {
                last_ts = e.at.ticks();
                events.push(json!({
                    "ph": "i",
                    "name": "CriticalFps",
                    "cat": "Sampler",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_PERFORMANCE,
                    "s": "g",
                    "args": {
                        "fps": e.fps,
                        "critical_fps": e.critical_fps,
                    }
                }));
            }
            RecordedEvent::SceneTransition(e) => {
                last_ts = e.at.ticks();
                let ph = match e.phase {
                    TransitionPhase::Begin => "B",
                    TransitionPhase::Commit => "i",
                    TransitionPhase::Settle => "E",
                };
                let name = if e.phase == TransitionPhase::Commit {
                    format!("commit {}", e.to)
                } else {
                    format!("{} -> {}", e.from, e.to)
                };
                events.push(json!({
                    "ph": ph,
                    "name": name,
                    "cat": "Scene",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_SCENES,
                }));
            }
            RecordedEvent::TriggerEdge(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.edge),
                    "cat": "Trigger",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_TRIGGERS,
                    "s": "t",
                    "args": {
                        "trigger": e.trigger.0,
                        "scroll_y": e.scroll_y,
                    }
                }));
            }
            RecordedEvent::Diagnostic {
                level,
                source,
                message,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{level:?}"),
                    "cat": source,
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "message": message,
                    }
                }));
            }
            RecordedEvent::Export {
                element_id,
                filename,
                stage,
            } => {
                let name = format!("export #{element_id}");
                let (ph, args) = match stage {
                    RecordedStage::Started => ("B", json!({ "filename": filename })),
                    RecordedStage::Completed { pages } => ("E", json!({ "pages": pages })),
                    RecordedStage::Failed { reason } => ("E", json!({ "error": reason })),
                };
                events.push(json!({
                    "ph": ph,
                    "name": name,
                    "cat": "Export",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_EXPORT,
                    "args": args,
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use marquee_core::scene::SceneId;
    use marquee_core::time::HostTime;
    use marquee_core::trace::{
        ExportEvent, ExportStage, SceneTransitionEvent, TraceSink, TriggerEdgeEvent,
    };
    use marquee_core::trigger::{TriggerEdge, TriggerId};

    fn transition(at: u64, phase: TransitionPhase) -> SceneTransitionEvent {
        SceneTransitionEvent {
            at: HostTime(at),
            phase,
            from: SceneId::Hero,
            to: SceneId::About,
        }
    }

    #[test]
    fn scene_transition_becomes_a_slice() {
        let mut rec = RecorderSink::new();
        rec.on_scene_transition(&transition(1_000, TransitionPhase::Begin));
        rec.on_scene_transition(&transition(151_000, TransitionPhase::Commit));
        rec.on_trigger_edge(&TriggerEdgeEvent {
            trigger: TriggerId(0),
            edge: TriggerEdge::Enter,
            scroll_y: 400.0,
        });
        rec.on_scene_transition(&transition(451_000, TransitionPhase::Settle));

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "hero -> about");
        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "commit about");

        // The trigger edge borrows the commit's timestamp.
        assert_eq!(parsed[2]["name"], "Enter");
        assert_eq!(parsed[2]["ts"], 151_000);

        assert_eq!(parsed[3]["ph"], "E");
        assert_eq!(parsed[3]["name"], parsed[0]["name"]);
    }

    #[test]
    fn export_stages_pair_up() {
        let mut rec = RecorderSink::new();
        for stage in [ExportStage::Started, ExportStage::Completed { pages: 3 }] {
            rec.on_export(&ExportEvent {
                element_id: "resume",
                filename: "resume",
                stage,
            });
        }

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["args"]["pages"], 3);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
