// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds of host time.

use std::io::Write;

use marquee_core::trace::{
    DiagnosticEvent, DiagnosticLevel, ExportEvent, ExportStage, FrameRateWarning,
    PerformanceSampleEvent, SceneTransitionEvent, TraceSink, TransitionPhase, TriggerEdgeEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: TransitionPhase) -> &'static str {
    match phase {
        TransitionPhase::Begin => "begin",
        TransitionPhase::Commit => "commit",
        TransitionPhase::Settle => "settle",
    }
}

fn level_name(level: DiagnosticLevel) -> &'static str {
    match level {
        DiagnosticLevel::Info => "info",
        DiagnosticLevel::Warn => "warn",
        DiagnosticLevel::Error => "error",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_performance_sample(&mut self, e: &PerformanceSampleEvent) {
        let s = &e.snapshot;
        let memory = s
            .memory_usage_mb
            .map_or_else(|| "n/a".to_owned(), |mb| format!("{mb}MB"));
        let low = if s.is_low_performance { " LOW" } else { "" };
        let _ = writeln!(
            self.writer,
            "[sample] at={:.1}ms fps={} avg={:.2}ms score={} mem={memory}{low}",
            e.at.as_millis(),
            s.fps,
            s.avg_frame_time,
            s.performance_score,
        );
    }

    fn on_frame_rate_warning(&mut self, e: &FrameRateWarning) {
        let _ = writeln!(
            self.writer,
            "[fps:critical] at={:.1}ms fps={} threshold={}",
            e.at.as_millis(),
            e.fps,
            e.critical_fps,
        );
    }

    fn on_scene_transition(&mut self, e: &SceneTransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[scene:{}] {} -> {} at {:.1}ms",
            phase_name(e.phase),
            e.from,
            e.to,
            e.at.as_millis(),
        );
    }

    fn on_trigger_edge(&mut self, e: &TriggerEdgeEvent) {
        let _ = writeln!(
            self.writer,
            "[trigger] #{} {:?} at y={:.0}",
            e.trigger.0, e.edge, e.scroll_y,
        );
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[{}:{}] {}",
            level_name(e.level),
            e.source,
            e.message,
        );
    }

    fn on_export(&mut self, e: &ExportEvent<'_>) {
        let _ = match e.stage {
            ExportStage::Started => writeln!(
                self.writer,
                "[export] #{} -> {}.pdf started",
                e.element_id, e.filename,
            ),
            ExportStage::Completed { pages } => writeln!(
                self.writer,
                "[export] #{} -> {}.pdf pages={pages}",
                e.element_id, e.filename,
            ),
            ExportStage::Failed { reason } => writeln!(
                self.writer,
                "[export] #{} FAILED: {reason}",
                e.element_id,
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::performance::PerformanceSnapshot;
    use marquee_core::scene::SceneId;
    use marquee_core::time::HostTime;
    use marquee_core::trace::Tracer;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_sample() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_performance_sample(&PerformanceSampleEvent {
            at: HostTime(1_500_000),
            snapshot: PerformanceSnapshot {
                fps: 24,
                frame_time: 41.0,
                avg_frame_time: 41.66,
                memory_usage_mb: None,
                performance_score: 40,
                is_low_performance: true,
            },
        });
        let output = output(sink);
        assert!(output.starts_with("[sample] at=1500.0ms fps=24"), "got: {output}");
        assert!(output.contains("mem=n/a LOW"), "got: {output}");
    }

    #[test]
    fn pretty_print_scene_and_warning() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_scene_transition(&SceneTransitionEvent {
            at: HostTime(150_000),
            phase: TransitionPhase::Commit,
            from: SceneId::Skills,
            to: SceneId::Projects,
        });
        Tracer::new(&mut sink).warn("scroll", "no scroll context");
        let output = output(sink);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            ["[scene:commit] skills -> projects at 150.0ms", "[warn:scroll] no scroll context"]
        );
    }

    #[test]
    fn pretty_print_failed_export() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_export(&ExportEvent {
            element_id: "resume",
            filename: "resume",
            stage: ExportStage::Failed {
                reason: "element not found",
            },
        });
        assert_eq!(output(sink), "[export] #resume FAILED: element not found\n");
    }
}
