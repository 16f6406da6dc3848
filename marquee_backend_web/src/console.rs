// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace events on the browser console.

use marquee_core::trace::{
    DiagnosticEvent, DiagnosticLevel, ExportEvent, ExportStage, FrameRateWarning,
    PerformanceSampleEvent, SceneTransitionEvent, TraceSink, TriggerEdgeEvent,
};
use wasm_bindgen::JsValue;
use web_sys::console;

/// A [`TraceSink`] writing to `console.*`.
///
/// Warnings, errors and export progress are always logged. Per-window
/// samples, scene phases and trigger edges only when `verbose`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    /// A sink logging warnings, errors and exports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that also logs high-frequency events at debug level.
    #[must_use]
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

pub(crate) fn frame_rate_line(e: &FrameRateWarning) -> String {
    format!(
        "[PerformanceMonitor] Critical FPS: {} (threshold {}). Consider reducing visual complexity.",
        e.fps, e.critical_fps
    )
}

pub(crate) fn export_line(e: &ExportEvent<'_>) -> String {
    match e.stage {
        ExportStage::Started => format!("[Snapshot] exporting #{} as {}.pdf", e.element_id, e.filename),
        ExportStage::Completed { pages } => {
            format!("[Snapshot] wrote {}.pdf ({pages} pages)", e.filename)
        }
        ExportStage::Failed { reason } => format!("PDF generation failed: {reason}"),
    }
}

impl TraceSink for ConsoleSink {
    fn on_performance_sample(&mut self, e: &PerformanceSampleEvent) {
        if self.verbose {
            let s = &e.snapshot;
            console::debug_1(
                &format!(
                    "[PerformanceMonitor] fps={} avg={:.2}ms score={}",
                    s.fps, s.avg_frame_time, s.performance_score
                )
                .into(),
            );
        }
    }

    fn on_frame_rate_warning(&mut self, e: &FrameRateWarning) {
        console::warn_1(&frame_rate_line(e).into());
    }

    fn on_scene_transition(&mut self, e: &SceneTransitionEvent) {
        if self.verbose {
            console::debug_1(
                &format!("[SceneManager] {:?} {} -> {}", e.phase, e.from, e.to).into(),
            );
        }
    }

    fn on_trigger_edge(&mut self, e: &TriggerEdgeEvent) {
        if self.verbose {
            console::debug_1(
                &format!(
                    "[ScrollTrigger] #{} {:?} at {:.0}px",
                    e.trigger.0, e.edge, e.scroll_y
                )
                .into(),
            );
        }
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        let line = JsValue::from(format!("[{}] {}", e.source, e.message));
        match e.level {
            DiagnosticLevel::Info => console::info_1(&line),
            DiagnosticLevel::Warn => console::warn_1(&line),
            DiagnosticLevel::Error => console::error_1(&line),
        }
    }

    fn on_export(&mut self, e: &ExportEvent<'_>) {
        let line = JsValue::from(export_line(e));
        match e.stage {
            ExportStage::Failed { .. } => console::error_1(&line),
            _ => console::info_1(&line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::time::HostTime;

    #[test]
    fn critical_fps_line_names_both_rates() {
        let line = frame_rate_line(&FrameRateWarning {
            at: HostTime(0),
            fps: 12,
            critical_fps: 20,
        });
        assert!(line.contains("Critical FPS: 12"));
        assert!(line.contains("threshold 20"));
    }

    #[test]
    fn export_lines_follow_the_stage() {
        let event = |stage| ExportEvent {
            element_id: "resume",
            filename: "resume",
            stage,
        };
        assert_eq!(
            export_line(&event(ExportStage::Completed { pages: 2 })),
            "[Snapshot] wrote resume.pdf (2 pages)"
        );
        assert_eq!(
            export_line(&event(ExportStage::Failed { reason: "boom" })),
            "PDF generation failed: boom"
        );
    }
}
