// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for the motion layer.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! coordinator can emit. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink` and is threaded through
//! every operation that may emit. A [`Tracer::none`] costs one `Option`
//! branch per call site.
//!
//! Sinks live outside this crate: the web backend forwards to the browser
//! console, and `marquee_debug` offers a pretty printer, an in-memory
//! recorder, and a Chrome Trace Event exporter.

use crate::performance::PerformanceSnapshot;
use crate::scene::SceneId;
use crate::time::HostTime;
use crate::trigger::{TriggerEdge, TriggerId};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted each time the performance sampler closes an aggregation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceSampleEvent {
    /// Frame time that closed the window.
    pub at: HostTime,
    /// The freshly computed snapshot.
    pub snapshot: PerformanceSnapshot,
}

/// Emitted when an aggregated reading falls below the critical frame rate.
///
/// This is an operator hint, not an error: nothing is torn down because of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRateWarning {
    /// Frame time that closed the window.
    pub at: HostTime,
    /// The measured frame rate.
    pub fps: u32,
    /// The configured critical threshold.
    pub critical_fps: u32,
}

/// Which step of the exit/enter choreography a scene transition reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// The transition was accepted and the exit animation started.
    Begin,
    /// The exit delay elapsed and `current` now names the target.
    Commit,
    /// The enter delay elapsed and the guard was released.
    Settle,
}

/// Emitted at each step of a scene transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneTransitionEvent {
    /// Time of the step.
    pub at: HostTime,
    /// Which step was reached.
    pub phase: TransitionPhase,
    /// Scene being left.
    pub from: SceneId,
    /// Scene being entered.
    pub to: SceneId,
}

/// Emitted when a scroll trigger crosses one of its range edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerEdgeEvent {
    /// The trigger that fired.
    pub trigger: TriggerId,
    /// Which edge was crossed.
    pub edge: TriggerEdge,
    /// Scroll offset that caused the crossing.
    pub scroll_y: f64,
}

/// Severity of a [`DiagnosticEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// Informational lifecycle notes.
    Info,
    /// Something degraded but the caller was not failed.
    Warn,
    /// An operation failed and the error was propagated.
    Error,
}

/// A free-form diagnostic line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticEvent<'a> {
    /// Severity.
    pub level: DiagnosticLevel,
    /// Component that emitted the message (e.g. `"scroll"`).
    pub source: &'static str,
    /// Message text.
    pub message: &'a str,
}

/// Progress of a snapshot export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportStage<'a> {
    /// Styling overrides are about to be applied.
    Started,
    /// The document was written.
    Completed {
        /// Number of pages in the written document.
        pages: usize,
    },
    /// The export failed; the error is returned to the caller as well.
    Failed {
        /// Rendered error message.
        reason: &'a str,
    },
}

/// Emitted as a snapshot export moves through its pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportEvent<'a> {
    /// Id of the exported subtree.
    pub element_id: &'a str,
    /// Output file name, without extension.
    pub filename: &'a str,
    /// Pipeline stage.
    pub stage: ExportStage<'a>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the motion layer.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when the performance sampler closes a window.
    fn on_performance_sample(&mut self, e: &PerformanceSampleEvent) {
        _ = e;
    }

    /// Called when a window's frame rate is critically low.
    fn on_frame_rate_warning(&mut self, e: &FrameRateWarning) {
        _ = e;
    }

    /// Called at each step of a scene transition.
    fn on_scene_transition(&mut self, e: &SceneTransitionEvent) {
        _ = e;
    }

    /// Called when a scroll trigger crosses an edge.
    fn on_trigger_edge(&mut self, e: &TriggerEdgeEvent) {
        _ = e;
    }

    /// Called for free-form diagnostics.
    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        _ = e;
    }

    /// Called as a snapshot export progresses.
    fn on_export(&mut self, e: &ExportEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    sink: Option<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Emits a [`PerformanceSampleEvent`].
    #[inline]
    pub fn performance_sample(&mut self, e: &PerformanceSampleEvent) {
        if let Some(s) = &mut self.sink {
            s.on_performance_sample(e);
        }
    }

    /// Emits a [`FrameRateWarning`].
    #[inline]
    pub fn frame_rate_warning(&mut self, e: &FrameRateWarning) {
        if let Some(s) = &mut self.sink {
            s.on_frame_rate_warning(e);
        }
    }

    /// Emits a [`SceneTransitionEvent`].
    #[inline]
    pub fn scene_transition(&mut self, e: &SceneTransitionEvent) {
        if let Some(s) = &mut self.sink {
            s.on_scene_transition(e);
        }
    }

    /// Emits a [`TriggerEdgeEvent`].
    #[inline]
    pub fn trigger_edge(&mut self, e: &TriggerEdgeEvent) {
        if let Some(s) = &mut self.sink {
            s.on_trigger_edge(e);
        }
    }

    /// Emits a [`DiagnosticEvent`].
    #[inline]
    pub fn diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_diagnostic(e);
        }
    }

    /// Shorthand for a [`DiagnosticLevel::Warn`] diagnostic.
    #[inline]
    pub fn warn(&mut self, source: &'static str, message: &str) {
        self.diagnostic(&DiagnosticEvent {
            level: DiagnosticLevel::Warn,
            source,
            message,
        });
    }

    /// Emits an [`ExportEvent`].
    #[inline]
    pub fn export(&mut self, e: &ExportEvent<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_export(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    #[derive(Default)]
    struct RecordingSink {
        transitions: Vec<TransitionPhase>,
        warnings: Vec<String>,
    }

    impl TraceSink for RecordingSink {
        fn on_scene_transition(&mut self, e: &SceneTransitionEvent) {
            self.transitions.push(e.phase);
        }

        fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
            self.warnings.push(e.message.to_string());
        }
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.warn("test", "dropped");
        tracer.scene_transition(&SceneTransitionEvent {
            at: HostTime(0),
            phase: TransitionPhase::Begin,
            from: SceneId::Hero,
            to: SceneId::About,
        });
    }

    #[test]
    fn tracer_dispatches_to_sink() {
        let mut sink = RecordingSink::default();
        let mut tracer = Tracer::new(&mut sink);
        tracer.scene_transition(&SceneTransitionEvent {
            at: HostTime(10),
            phase: TransitionPhase::Commit,
            from: SceneId::Hero,
            to: SceneId::Skills,
        });
        tracer.warn("scroll", "no provider");
        drop(tracer);
        assert_eq!(sink.transitions, &[TransitionPhase::Commit]);
        assert_eq!(sink.warnings, &["no provider"]);
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_frame_rate_warning(&FrameRateWarning {
            at: HostTime(0),
            fps: 12,
            critical_fps: 20,
        });
        sink.on_export(&ExportEvent {
            element_id: "resume",
            filename: "resume",
            stage: ExportStage::Started,
        });
    }
}
