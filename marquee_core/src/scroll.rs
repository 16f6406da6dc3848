// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll state store and document progress tracking.
//!
//! [`ScrollStore`] is the single shared record of where the page is scrolled
//! to. It is written by the smooth-scroll bridge and the section triggers and
//! read by everything else. The geometry that feeds
//! [`ScrollState::normalized_progress`] can be written in one call with
//! [`ScrollStore::set_metrics`], so a reader never sees a scroll offset paired
//! with a stale document height.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use crate::time::{Duration, HostTime};

/// Scroll offset and the two heights that bound it.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Vertical scroll offset in CSS pixels.
    pub scroll_y: f64,
    /// Height of the visible viewport.
    pub viewport_height: f64,
    /// Total scrollable height of the document.
    pub document_height: f64,
}

impl ScrollMetrics {
    /// Fraction of the scrollable distance covered, clamped to `[0, 1]`.
    ///
    /// Zero when the document does not overflow the viewport.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let max_scroll = self.document_height - self.viewport_height;
        if max_scroll <= 0.0 {
            return 0.0;
        }
        (self.scroll_y / max_scroll).clamp(0.0, 1.0)
    }
}

/// Snapshot of the scroll store.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollState {
    /// Scroll offset and heights.
    pub metrics: ScrollMetrics,
    /// Id of the section considered active.
    pub active_section: String,
    /// Per-section progress in `[0, 1]`.
    pub section_progress: BTreeMap<String, f64>,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            metrics: ScrollMetrics::default(),
            active_section: "hero".to_string(),
            section_progress: BTreeMap::new(),
        }
    }
}

impl ScrollState {
    /// Scroll offset divided by the scrollable distance.
    ///
    /// Zero when `document_height <= viewport_height`.
    #[must_use]
    pub fn normalized_progress(&self) -> f64 {
        self.metrics.progress()
    }
}

/// Owner of the shared [`ScrollState`].
#[derive(Clone, Debug, Default)]
pub struct ScrollStore {
    state: ScrollState,
}

impl ScrollStore {
    /// Creates a store at the top of the page with `hero` active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the whole state.
    #[must_use]
    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    /// Current scroll offset.
    #[must_use]
    pub fn scroll_y(&self) -> f64 {
        self.state.metrics.scroll_y
    }

    /// Current active section id.
    #[must_use]
    pub fn active_section(&self) -> &str {
        &self.state.active_section
    }

    /// Progress of `section`, zero if never written.
    #[must_use]
    pub fn section_progress(&self, section: &str) -> f64 {
        self.state
            .section_progress
            .get(section)
            .copied()
            .unwrap_or(0.0)
    }

    /// See [`ScrollState::normalized_progress`].
    #[must_use]
    pub fn normalized_progress(&self) -> f64 {
        self.state.normalized_progress()
    }

    /// Sets the scroll offset.
    pub fn set_scroll_y(&mut self, value: f64) {
        self.state.metrics.scroll_y = value;
    }

    /// Sets the viewport height.
    pub fn set_viewport_height(&mut self, height: f64) {
        self.state.metrics.viewport_height = height;
    }

    /// Sets the document height.
    pub fn set_document_height(&mut self, height: f64) {
        self.state.metrics.document_height = height;
    }

    /// Replaces offset and heights together.
    pub fn set_metrics(&mut self, metrics: ScrollMetrics) {
        self.state.metrics = metrics;
    }

    /// Sets the active section.
    ///
    /// Returns `true` if the value changed, which is the cue for the scene
    /// gatekeeper to react.
    pub fn set_active_section(&mut self, section: &str) -> bool {
        if self.state.active_section == section {
            return false;
        }
        self.state.active_section.clear();
        self.state.active_section.push_str(section);
        true
    }

    /// Records progress for `section`, clamped to `[0, 1]`.
    ///
    /// NaN is stored as zero.
    pub fn set_section_progress(&mut self, section: &str, progress: f64) {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        match self.state.section_progress.get_mut(section) {
            Some(slot) => *slot = progress,
            None => {
                self.state
                    .section_progress
                    .insert(section.to_string(), progress);
            }
        }
    }
}

/// Default minimum spacing between document progress reads.
pub const DEFAULT_PROGRESS_THROTTLE: Duration = Duration::from_millis_u64(10);

/// Outcome of [`DocumentProgress::offer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleOutcome {
    /// The metrics were read and progress updated.
    Applied,
    /// Too soon; the caller should request one animation frame and call
    /// [`DocumentProgress::on_frame`] from it.
    ScheduleFrame,
    /// Too soon, and a frame is already pending.
    Pending,
}

/// Page-level progress indicator fed by scroll and resize events.
///
/// Reads are throttled; a throttled read is retried on the next animation
/// frame so the final position of a fling is never lost.
#[derive(Clone, Debug)]
pub struct DocumentProgress {
    throttle: Duration,
    last_read: Option<HostTime>,
    frame_pending: bool,
    metrics: ScrollMetrics,
}

impl Default for DocumentProgress {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_THROTTLE)
    }
}

impl DocumentProgress {
    /// Creates a tracker that reads at most once per `throttle`.
    #[must_use]
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            last_read: None,
            frame_pending: false,
            metrics: ScrollMetrics::default(),
        }
    }

    /// Handles a scroll or resize event.
    ///
    /// `read` is only invoked when the throttle allows it.
    pub fn offer(
        &mut self,
        now: HostTime,
        read: impl FnOnce() -> ScrollMetrics,
    ) -> ThrottleOutcome {
        if let Some(last) = self.last_read
            && now - last < self.throttle
        {
            if self.frame_pending {
                return ThrottleOutcome::Pending;
            }
            self.frame_pending = true;
            return ThrottleOutcome::ScheduleFrame;
        }
        self.last_read = Some(now);
        self.metrics = read();
        ThrottleOutcome::Applied
    }

    /// Retries a throttled read from the scheduled frame.
    pub fn on_frame(
        &mut self,
        now: HostTime,
        read: impl FnOnce() -> ScrollMetrics,
    ) -> ThrottleOutcome {
        self.frame_pending = false;
        self.offer(now, read)
    }

    /// Returns `true` while a retry frame is outstanding.
    #[must_use]
    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Metrics from the latest applied read.
    #[must_use]
    pub fn metrics(&self) -> &ScrollMetrics {
        &self.metrics
    }

    /// Progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.metrics.progress()
    }

    /// Progress as a whole percentage.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "progress is clamped to [0, 1]"
    )]
    pub fn percent(&self) -> u8 {
        libm::round(self.progress() * 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(scroll_y: f64, viewport_height: f64, document_height: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_y,
            viewport_height,
            document_height,
        }
    }

    #[test]
    fn normalized_progress_is_zero_without_overflow() {
        let mut store = ScrollStore::new();
        store.set_metrics(metrics(300.0, 800.0, 800.0));
        assert_eq!(store.normalized_progress(), 0.0);
        store.set_metrics(metrics(300.0, 800.0, 600.0));
        assert_eq!(store.normalized_progress(), 0.0);
    }

    #[test]
    fn normalized_progress_divides_by_scrollable_distance() {
        let mut store = ScrollStore::new();
        store.set_viewport_height(800.0);
        store.set_document_height(2800.0);
        store.set_scroll_y(500.0);
        assert!((store.normalized_progress() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn section_progress_is_clamped() {
        let mut store = ScrollStore::new();
        store.set_section_progress("about", 1.5);
        store.set_section_progress("skills", -0.2);
        store.set_section_progress("projects", f64::NAN);
        assert_eq!(store.section_progress("about"), 1.0);
        assert_eq!(store.section_progress("skills"), 0.0);
        assert_eq!(store.section_progress("projects"), 0.0);
        assert_eq!(store.section_progress("contact"), 0.0);
    }

    #[test]
    fn active_section_reports_changes() {
        let mut store = ScrollStore::new();
        assert_eq!(store.active_section(), "hero");
        assert!(!store.set_active_section("hero"));
        assert!(store.set_active_section("about"));
        assert_eq!(store.active_section(), "about");
    }

    #[test]
    fn throttled_reads_defer_to_one_frame() {
        let mut doc = DocumentProgress::default();
        let t = |ms: u64| HostTime(ms * 1000);

        assert_eq!(
            doc.offer(t(0), || metrics(0.0, 800.0, 1800.0)),
            ThrottleOutcome::Applied
        );
        assert_eq!(
            doc.offer(t(4), || unreachable!()),
            ThrottleOutcome::ScheduleFrame
        );
        assert_eq!(doc.offer(t(6), || unreachable!()), ThrottleOutcome::Pending);
        assert!(doc.is_frame_pending());

        assert_eq!(
            doc.on_frame(t(16), || metrics(500.0, 800.0, 1800.0)),
            ThrottleOutcome::Applied
        );
        assert!(!doc.is_frame_pending());
        assert_eq!(doc.percent(), 50);
    }

    #[test]
    fn percent_rounds() {
        let mut doc = DocumentProgress::default();
        doc.offer(HostTime(0), || metrics(333.0, 0.0, 1000.0));
        assert_eq!(doc.percent(), 33);
    }
}
