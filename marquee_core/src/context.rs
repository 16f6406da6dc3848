// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared motion context.
//!
//! One [`MotionContext`] is built at startup and handed to every consumer. It
//! owns the process-wide pieces of state (capability readings, performance
//! sampler, scene state machine, scroll store and the section triggers) and
//! wires the data flow between them:
//!
//! ```text
//!   capability probes ──► CapabilityDetector ─┐
//!   frame loop ─────────► PerformanceSampler ─┴─► EffectGates
//!   scroll engine ──────► ScrollStore ──► section triggers ──► active section
//!                                                                  │
//!                                             SceneManager ◄───────┘
//! ```
//!
//! Nothing here is global. Backends keep the context behind whatever shared
//! ownership their event model needs.

use alloc::string::String;

use crate::capability::{CapabilityChange, CapabilityDetector, CapabilitySignal};
use crate::error::ConfigError;
use crate::performance::{PerformanceSampler, PerformanceSnapshot, SamplerConfig};
use crate::scene::{EffectGates, SceneId, SceneManager, SceneTimings};
use crate::scroll::{ScrollMetrics, ScrollStore};
use crate::section::{ActiveSectionTracker, IntersectionSample, section_trigger};
use crate::time::HostTime;
use crate::trace::Tracer;
use crate::trigger::{ElementBounds, ScrollTriggers, TriggerId};

/// Configuration for [`MotionContext::new`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MotionConfig {
    /// Performance sampler settings.
    pub sampler: SamplerConfig,
    /// Scene choreography delays.
    pub scenes: SceneTimings,
}

impl MotionConfig {
    /// Defaults tuned for a browser at 60 Hz.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            sampler: SamplerConfig::web(),
            scenes: SceneTimings::standard(),
        }
    }
}

/// Shared state of the motion layer.
#[derive(Debug)]
pub struct MotionContext {
    capability: CapabilityDetector,
    sampler: PerformanceSampler,
    scenes: SceneManager,
    scroll: ScrollStore,
    triggers: ScrollTriggers<ScrollStore>,
    sections: ActiveSectionTracker,
    routed_section: String,
}

impl MotionContext {
    /// Builds the context. Sections are tracked in `SceneId` page order.
    pub fn new(config: MotionConfig) -> Result<Self, ConfigError> {
        let scroll = ScrollStore::new();
        Ok(Self {
            capability: CapabilityDetector::new(),
            sampler: PerformanceSampler::new(config.sampler)?,
            scenes: SceneManager::new(config.scenes),
            routed_section: String::from(scroll.active_section()),
            scroll,
            triggers: ScrollTriggers::new(),
            sections: ActiveSectionTracker::new(SceneId::ALL.map(SceneId::as_str)),
        })
    }

    /// Capability readings.
    #[must_use]
    pub fn capability(&self) -> &CapabilityDetector {
        &self.capability
    }

    /// Performance sampler.
    #[must_use]
    pub fn sampler(&self) -> &PerformanceSampler {
        &self.sampler
    }

    /// Mutable access for start/stop and probe installation.
    pub fn sampler_mut(&mut self) -> &mut PerformanceSampler {
        &mut self.sampler
    }

    /// Latest performance reading.
    #[must_use]
    pub fn performance(&self) -> &PerformanceSnapshot {
        self.sampler.snapshot()
    }

    /// Scene state machine.
    #[must_use]
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// Mutable access for explicit transitions, preloads and unloads.
    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    /// Scroll store.
    #[must_use]
    pub fn scroll(&self) -> &ScrollStore {
        &self.scroll
    }

    /// Section trigger registry.
    #[must_use]
    pub fn triggers(&self) -> &ScrollTriggers<ScrollStore> {
        &self.triggers
    }

    /// Current effect decisions.
    #[must_use]
    pub fn effect_gates(&self) -> EffectGates {
        EffectGates::evaluate(self.capability.snapshot(), Some(self.sampler.snapshot()))
    }

    /// Whether parallax bindings should be live.
    #[must_use]
    pub fn parallax_enabled(&self) -> bool {
        self.capability.snapshot().should_enable_parallax()
    }

    /// Folds a probe observation. The change tells parallax controllers
    /// whether to tear down or rebuild.
    pub fn apply_capability(&mut self, signal: CapabilitySignal) -> Option<CapabilityChange> {
        self.capability.apply(signal)
    }

    /// Per-frame work: sampling, smoothed section progress, choreography.
    pub fn on_frame(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.sampler.record_frame(now, tracer);
        self.triggers.advance(now, &mut self.scroll);
        self.route_active_section(now, tracer);
        self.scenes.tick(now, tracer);
    }

    /// Feeds one scroll event from the smooth-scroll engine.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: HostTime, tracer: &mut Tracer<'_>) {
        self.scroll.set_metrics(metrics);
        self.triggers.update(metrics.scroll_y, &mut self.scroll, tracer);
        self.route_active_section(now, tracer);
    }

    /// Sets the active section and lets the gatekeeper react.
    pub fn set_active_section(&mut self, section: &str, now: HostTime, tracer: &mut Tracer<'_>) {
        self.scroll.set_active_section(section);
        self.route_active_section(now, tracer);
    }

    /// Feeds an intersection observer batch for the section elements.
    pub fn observe_sections(
        &mut self,
        batch: &[IntersectionSample<'_>],
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        if let Some(section) = self.sections.observe(batch) {
            self.scroll.set_active_section(section);
            self.route_active_section(now, tracer);
        }
    }

    /// Registers the trigger that tracks one section's progress.
    pub fn add_section_trigger(
        &mut self,
        section: &str,
        bounds: ElementBounds,
        viewport_height: f64,
    ) -> TriggerId {
        self.triggers.create(section_trigger(section), bounds, viewport_height)
    }

    /// Evaluates section triggers at the stored scroll offset.
    ///
    /// New triggers start before their range; call this after adding them
    /// to a page that is already scrolled.
    pub fn sync_section_triggers(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        let scroll_y = self.scroll.scroll_y();
        self.triggers.update(scroll_y, &mut self.scroll, tracer);
        self.route_active_section(now, tracer);
    }

    /// Removes a section trigger.
    pub fn remove_section_trigger(&mut self, id: TriggerId) -> bool {
        self.triggers.kill(id)
    }

    /// Recomputes section trigger ranges after a layout change.
    pub fn refresh(
        &mut self,
        viewport_height: f64,
        bounds_of: impl FnMut(TriggerId) -> Option<ElementBounds>,
    ) {
        self.triggers.refresh(viewport_height, bounds_of);
    }

    fn route_active_section(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        let current = self.scroll.active_section();
        if current == self.routed_section {
            return;
        }
        self.routed_section.clear();
        self.routed_section.push_str(current);
        self.scenes.on_active_section(current, now, tracer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::Scrub;
    use kurbo::Rect;

    fn ms(v: u64) -> HostTime {
        HostTime(v * 1000)
    }

    fn context() -> MotionContext {
        MotionContext::new(MotionConfig::web()).unwrap()
    }

    #[test]
    fn active_section_drives_the_scene_machine() {
        let mut cx = context();
        let mut t = Tracer::none();
        cx.set_active_section("skills", ms(0), &mut t);
        assert!(cx.scenes().is_transitioning());
        cx.on_frame(ms(150), &mut t);
        assert_eq!(cx.scenes().current(), SceneId::Skills);
        cx.on_frame(ms(450), &mut t);
        assert!(!cx.scenes().is_transitioning());
    }

    #[test]
    fn scrolling_into_a_section_activates_it() {
        let mut cx = context();
        let mut t = Tracer::none();
        // "about" spans [1000, 2000] with an 800px viewport: range is [360, 1840].
        cx.add_section_trigger(
            "about",
            ElementBounds(Rect::new(0.0, 1000.0, 100.0, 2000.0)),
            800.0,
        );
        let metrics = |scroll_y| ScrollMetrics {
            scroll_y,
            viewport_height: 800.0,
            document_height: 4000.0,
        };
        cx.on_scroll(metrics(100.0), ms(0), &mut t);
        assert_eq!(cx.scroll().active_section(), "hero");

        cx.on_scroll(metrics(500.0), ms(16), &mut t);
        assert_eq!(cx.scroll().active_section(), "about");
        assert!(cx.scenes().is_transitioning());
        assert!((cx.scroll().normalized_progress() - 500.0 / 3200.0).abs() < 1e-9);
    }

    #[test]
    fn sections_added_mid_page_sync_to_the_stored_offset() {
        let mut cx = context();
        let mut t = Tracer::none();
        cx.on_scroll(
            ScrollMetrics {
                scroll_y: 500.0,
                viewport_height: 800.0,
                document_height: 4000.0,
            },
            ms(0),
            &mut t,
        );
        cx.add_section_trigger(
            "about",
            ElementBounds(Rect::new(0.0, 1000.0, 100.0, 2000.0)),
            800.0,
        );
        assert_eq!(cx.scroll().active_section(), "hero");

        cx.sync_section_triggers(ms(16), &mut t);
        assert_eq!(cx.scroll().active_section(), "about");
        assert!(cx.scenes().is_transitioning());

        // A second sync at the same offset fires nothing new.
        cx.sync_section_triggers(ms(32), &mut t);
        assert_eq!(cx.scroll().active_section(), "about");
    }

    #[test]
    fn smoothed_section_progress_settles_on_frames() {
        let mut cx = context();
        let mut t = Tracer::none();
        let id = cx.add_section_trigger(
            "about",
            ElementBounds(Rect::new(0.0, 1000.0, 100.0, 2000.0)),
            800.0,
        );
        assert_eq!(Scrub::default(), Scrub::Smoothed(crate::time::Duration::SECOND));
        cx.on_frame(ms(0), &mut t);
        cx.on_scroll(
            ScrollMetrics {
                scroll_y: 1100.0,
                viewport_height: 800.0,
                document_height: 4000.0,
            },
            ms(0),
            &mut t,
        );
        cx.on_frame(ms(2000), &mut t);
        assert_eq!(cx.triggers().progress(id), Some(0.5));
        assert!((cx.scroll().section_progress("about") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn intersection_batches_route_through_the_store() {
        let mut cx = context();
        let mut t = Tracer::none();
        cx.observe_sections(
            &[IntersectionSample {
                id: "contact",
                is_intersecting: true,
                ratio: 0.6,
            }],
            ms(0),
            &mut t,
        );
        assert_eq!(cx.scroll().active_section(), "contact");
        assert!(cx.scenes().state().loaded_scenes.contains(SceneId::Experience));
    }

    #[test]
    fn reduced_motion_disables_parallax() {
        let mut cx = context();
        assert!(cx.parallax_enabled());
        let change = cx
            .apply_capability(CapabilitySignal::ReducedMotion(true))
            .unwrap();
        assert!(change.reduced_motion);
        assert!(!cx.parallax_enabled());
        assert!(!cx.effect_gates().code_matrix);
    }
}
