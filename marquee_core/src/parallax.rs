// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parallax bindings and progress-derived transforms.
//!
//! A [`ParallaxController`] owns one scroll trigger per element. Each element
//! is displaced along its axis by `distance * (1 - 2 * progress)`, where
//! `distance = 100 * speed`: it starts `distance` pixels off, crosses zero
//! halfway through the range and ends at `-distance`.
//!
//! The controller does not touch the DOM. It writes [`ParallaxOffset`]s into a
//! caller-provided buffer and the backend applies them as transforms. `K` is
//! whatever the backend uses to name an element.
//!
//! ## Lifecycle
//!
//! ```text
//!   mount() ──► next on_frame() ──► triggers live
//!                                     │   ▲
//!        reduced motion turns on ─────┘   └──── reduced motion turns off
//!        (triggers killed, offsets zeroed)       (triggers recreated)
//!   unmount() ──► triggers killed
//! ```

use alloc::vec::Vec;

use kurbo::Vec2;

use crate::time::HostTime;
use crate::trace::Tracer;
use crate::trigger::{
    ElementBounds, Scrub, ScrollTriggers, TriggerDescriptor, TriggerId, TriggerPosition,
};

/// Axis along which an element is displaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Axis {
    /// Translate along y.
    #[default]
    Vertical,
    /// Translate along x.
    Horizontal,
}

impl Axis {
    /// A vector of length `amount` along this axis.
    #[must_use]
    pub fn offset(self, amount: f64) -> Vec2 {
        match self {
            Self::Vertical => Vec2::new(0.0, amount),
            Self::Horizontal => Vec2::new(amount, 0.0),
        }
    }
}

/// Displacement at `progress` for an element travelling `distance` pixels.
#[must_use]
pub fn displacement(distance: f64, progress: f64) -> f64 {
    distance * (1.0 - progress * 2.0)
}

/// Range and smoothing shared by every element of a controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxOptions {
    /// Where displacement is `+distance`.
    pub start: TriggerPosition,
    /// Where displacement is `-distance`.
    pub end: TriggerPosition,
    /// Progress smoothing.
    pub scrub: Scrub,
}

impl ParallaxOptions {
    /// Element entering at the bottom to element leaving at the top,
    /// following the scroll directly.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            start: TriggerPosition::TOP_BOTTOM,
            end: TriggerPosition::BOTTOM_TOP,
            scrub: Scrub::Direct,
        }
    }
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Default speed factor for a single element.
pub const DEFAULT_SPEED: f64 = 0.5;

/// An element bound to a controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ParallaxElement<K> {
    /// Backend handle for the element.
    pub key: K,
    /// Speed factor; travel distance is `100 * speed`.
    pub speed: f64,
    /// Displacement axis.
    pub axis: Axis,
}

impl<K> ParallaxElement<K> {
    /// Travel distance in pixels.
    #[must_use]
    pub fn distance(&self) -> f64 {
        100.0 * self.speed
    }
}

/// A transform the backend should apply.
#[derive(Clone, Debug, PartialEq)]
pub struct ParallaxOffset<K> {
    /// Element to move.
    pub key: K,
    /// Translation in CSS pixels.
    pub offset: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Detached,
    AttachPending,
    Live,
    Suspended,
}

/// Parallax bindings for a group of elements sharing one range shape.
pub struct ParallaxController<K> {
    elements: Vec<ParallaxElement<K>>,
    options: ParallaxOptions,
    triggers: ScrollTriggers<Vec<ParallaxOffset<K>>>,
    ids: Vec<(TriggerId, K)>,
    phase: Phase,
}

impl<K: core::fmt::Debug> core::fmt::Debug for ParallaxController<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParallaxController")
            .field("elements", &self.elements)
            .field("options", &self.options)
            .field("phase", &self.phase)
            .field("live", &self.ids.len())
            .finish_non_exhaustive()
    }
}

impl<K: Clone + 'static> ParallaxController<K> {
    /// Creates a detached controller with no elements.
    #[must_use]
    pub fn new(options: ParallaxOptions) -> Self {
        Self {
            elements: Vec::new(),
            options,
            triggers: ScrollTriggers::new(),
            ids: Vec::new(),
            phase: Phase::Detached,
        }
    }

    /// A controller for one vertical element at the default speed.
    #[must_use]
    pub fn single(key: K) -> Self {
        let mut controller = Self::new(ParallaxOptions::standard());
        controller.add(key, DEFAULT_SPEED, Axis::Vertical);
        controller
    }

    /// Adds an element. Takes effect at the next attach.
    pub fn add(&mut self, key: K, speed: f64, axis: Axis) {
        self.elements.push(ParallaxElement { key, speed, axis });
    }

    /// Bound elements.
    #[must_use]
    pub fn elements(&self) -> &[ParallaxElement<K>] {
        &self.elements
    }

    /// Returns `true` while triggers are live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    /// Schedules trigger creation for the next [`on_frame`](Self::on_frame),
    /// once layout has settled.
    pub fn mount(&mut self) {
        if self.phase == Phase::Detached {
            self.phase = Phase::AttachPending;
        }
    }

    /// Attaches a pending mount and evaluates it at `scroll_y`.
    ///
    /// With `enabled == false` (reduced motion) the controller stays
    /// suspended and nothing is written. Elements whose bounds are unknown
    /// are skipped.
    pub fn on_frame(
        &mut self,
        enabled: bool,
        viewport_height: f64,
        scroll_y: f64,
        bounds_of: impl FnMut(&K) -> Option<ElementBounds>,
        out: &mut Vec<ParallaxOffset<K>>,
    ) {
        if self.phase != Phase::AttachPending {
            return;
        }
        if enabled {
            self.attach(viewport_height, scroll_y, bounds_of, out);
        } else {
            self.phase = Phase::Suspended;
        }
    }

    /// Reacts to the parallax policy flipping.
    ///
    /// Turning off kills every trigger and zeroes every offset. Turning on
    /// recreates the triggers of a suspended controller and evaluates them at
    /// `scroll_y`.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        viewport_height: f64,
        scroll_y: f64,
        bounds_of: impl FnMut(&K) -> Option<ElementBounds>,
        out: &mut Vec<ParallaxOffset<K>>,
    ) {
        match (self.phase, enabled) {
            (Phase::Live, false) => {
                self.kill_triggers();
                self.phase = Phase::Suspended;
                out.extend(self.elements.iter().map(|e| ParallaxOffset {
                    key: e.key.clone(),
                    offset: Vec2::ZERO,
                }));
            }
            (Phase::Suspended, true) => {
                self.attach(viewport_height, scroll_y, bounds_of, out);
            }
            _ => {}
        }
    }

    /// Feeds a scroll offset; displaced elements are written to `out`.
    pub fn update(&mut self, scroll_y: f64, out: &mut Vec<ParallaxOffset<K>>) {
        self.triggers.update(scroll_y, out, &mut Tracer::none());
    }

    /// Advances smoothed scrub.
    pub fn advance(&mut self, now: HostTime, out: &mut Vec<ParallaxOffset<K>>) {
        self.triggers.advance(now, out);
    }

    /// Recomputes trigger ranges after a layout change.
    pub fn refresh(
        &mut self,
        viewport_height: f64,
        mut bounds_of: impl FnMut(&K) -> Option<ElementBounds>,
    ) {
        let ids = &self.ids;
        self.triggers.refresh(viewport_height, |id| {
            ids.iter()
                .find(|(candidate, _)| *candidate == id)
                .and_then(|(_, key)| bounds_of(key))
        });
    }

    /// Kills every trigger. The elements keep their last offset.
    pub fn unmount(&mut self) {
        self.kill_triggers();
        self.phase = Phase::Detached;
    }

    fn attach(
        &mut self,
        viewport_height: f64,
        scroll_y: f64,
        mut bounds_of: impl FnMut(&K) -> Option<ElementBounds>,
        out: &mut Vec<ParallaxOffset<K>>,
    ) {
        self.kill_triggers();
        for element in &self.elements {
            let Some(bounds) = bounds_of(&element.key) else {
                continue;
            };
            let distance = element.distance();
            let axis = element.axis;
            let key = element.key.clone();
            out.push(ParallaxOffset {
                key: key.clone(),
                offset: axis.offset(distance),
            });
            let descriptor = TriggerDescriptor::default()
                .range(self.options.start, self.options.end)
                .scrub(self.options.scrub)
                .on_update(move |out: &mut Vec<ParallaxOffset<K>>, progress| {
                    out.push(ParallaxOffset {
                        key: key.clone(),
                        offset: axis.offset(displacement(distance, progress)),
                    });
                });
            let id = self.triggers.create(descriptor, bounds, viewport_height);
            self.ids.push((id, element.key.clone()));
        }
        self.phase = Phase::Live;
        self.triggers.update(scroll_y, out, &mut Tracer::none());
    }

    fn kill_triggers(&mut self) {
        self.triggers.kill_all();
        self.ids.clear();
    }
}

/// Transforms derived from a single progress value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressTransforms {
    /// Fades in over the first half: `min(1, 2p)`.
    pub opacity: f64,
    /// Fades out over the second half: `1 - (p - 0.5) * 2`, clamped to
    /// `[0, 1]` so it can be used as an opacity directly.
    pub fade_out: f64,
    /// Slides from +50px to -50px: `(0.5 - p) * -100`.
    pub translate_y: f64,
    /// Grows from 0.8 to 1.0.
    pub scale: f64,
}

impl ProgressTransforms {
    /// Derives every transform from `progress`.
    #[must_use]
    pub fn from_progress(progress: f64) -> Self {
        Self {
            opacity: (progress * 2.0).min(1.0),
            fade_out: (1.0 - (progress - 0.5) * 2.0).clamp(0.0, 1.0),
            translate_y: (0.5 - progress) * -100.0,
            scale: 0.8 + progress * 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use kurbo::Rect;

    fn bounds(_: &u32) -> Option<ElementBounds> {
        Some(ElementBounds(Rect::new(0.0, 1000.0, 100.0, 1200.0)))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn displacement_crosses_zero_halfway() {
        assert!(close(displacement(100.0, 0.0), 100.0));
        assert!(close(displacement(100.0, 0.5), 0.0));
        assert!(close(displacement(100.0, 1.0), -100.0));
    }

    #[test]
    fn attach_is_deferred_to_the_next_frame() {
        let mut c = ParallaxController::single(7_u32);
        let mut out = Vec::new();
        c.update(0.0, &mut out);
        assert!(out.is_empty());

        c.mount();
        assert!(!c.is_live());
        c.on_frame(true, 800.0, 0.0, bounds, &mut out);
        assert!(c.is_live());
        assert_eq!(
            out,
            vec![ParallaxOffset {
                key: 7,
                offset: Vec2::new(0.0, 50.0),
            }]
        );
    }

    #[test]
    fn attach_evaluates_the_current_offset() {
        let mut c = ParallaxController::single(7_u32);
        let mut out = Vec::new();
        c.mount();
        // Range is [200, 1200]; a page loaded at 700 is halfway through.
        c.on_frame(true, 800.0, 700.0, bounds, &mut out);
        assert_eq!(out.last().map(|o| o.offset), Some(Vec2::ZERO));

        out.clear();
        c.set_enabled(false, 800.0, 700.0, bounds, &mut out);
        out.clear();
        c.set_enabled(true, 800.0, 1200.0, bounds, &mut out);
        assert_eq!(out.last().map(|o| o.offset), Some(Vec2::new(0.0, -50.0)));
    }

    #[test]
    fn update_writes_displacement_along_axis() {
        let mut c = ParallaxController::new(ParallaxOptions::standard());
        c.add(1_u32, 1.0, Axis::Horizontal);
        c.mount();
        let mut out = Vec::new();
        c.on_frame(true, 800.0, 0.0, bounds, &mut out);
        out.clear();
        // Range is [200, 1200]; 700 is halfway.
        c.update(700.0, &mut out);
        assert_eq!(out.len(), 1);
        assert!(close(out[0].offset.x, 0.0));
        assert!(close(out[0].offset.y, 0.0));

        out.clear();
        c.update(1200.0, &mut out);
        assert!(close(out[0].offset.x, -100.0));
    }

    #[test]
    fn reduced_motion_tears_down_and_restores() {
        let mut c = ParallaxController::new(ParallaxOptions::standard());
        c.add(1_u32, 0.5, Axis::Vertical);
        c.add(2_u32, 1.5, Axis::Horizontal);
        c.mount();
        let mut out = Vec::new();
        c.on_frame(true, 800.0, 0.0, bounds, &mut out);

        out.clear();
        c.set_enabled(false, 800.0, 0.0, bounds, &mut out);
        assert!(!c.is_live());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| o.offset == Vec2::ZERO));

        out.clear();
        c.update(700.0, &mut out);
        assert!(out.is_empty(), "no trigger survives teardown");

        c.set_enabled(true, 800.0, 0.0, bounds, &mut out);
        assert!(c.is_live());
        assert_eq!(out.len(), 2, "initial offsets are re-applied");
    }

    #[test]
    fn mounting_under_reduced_motion_waits_for_it_to_clear() {
        let mut c = ParallaxController::single(3_u32);
        let mut out = Vec::new();
        c.mount();
        c.on_frame(false, 800.0, 0.0, bounds, &mut out);
        assert!(!c.is_live());
        assert!(out.is_empty());
        c.set_enabled(true, 800.0, 0.0, bounds, &mut out);
        assert!(c.is_live());
    }

    #[test]
    fn elements_without_bounds_are_skipped() {
        let mut c = ParallaxController::new(ParallaxOptions::standard());
        c.add(1_u32, 1.0, Axis::Vertical);
        c.add(2_u32, 1.0, Axis::Vertical);
        c.mount();
        let mut out = Vec::new();
        c.on_frame(
            true,
            800.0,
            0.0,
            |k| if *k == 1 { bounds(k) } else { None },
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, 1);
    }

    #[test]
    fn unmount_stops_updates() {
        let mut c = ParallaxController::single(1_u32);
        let mut out = Vec::new();
        c.mount();
        c.on_frame(true, 800.0, 0.0, bounds, &mut out);
        c.unmount();
        out.clear();
        c.update(500.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn progress_transforms_match_their_curves() {
        let t = ProgressTransforms::from_progress(0.25);
        assert!(close(t.opacity, 0.5));
        assert!(close(t.fade_out, 1.0));
        assert!(close(t.translate_y, -25.0));
        assert!(close(t.scale, 0.85));

        let t = ProgressTransforms::from_progress(0.75);
        assert!(close(t.opacity, 1.0));
        assert!(close(t.fade_out, 0.5));
        assert!(close(t.translate_y, 25.0));

        let t = ProgressTransforms::from_progress(1.0);
        assert!(close(t.opacity, 1.0));
        assert!(close(t.fade_out, 0.0));
        assert!(close(t.translate_y, 50.0));
    }
}
