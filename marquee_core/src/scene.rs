// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene state machine and effect gates.
//!
//! A page is split into a fixed, ordered set of [`SceneId`]s. The
//! [`SceneManager`] keeps exactly one of them "current" and moves between them
//! with a two-phase choreography:
//!
//! ```text
//!   transition_to(target)
//!        │  previous = current, transitioning = true
//!        ▼
//!   ── exit delay (150ms) ──► current = target, target loaded
//!        │
//!        ▼
//!   ── enter delay (300ms) ─► transitioning = false
//! ```
//!
//! The delays are fixed, not measured. While a transition is in flight every
//! further request is ignored, so at most one transition exists at a time.
//! Deadlines are checked in [`SceneManager::tick`], which the frame loop calls
//! once per frame.
//!
//! [`EffectGates`] combine capability and performance readings into
//! per-effect on/off decisions.

use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;

use crate::capability::CapabilitySnapshot;
use crate::error::ParseError;
use crate::performance::PerformanceSnapshot;
use crate::time::{Duration, HostTime};
use crate::trace::{SceneTransitionEvent, Tracer, TransitionPhase};

/// One top-level content section of the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneId {
    /// Landing section.
    Hero,
    /// Bio and education.
    About,
    /// Technology overview.
    Skills,
    /// Project showcase.
    Projects,
    /// Work history.
    Experience,
    /// Contact details.
    Contact,
}

impl SceneId {
    /// Every scene in page order.
    pub const ALL: [Self; 6] = [
        Self::Hero,
        Self::About,
        Self::Skills,
        Self::Projects,
        Self::Experience,
        Self::Contact,
    ];

    /// Position in page order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The scene at `index` in page order.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The DOM id of the section element.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::About => "about",
            Self::Skills => "skills",
            Self::Projects => "projects",
            Self::Experience => "experience",
            Self::Contact => "contact",
        }
    }

    /// The scene before this one, if any.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// The scene after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SceneId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scene| scene.as_str() == s)
            .ok_or_else(|| ParseError::UnknownScene(s.to_string()))
    }
}

/// A set of scenes, stored as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SceneSet(u8);

impl SceneSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// A set holding only `scene`.
    #[must_use]
    pub const fn only(scene: SceneId) -> Self {
        Self(1 << scene as u8)
    }

    /// Returns `true` if `scene` is in the set.
    #[must_use]
    pub const fn contains(self, scene: SceneId) -> bool {
        self.0 & (1 << scene as u8) != 0
    }

    /// Adds `scene`; returns `true` if it was not present.
    pub fn insert(&mut self, scene: SceneId) -> bool {
        let added = !self.contains(scene);
        self.0 |= 1 << scene as u8;
        added
    }

    /// Removes `scene`; returns `true` if it was present.
    pub fn remove(&mut self, scene: SceneId) -> bool {
        let removed = self.contains(scene);
        self.0 &= !(1 << scene as u8);
        removed
    }

    /// Number of scenes in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates members in page order.
    pub fn iter(self) -> impl Iterator<Item = SceneId> {
        SceneId::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl fmt::Debug for SceneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<SceneId> for SceneSet {
    fn from_iter<I: IntoIterator<Item = SceneId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for scene in iter {
            set.insert(scene);
        }
        set
    }
}

/// Fixed choreography delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneTimings {
    /// Time given to the outgoing scene's exit animation.
    pub exit: Duration,
    /// Time given to the incoming scene's enter animation.
    pub enter: Duration,
}

impl SceneTimings {
    /// 150ms exit, 300ms enter.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            exit: Duration::from_millis_u64(150),
            enter: Duration::from_millis_u64(300),
        }
    }
}

impl Default for SceneTimings {
    fn default() -> Self {
        Self::standard()
    }
}

/// Read-only view of the scene state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneState {
    /// The scene considered active.
    pub current: SceneId,
    /// The scene left by the latest transition.
    pub previous: Option<SceneId>,
    /// A transition is in flight.
    pub is_transitioning: bool,
    /// Scenes whose content has been loaded; always contains `current`.
    pub loaded_scenes: SceneSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Exiting { target: SceneId, until: HostTime },
    Entering { until: HostTime },
}

/// Owner of the single scene state machine.
#[derive(Clone, Debug)]
pub struct SceneManager {
    current: SceneId,
    previous: Option<SceneId>,
    loaded: SceneSet,
    phase: Phase,
    timings: SceneTimings,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(SceneTimings::standard())
    }
}

impl SceneManager {
    /// Starts at [`SceneId::Hero`] with only the hero loaded.
    #[must_use]
    pub fn new(timings: SceneTimings) -> Self {
        Self {
            current: SceneId::Hero,
            previous: None,
            loaded: SceneSet::only(SceneId::Hero),
            phase: Phase::Idle,
            timings,
        }
    }

    /// Returns a copy of the observable state.
    #[must_use]
    pub fn state(&self) -> SceneState {
        SceneState {
            current: self.current,
            previous: self.previous,
            is_transitioning: self.is_transitioning(),
            loaded_scenes: self.loaded,
        }
    }

    /// The current scene.
    #[must_use]
    pub fn current(&self) -> SceneId {
        self.current
    }

    /// Returns `true` while a transition is in flight.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Requests a transition to `target`.
    ///
    /// Ignored (returns `false`) if `target` is already current or another
    /// transition is in flight.
    pub fn transition_to(
        &mut self,
        target: SceneId,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if target == self.current || self.is_transitioning() {
            return false;
        }
        self.previous = Some(self.current);
        self.phase = Phase::Exiting {
            target,
            until: now + self.timings.exit,
        };
        tracer.scene_transition(&SceneTransitionEvent {
            at: now,
            phase: TransitionPhase::Begin,
            from: self.current,
            to: target,
        });
        true
    }

    /// Advances the choreography to `now`.
    pub fn tick(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        if let Phase::Exiting { target, until } = self.phase
            && now >= until
        {
            let from = self.current;
            self.current = target;
            self.loaded.insert(target);
            self.phase = Phase::Entering {
                until: now + self.timings.enter,
            };
            tracer.scene_transition(&SceneTransitionEvent {
                at: now,
                phase: TransitionPhase::Commit,
                from,
                to: target,
            });
        }

        if let Phase::Entering { until } = self.phase
            && now >= until
        {
            self.phase = Phase::Idle;
            tracer.scene_transition(&SceneTransitionEvent {
                at: now,
                phase: TransitionPhase::Settle,
                from: self.previous.unwrap_or(self.current),
                to: self.current,
            });
        }
    }

    /// Marks the neighbours of `scene` in page order as loaded.
    ///
    /// Does not change `current`.
    pub fn preload_adjacent(&mut self, scene: SceneId) {
        for neighbour in [scene.previous(), scene.next()].into_iter().flatten() {
            self.loaded.insert(neighbour);
        }
    }

    /// Drops `scene` from the loaded set unless it is current.
    ///
    /// Returns `true` if the scene was removed.
    pub fn unload(&mut self, scene: SceneId) -> bool {
        if scene == self.current {
            return false;
        }
        self.loaded.remove(scene)
    }

    /// Reacts to the scroll store's active section changing.
    ///
    /// Ids that do not name a scene are ignored.
    pub fn on_active_section(&mut self, section: &str, now: HostTime, tracer: &mut Tracer<'_>) {
        let Ok(scene) = section.parse::<SceneId>() else {
            return;
        };
        if scene == self.current {
            return;
        }
        self.transition_to(scene, now, tracer);
        self.preload_adjacent(scene);
    }
}

/// Frame rate below which scenes are disabled outright.
pub const SCENE_MIN_FPS: u32 = 20;

/// Per-effect enable decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EffectGates {
    /// Scroll-driven scene choreography.
    pub scenes: bool,
    /// Vector state-machine animations.
    pub rive: bool,
    /// WebGL particle fields.
    pub particles: bool,
    /// The falling-code backdrop.
    pub code_matrix: bool,
}

impl EffectGates {
    /// Combines the latest readings.
    ///
    /// A missing performance reading, or one whose `fps` is zero, counts as
    /// "not yet measured" and does not block scenes.
    #[must_use]
    pub fn evaluate(
        capability: &CapabilitySnapshot,
        performance: Option<&PerformanceSnapshot>,
    ) -> Self {
        let measured_fps = performance.map(|p| p.fps).filter(|&fps| fps > 0);
        let low_performance = performance.is_some_and(|p| p.is_low_performance);
        let motion = !capability.prefers_reduced_motion;
        let desktop = !capability.is_mobile;

        Self {
            scenes: desktop && measured_fps.is_none_or(|fps| fps >= SCENE_MIN_FPS),
            rive: !capability.is_low_power_mode && motion && !low_performance,
            particles: desktop && capability.supports_webgl && motion,
            code_matrix: desktop && motion && !low_performance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::SamplerConfig;

    fn ms(v: u64) -> HostTime {
        HostTime(v * 1000)
    }

    #[test]
    fn full_transition_choreography() {
        let mut m = SceneManager::default();
        let mut t = Tracer::none();
        assert!(m.transition_to(SceneId::About, ms(0), &mut t));
        assert!(m.is_transitioning());
        assert_eq!(m.current(), SceneId::Hero, "exit phase keeps current");

        m.tick(ms(149), &mut t);
        assert_eq!(m.current(), SceneId::Hero);

        m.tick(ms(150), &mut t);
        assert_eq!(m.current(), SceneId::About);
        assert!(m.state().loaded_scenes.contains(SceneId::About));
        assert!(m.is_transitioning());

        m.tick(ms(449), &mut t);
        assert!(m.is_transitioning());
        m.tick(ms(450), &mut t);
        let state = m.state();
        assert!(!state.is_transitioning);
        assert_eq!(state.previous, Some(SceneId::Hero));
    }

    #[test]
    fn overlapping_requests_yield_one_transition() {
        let mut m = SceneManager::default();
        let mut t = Tracer::none();
        assert!(m.transition_to(SceneId::About, ms(0), &mut t));
        assert!(!m.transition_to(SceneId::About, ms(10), &mut t));
        assert!(!m.transition_to(SceneId::Contact, ms(20), &mut t));
        m.tick(ms(1000), &mut t);
        m.tick(ms(2000), &mut t);
        assert_eq!(m.current(), SceneId::About);
        assert_eq!(m.state().previous, Some(SceneId::Hero));
    }

    #[test]
    fn transition_to_current_is_noop() {
        let mut m = SceneManager::default();
        assert!(!m.transition_to(SceneId::Hero, ms(0), &mut Tracer::none()));
        assert!(!m.is_transitioning());
    }

    #[test]
    fn preload_marks_neighbours_only() {
        let mut m = SceneManager::default();
        m.preload_adjacent(SceneId::Projects);
        let loaded = m.state().loaded_scenes;
        let expected: SceneSet = [SceneId::Hero, SceneId::Skills, SceneId::Experience]
            .into_iter()
            .collect();
        assert_eq!(loaded, expected);
        assert_eq!(m.current(), SceneId::Hero);
    }

    #[test]
    fn preload_at_the_ends() {
        let mut m = SceneManager::default();
        m.preload_adjacent(SceneId::Contact);
        assert!(m.state().loaded_scenes.contains(SceneId::Experience));
        assert_eq!(m.state().loaded_scenes.len(), 2);
    }

    #[test]
    fn current_can_never_be_unloaded() {
        let mut m = SceneManager::default();
        m.preload_adjacent(SceneId::Hero);
        assert!(!m.unload(SceneId::Hero));
        assert!(m.unload(SceneId::About));
        assert!(!m.unload(SceneId::About));
        assert_eq!(m.state().loaded_scenes, SceneSet::only(SceneId::Hero));
    }

    #[test]
    fn active_section_drives_transition_and_preload() {
        let mut m = SceneManager::default();
        let mut t = Tracer::none();
        m.on_active_section("skills", ms(0), &mut t);
        assert!(m.is_transitioning());
        let loaded = m.state().loaded_scenes;
        assert!(loaded.contains(SceneId::About));
        assert!(loaded.contains(SceneId::Projects));

        m.on_active_section("footer", ms(10), &mut t);
        m.tick(ms(500), &mut t);
        m.tick(ms(900), &mut t);
        assert_eq!(m.current(), SceneId::Skills);
    }

    #[test]
    fn scene_ids_round_trip_through_strings() {
        for scene in SceneId::ALL {
            assert_eq!(scene.as_str().parse::<SceneId>(), Ok(scene));
        }
        assert!("Hero".parse::<SceneId>().is_err());
    }

    #[test]
    fn scenes_gate_fails_open_without_fps() {
        let cap = CapabilitySnapshot::default();
        assert!(EffectGates::evaluate(&cap, None).scenes);

        let mut perf = PerformanceSnapshot::nominal(&SamplerConfig::web());
        perf.fps = 0;
        assert!(EffectGates::evaluate(&cap, Some(&perf)).scenes);

        perf.fps = 19;
        assert!(!EffectGates::evaluate(&cap, Some(&perf)).scenes);
        perf.fps = 20;
        assert!(EffectGates::evaluate(&cap, Some(&perf)).scenes);

        let mobile = CapabilitySnapshot {
            is_mobile: true,
            ..cap
        };
        assert!(!EffectGates::evaluate(&mobile, None).scenes);
    }

    #[test]
    fn effect_gates_combine_flags() {
        let cap = CapabilitySnapshot {
            supports_webgl: true,
            ..CapabilitySnapshot::default()
        };
        let mut perf = PerformanceSnapshot::nominal(&SamplerConfig::web());
        let gates = EffectGates::evaluate(&cap, Some(&perf));
        assert!(gates.rive && gates.particles && gates.code_matrix);

        perf.is_low_performance = true;
        let gates = EffectGates::evaluate(&cap, Some(&perf));
        assert!(!gates.rive);
        assert!(!gates.code_matrix);
        assert!(gates.particles, "particles ignore performance");

        let low_power = CapabilitySnapshot {
            is_low_power_mode: true,
            ..cap
        };
        assert!(!EffectGates::evaluate(&low_power, None).rive);
    }
}
