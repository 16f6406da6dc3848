// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Smooth-scroll bridge.
//!
//! An inertial scroll engine is consumed through the [`ScrollEngine`] trait:
//! it accepts lifecycle and scroll-to commands and is clocked by the frame
//! ticker. [`ScrollBridge`] owns the engine, hands every scroll event to the
//! [`MotionContext`] (one [`ScrollStore`](crate::scroll::ScrollStore) write,
//! then the section triggers), and forwards ticker time.
//!
//! Views that only want to issue commands ask for [`ScrollControls`]. When no
//! bridge is available they get inert stand-ins and a warning diagnostic
//! instead of a failure.

use crate::context::MotionContext;
use crate::scroll::ScrollMetrics;
use crate::time::{Duration, HostTime};
use crate::trace::Tracer;

/// Exponential ease-out that reaches 1 slightly before `t = 1`.
#[must_use]
pub fn expo_out(t: f64) -> f64 {
    (1.001 - libm::pow(2.0, -10.0 * t)).min(1.0)
}

/// Scroll direction handled by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Vertical scrolling.
    #[default]
    Vertical,
    /// Horizontal scrolling.
    Horizontal,
}

impl Orientation {
    /// The engine's option string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

/// Engine construction options.
#[derive(Clone, Copy, Debug)]
pub struct SmoothScrollOptions {
    /// Duration of a scroll animation.
    pub duration: Duration,
    /// Easing applied over `duration`.
    pub easing: fn(f64) -> f64,
    /// Content scroll axis.
    pub orientation: Orientation,
    /// Gesture axis.
    pub gesture_orientation: Orientation,
    /// Smooth mouse-wheel input.
    pub smooth_wheel: bool,
    /// Touch delta multiplier.
    pub touch_multiplier: f64,
    /// Wrap around at the ends.
    pub infinite: bool,
}

impl SmoothScrollOptions {
    /// 1.2s exponential ease-out, vertical, smooth wheel, 2x touch.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            duration: Duration::from_millis_u64(1200),
            easing: expo_out,
            orientation: Orientation::Vertical,
            gesture_orientation: Orientation::Vertical,
            smooth_wheel: true,
            touch_multiplier: 2.0,
            infinite: false,
        }
    }
}

impl Default for SmoothScrollOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Destination of a programmatic scroll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollTarget<'a> {
    /// Absolute document offset.
    Offset(f64),
    /// First element matching a CSS selector, e.g. `"#about"`.
    Selector(&'a str),
}

/// Per-call overrides for [`ScrollEngine::scroll_to`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScrollToOptions {
    /// Pixels added to the resolved target.
    pub offset: f64,
    /// Overrides the engine duration.
    pub duration: Option<Duration>,
    /// Jump without animating.
    pub immediate: bool,
    /// Ignore user input until the scroll completes.
    pub lock: bool,
}

/// An inertial scroll engine.
pub trait ScrollEngine {
    /// Resumes reacting to input.
    fn start(&mut self);
    /// Stops reacting to input.
    fn stop(&mut self);
    /// Releases listeners; the engine is unusable afterwards.
    fn destroy(&mut self);
    /// Animates to `target`.
    fn scroll_to(&mut self, target: ScrollTarget<'_>, options: &ScrollToOptions);
    /// Advances the engine clock to `time_ms`.
    fn raf(&mut self, time_ms: f64);
}

/// Owner of the engine for the lifetime of the page.
#[derive(Debug)]
pub struct ScrollBridge<E: ScrollEngine> {
    engine: E,
    destroyed: bool,
}

impl<E: ScrollEngine> ScrollBridge<E> {
    /// Wraps a constructed engine.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            destroyed: false,
        }
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Feeds one engine scroll event to `context`.
    ///
    /// Offset and both heights are written together. Returns `false` once
    /// the bridge is destroyed, when late events are dropped.
    pub fn on_scroll(
        &self,
        metrics: ScrollMetrics,
        context: &mut MotionContext,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.destroyed {
            return false;
        }
        context.on_scroll(metrics, now, tracer);
        true
    }

    /// Forwards a ticker reading in seconds.
    pub fn on_ticker(&mut self, time_secs: f64) {
        if !self.destroyed {
            self.engine.raf(time_secs * 1000.0);
        }
    }

    /// Forwards frame time.
    pub fn tick(&mut self, now: HostTime) {
        self.on_ticker(now.as_millis() / 1000.0);
    }

    /// Command handle backed by this bridge.
    pub fn controls(&mut self) -> ScrollControls<'_> {
        ScrollControls {
            engine: (!self.destroyed).then_some(&mut self.engine as &mut dyn ScrollEngine),
        }
    }

    /// Destroys the engine. Idempotent.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.engine.destroy();
        }
    }

    /// Returns `true` once [`destroy`](Self::destroy) ran.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<E: ScrollEngine> Drop for ScrollBridge<E> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Scroll commands for views, possibly inert.
pub struct ScrollControls<'a> {
    engine: Option<&'a mut dyn ScrollEngine>,
}

impl core::fmt::Debug for ScrollControls<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScrollControls")
            .field("inert", &self.engine.is_none())
            .finish()
    }
}

impl<'a> ScrollControls<'a> {
    /// Controls from an optional bridge.
    ///
    /// Without one, every command is a no-op and a warning is traced.
    pub fn resolve<E: ScrollEngine>(
        bridge: Option<&'a mut ScrollBridge<E>>,
        tracer: &mut Tracer<'_>,
    ) -> Self {
        match bridge {
            Some(bridge) => bridge.controls(),
            None => {
                tracer.warn(
                    "scroll",
                    "scroll controls requested without a smooth-scroll provider; commands are ignored",
                );
                Self::inert()
            }
        }
    }

    /// Controls that ignore every command.
    #[must_use]
    pub fn inert() -> Self {
        Self { engine: None }
    }

    /// Returns `true` if commands are ignored.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.engine.is_none()
    }

    /// See [`ScrollEngine::scroll_to`].
    pub fn scroll_to(&mut self, target: ScrollTarget<'_>, options: &ScrollToOptions) {
        if let Some(engine) = &mut self.engine {
            engine.scroll_to(target, options);
        }
    }

    /// See [`ScrollEngine::stop`].
    pub fn stop(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.stop();
        }
    }

    /// See [`ScrollEngine::start`].
    pub fn start(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.start();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MotionConfig;
    use crate::trace::{DiagnosticEvent, DiagnosticLevel, TraceSink};
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    #[derive(Debug, Default)]
    struct FakeEngine {
        calls: Vec<String>,
    }

    impl ScrollEngine for FakeEngine {
        fn start(&mut self) {
            self.calls.push("start".into());
        }
        fn stop(&mut self) {
            self.calls.push("stop".into());
        }
        fn destroy(&mut self) {
            self.calls.push("destroy".into());
        }
        fn scroll_to(&mut self, target: ScrollTarget<'_>, _: &ScrollToOptions) {
            self.calls.push(alloc::format!("scroll_to {target:?}"));
        }
        fn raf(&mut self, time_ms: f64) {
            self.calls.push(alloc::format!("raf {time_ms}"));
        }
    }

    #[test]
    fn easing_saturates_at_one() {
        assert!(expo_out(0.0).abs() < 0.002);
        assert!((expo_out(1.0) - 1.0).abs() < 1e-12);
        assert!(expo_out(0.5) > 0.9);
    }

    fn page(scroll_y: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_y,
            viewport_height: 800.0,
            document_height: 2000.0,
        }
    }

    #[test]
    fn scroll_events_write_all_metrics_at_once() {
        let bridge = ScrollBridge::new(FakeEngine::default());
        let mut cx = MotionContext::new(MotionConfig::web()).unwrap();
        assert!(bridge.on_scroll(page(600.0), &mut cx, HostTime(0), &mut Tracer::none()));
        assert!((cx.scroll().normalized_progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn late_events_after_destroy_are_dropped() {
        let mut bridge = ScrollBridge::new(FakeEngine::default());
        let mut cx = MotionContext::new(MotionConfig::web()).unwrap();
        bridge.destroy();
        assert!(!bridge.on_scroll(page(600.0), &mut cx, HostTime(0), &mut Tracer::none()));
        assert_eq!(cx.scroll().scroll_y(), 0.0);
    }

    #[test]
    fn ticker_seconds_become_milliseconds() {
        let mut bridge = ScrollBridge::new(FakeEngine::default());
        bridge.on_ticker(1.5);
        bridge.tick(HostTime(250_000));
        assert_eq!(bridge.engine().calls, ["raf 1500", "raf 250"]);
    }

    #[test]
    fn controls_forward_commands() {
        let mut bridge = ScrollBridge::new(FakeEngine::default());
        let mut controls = ScrollControls::resolve(Some(&mut bridge), &mut Tracer::none());
        assert!(!controls.is_inert());
        controls.stop();
        controls.scroll_to(ScrollTarget::Selector("#about"), &ScrollToOptions::default());
        controls.start();
        assert_eq!(
            bridge.engine().calls,
            ["stop", "scroll_to Selector(\"#about\")", "start"]
        );
    }

    #[test]
    fn missing_provider_degrades_with_a_warning() {
        #[derive(Default)]
        struct Warnings(Vec<String>);
        impl TraceSink for Warnings {
            fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
                assert_eq!(e.level, DiagnosticLevel::Warn);
                self.0.push(e.message.to_string());
            }
        }

        let mut sink = Warnings::default();
        let mut controls =
            ScrollControls::resolve::<FakeEngine>(None, &mut Tracer::new(&mut sink));
        assert!(controls.is_inert());
        controls.scroll_to(ScrollTarget::Offset(0.0), &ScrollToOptions::default());
        controls.stop();
        controls.start();
        assert_eq!(sink.0.len(), 1);
    }

    #[test]
    fn destroy_is_idempotent_and_silences_the_engine() {
        let mut bridge = ScrollBridge::new(FakeEngine::default());
        bridge.destroy();
        bridge.destroy();
        bridge.on_ticker(1.0);
        assert!(bridge.controls().is_inert());
        assert_eq!(bridge.engine().calls, ["destroy"]);
    }
}
