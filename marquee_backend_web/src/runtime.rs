// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The assembled browser runtime.
//!
//! [`MotionRuntime`] owns one [`MotionContext`] behind `Rc<RefCell<_>>` and
//! every browser subscription feeding it:
//!
//! ```text
//!   matchMedia ─┐
//!   probes ─────┼─► MotionContext ◄── ScrollBridge ◄── Lenis `scroll` ◄──┐
//!   observers ──┘        ▲    ▲                                          │
//!   window `scroll` ─────┼────┘ (without Lenis)                          │
//!                        └───────────────── FrameLoop ───────────────────┘
//! ```
//!
//! Callbacks hold weak references and skip the event if the shared state is
//! already borrowed, so re-entrant browser events can never panic. The one
//! exception is Lenis `scroll`, which fires from inside `raf` while the bridge
//! is borrowed: its latest metrics are parked and delivered as soon as both
//! are free. Dropping the runtime tears everything down.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use marquee_core::bridge::{ScrollBridge, ScrollControls, SmoothScrollOptions};
use marquee_core::capability::{
    CapabilitySignal, MOBILE_MEDIA_QUERY, REDUCED_MOTION_MEDIA_QUERY,
};
use marquee_core::context::{MotionConfig, MotionContext};
use marquee_core::parallax::{ParallaxController, ParallaxOffset};
use marquee_core::reveal::{RevealGroup, RevealOptions};
use marquee_core::scene::EffectGates;
use marquee_core::scroll::{DocumentProgress, ScrollMetrics, ThrottleOutcome};
use marquee_core::section::IntersectionSample;
use marquee_core::time::{Duration, HostTime};
use marquee_core::trace::Tracer;
use marquee_core::trigger::TriggerId;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast as _;
use web_sys::{Element, Event, HtmlElement, Window};

use crate::dom;
use crate::{
    ConsoleSink, FrameLoop, IntersectionWatch, JsFailure, LenisEngine, MediaQueryWatch,
    ObservedEntry, ObserverOptions, Unobserver, probe,
};

struct RevealBinding {
    group: RevealGroup,
    elements: Vec<HtmlElement>,
    unobserver: Unobserver,
}

impl RevealBinding {
    fn apply(&self, index: usize) {
        if let Some(element) = self.elements.get(index) {
            dom::apply_reveal(element, self.group.is_item_visible(index));
        }
    }

    fn observe(&mut self, entry: &ObservedEntry<'_>, now: HostTime) {
        let Some(index) = entry.target else {
            return;
        };
        if self.group.observe(index, entry.sample.is_intersecting, now) {
            self.apply(index);
        }
        if !self.group.is_observing(index)
            && let Some(element) = self.elements.get(index)
        {
            self.unobserver.unobserve(element);
        }
    }
}

struct Shared {
    window: Window,
    context: MotionContext,
    sink: ConsoleSink,
    parallax: Vec<ParallaxController<HtmlElement>>,
    offsets: Vec<ParallaxOffset<HtmlElement>>,
    sections: Vec<(TriggerId, Element)>,
    reveals: Vec<RevealBinding>,
    progress: DocumentProgress,
    engine_driven: bool,
}

impl Shared {
    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    fn on_frame(&mut self, now: HostTime) {
        if self.progress.is_frame_pending() {
            let window = &self.window;
            if self.progress.on_frame(now, || dom::window_metrics(window)) == ThrottleOutcome::Applied
            {
                self.on_native_metrics(now);
            }
        }
        self.context.on_frame(now, &mut Tracer::new(&mut self.sink));

        let enabled = self.context.parallax_enabled();
        let viewport_height = self.viewport_height();
        let scroll_y = self.context.scroll().scroll_y();
        for controller in &mut self.parallax {
            controller.on_frame(
                enabled,
                viewport_height,
                scroll_y,
                |el| Some(dom::element_bounds(el, scroll_y)),
                &mut self.offsets,
            );
            controller.advance(now, &mut self.offsets);
        }
        self.flush_offsets();

        for binding in &mut self.reveals {
            if binding.group.tick(now) {
                for index in 0..binding.group.len() {
                    binding.apply(index);
                }
            }
        }
    }

    /// A Lenis scroll event, routed through the bridge.
    fn on_engine_scroll(
        &mut self,
        bridge: &ScrollBridge<LenisEngine>,
        metrics: ScrollMetrics,
        now: HostTime,
    ) {
        if bridge.on_scroll(metrics, &mut self.context, now, &mut Tracer::new(&mut self.sink)) {
            self.update_parallax(metrics.scroll_y);
        }
    }

    /// A window `scroll` or `resize` event, throttled.
    fn on_native_event(&mut self, now: HostTime) {
        let window = &self.window;
        if self.progress.offer(now, || dom::window_metrics(window)) == ThrottleOutcome::Applied {
            self.on_native_metrics(now);
        }
    }

    fn on_native_metrics(&mut self, now: HostTime) {
        if self.engine_driven {
            return;
        }
        let metrics = *self.progress.metrics();
        self.context
            .on_scroll(metrics, now, &mut Tracer::new(&mut self.sink));
        self.update_parallax(metrics.scroll_y);
    }

    fn update_parallax(&mut self, scroll_y: f64) {
        for controller in &mut self.parallax {
            controller.update(scroll_y, &mut self.offsets);
        }
        self.flush_offsets();
    }

    fn on_capability(&mut self, signal: CapabilitySignal) {
        let Some(change) = self.context.apply_capability(signal) else {
            return;
        };
        if change.reduced_motion {
            let enabled = self.context.parallax_enabled();
            let viewport_height = self.viewport_height();
            let scroll_y = self.context.scroll().scroll_y();
            for controller in &mut self.parallax {
                controller.set_enabled(
                    enabled,
                    viewport_height,
                    scroll_y,
                    |el| Some(dom::element_bounds(el, scroll_y)),
                    &mut self.offsets,
                );
            }
            self.flush_offsets();
        }
    }

    fn on_sections(&mut self, batch: &[ObservedEntry<'_>], now: HostTime) {
        let samples: Vec<IntersectionSample<'_>> = batch.iter().map(|e| e.sample).collect();
        self.context
            .observe_sections(&samples, now, &mut Tracer::new(&mut self.sink));
    }

    fn on_reveal(&mut self, binding: usize, batch: &[ObservedEntry<'_>], now: HostTime) {
        let Some(binding) = self.reveals.get_mut(binding) else {
            return;
        };
        for entry in batch {
            binding.observe(entry, now);
        }
    }

    fn refresh(&mut self) {
        let viewport_height = self.viewport_height();
        let scroll_y = self.context.scroll().scroll_y();
        let sections = &self.sections;
        self.context.refresh(viewport_height, |id| {
            sections
                .iter()
                .find(|(candidate, _)| *candidate == id)
                .map(|(_, el)| dom::element_bounds(el, scroll_y))
        });
        for controller in &mut self.parallax {
            controller.refresh(viewport_height, |el| {
                Some(dom::element_bounds(el, scroll_y))
            });
        }
    }

    fn flush_offsets(&mut self) {
        dom::apply_parallax(&self.offsets);
        self.offsets.clear();
    }
}

/// Runs `f` on the shared state unless it is gone or already borrowed.
fn with_shared(shared: &Weak<RefCell<Shared>>, f: impl FnOnce(&mut Shared)) {
    if let Some(cell) = shared.upgrade()
        && let Ok(mut state) = cell.try_borrow_mut()
    {
        f(&mut state);
    }
}

/// A DOM event subscription removed on drop.
struct Listener {
    target: web_sys::EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(
        target: &web_sys::EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsFailure> {
        let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

type SharedBridge = Rc<RefCell<Option<ScrollBridge<LenisEngine>>>>;

/// Delivers parked Lenis metrics once the bridge and the shared state are
/// both free; otherwise leaves them for the next attempt.
fn deliver_engine_scroll(
    parked: &Cell<Option<ScrollMetrics>>,
    bridge: &Weak<RefCell<Option<ScrollBridge<LenisEngine>>>>,
    shared: &Weak<RefCell<Shared>>,
) {
    let Some(metrics) = parked.take() else {
        return;
    };
    let delivered = bridge.upgrade().is_some_and(|cell| {
        let Ok(slot) = cell.try_borrow() else {
            return false;
        };
        let Some(bridge) = slot.as_ref() else {
            return true;
        };
        let mut delivered = false;
        with_shared(shared, |s| {
            s.on_engine_scroll(bridge, metrics, crate::now());
            delivered = true;
        });
        delivered
    });
    if !delivered && bridge.strong_count() > 0 {
        parked.set(Some(metrics));
    }
}

/// The motion layer of one page.
pub struct MotionRuntime {
    shared: Rc<RefCell<Shared>>,
    bridge: SharedBridge,
    frame_loop: FrameLoop,
    media: Vec<MediaQueryWatch>,
    observers: Vec<IntersectionWatch>,
    _resize: Listener,
    _scroll: Listener,
}

impl core::fmt::Debug for MotionRuntime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionRuntime")
            .field("frame_loop", &self.frame_loop)
            .field("media", &self.media)
            .field("observers", &self.observers.len())
            .field(
                "smooth_scroll",
                &self.bridge.try_borrow().map(|b| b.is_some()).ok(),
            )
            .finish_non_exhaustive()
    }
}

impl MotionRuntime {
    /// Probes the device, subscribes to media queries, window scrolls and
    /// resizes, creates the smooth-scroll engine (when `smooth_scroll` is
    /// given) and starts the frame loop.
    ///
    /// Without an engine, the window's own `scroll` events drive the context.
    pub fn start(
        config: MotionConfig,
        smooth_scroll: Option<SmoothScrollOptions>,
    ) -> Result<Self, JsFailure> {
        let window = crate::window()?;
        let document = crate::document(&window)?;

        let mut context = MotionContext::new(config).map_err(|e| JsFailure(e.to_string()))?;
        context.sampler_mut().set_memory_probe(probe::memory());
        context.sampler_mut().start_monitoring(crate::now());

        let shared = Rc::new(RefCell::new(Shared {
            window: window.clone(),
            context,
            sink: ConsoleSink::new(),
            parallax: Vec::new(),
            offsets: Vec::new(),
            sections: Vec::new(),
            reveals: Vec::new(),
            progress: DocumentProgress::default(),
            engine_driven: smooth_scroll.is_some(),
        }));
        let weak = Rc::downgrade(&shared);

        let media = vec![
            MediaQueryWatch::new(&window, MOBILE_MEDIA_QUERY, {
                let weak = weak.clone();
                move |is_mobile| {
                    with_shared(&weak, |s| {
                        s.on_capability(CapabilitySignal::Viewport { is_mobile });
                    });
                }
            })?,
            MediaQueryWatch::new(&window, REDUCED_MOTION_MEDIA_QUERY, {
                let weak = weak.clone();
                move |reduced| {
                    with_shared(&weak, |s| {
                        s.on_capability(CapabilitySignal::ReducedMotion(reduced));
                    });
                }
            })?,
        ];

        {
            let mut s = shared.borrow_mut();
            s.on_capability(probe::webgl(&document));
            s.on_capability(probe::pixel_ratio(&window));
        }
        let navigator = window.navigator();
        let battery_target = weak.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let signal = probe::battery(&navigator).await;
            with_shared(&battery_target, |s| s.on_capability(signal));
        });

        let bridge: SharedBridge = Rc::new(RefCell::new(None));
        let parked: Rc<Cell<Option<ScrollMetrics>>> = Rc::new(Cell::new(None));
        if let Some(options) = smooth_scroll {
            let parked = Rc::clone(&parked);
            let bridge_target = Rc::downgrade(&bridge);
            let scroll_target = weak.clone();
            let engine = LenisEngine::new(&options, move |metrics| {
                parked.set(Some(metrics));
                deliver_engine_scroll(&parked, &bridge_target, &scroll_target);
            })?;
            *bridge.borrow_mut() = Some(ScrollBridge::new(engine));
        }

        let frame_loop = FrameLoop::new({
            let weak = weak.clone();
            let bridge = Rc::downgrade(&bridge);
            move |now| {
                with_shared(&weak, |s| s.on_frame(now));
                if let Some(cell) = bridge.upgrade()
                    && let Ok(mut slot) = cell.try_borrow_mut()
                    && let Some(bridge) = slot.as_mut()
                {
                    bridge.tick(now);
                }
                // Lenis emits `scroll` synchronously from `raf`.
                deliver_engine_scroll(&parked, &bridge, &weak);
            }
        });
        frame_loop.start();

        shared.borrow_mut().on_native_event(crate::now());
        let scroll = Listener::new(&window, "scroll", {
            let weak = weak.clone();
            move |_| with_shared(&weak, |s| s.on_native_event(crate::now()))
        })?;
        let resize = Listener::new(&window, "resize", move |_| {
            with_shared(&weak, |s| {
                s.refresh();
                s.on_native_event(crate::now());
            });
        })?;

        Ok(Self {
            shared,
            bridge,
            frame_loop,
            media,
            observers: Vec::new(),
            _resize: resize,
            _scroll: scroll,
        })
    }

    /// Read access to the shared context.
    ///
    /// Do not hold the guard across calls back into the runtime.
    #[must_use]
    pub fn context(&self) -> Ref<'_, MotionContext> {
        Ref::map(self.shared.borrow(), |s| &s.context)
    }

    /// Current effect decisions.
    #[must_use]
    pub fn effect_gates(&self) -> EffectGates {
        self.context().effect_gates()
    }

    /// Page scroll progress as a whole percentage, from window `scroll` and
    /// `resize` events.
    #[must_use]
    pub fn document_progress(&self) -> u8 {
        self.shared.borrow().progress.percent()
    }

    /// Logs sampler, scene and trigger events at debug level as well.
    pub fn set_verbose(&self, verbose: bool) {
        self.shared.borrow_mut().sink = if verbose {
            ConsoleSink::verbose()
        } else {
            ConsoleSink::new()
        };
    }

    /// Tracks the sections with the given element ids.
    ///
    /// Each section gets a progress trigger and joins the active-section
    /// observer. Ids with no element are skipped.
    pub fn track_sections(&mut self, ids: &[&str]) -> Result<(), JsFailure> {
        let document = crate::document(&crate::window()?)?;
        let elements: Vec<Element> = ids
            .iter()
            .filter_map(|id| document.get_element_by_id(id))
            .collect();

        {
            let mut guard = self.shared.borrow_mut();
            let s = &mut *guard;
            let viewport_height = s.viewport_height();
            let scroll_y = s.context.scroll().scroll_y();
            for element in &elements {
                let id = s.context.add_section_trigger(
                    &element.id(),
                    dom::element_bounds(element, scroll_y),
                    viewport_height,
                );
                s.sections.push((id, element.clone()));
            }
            s.context
                .sync_section_triggers(crate::now(), &mut Tracer::new(&mut s.sink));
        }

        let weak = Rc::downgrade(&self.shared);
        let watch = IntersectionWatch::new(&ObserverOptions::sections(), move |batch| {
            with_shared(&weak, |s| s.on_sections(batch, crate::now()));
        })?;
        for element in &elements {
            watch.observe(element);
        }
        self.observers.push(watch);
        Ok(())
    }

    /// Binds a parallax controller; it attaches on the next frame.
    pub fn add_parallax(&self, mut controller: ParallaxController<HtmlElement>) {
        controller.mount();
        self.shared.borrow_mut().parallax.push(controller);
    }

    /// Reveals `elements` as they scroll into view, `stagger` apart.
    ///
    /// Observer entries are matched to elements by identity. Once-only items
    /// stop being observed as soon as they fire.
    pub fn reveal_group(
        &mut self,
        elements: Vec<HtmlElement>,
        options: RevealOptions,
        stagger: Duration,
    ) -> Result<(), JsFailure> {
        options.validate().map_err(|e| JsFailure(e.to_string()))?;
        for element in &elements {
            dom::apply_reveal(element, false);
        }

        let index = self.shared.borrow().reveals.len();
        let weak = Rc::downgrade(&self.shared);
        let watch = IntersectionWatch::new(&ObserverOptions::reveal(&options), move |batch| {
            with_shared(&weak, |s| s.on_reveal(index, batch, crate::now()));
        })?;
        self.shared.borrow_mut().reveals.push(RevealBinding {
            group: RevealGroup::new(elements.len(), options, stagger),
            elements: elements.clone(),
            unobserver: watch.unobserver(),
        });
        for element in &elements {
            watch.observe(element);
        }
        self.observers.push(watch);
        Ok(())
    }

    /// Runs `f` with the smooth-scroll controls.
    ///
    /// Without a smooth-scroll engine the controls are inert and a warning is
    /// logged.
    pub fn with_scroll_controls<R>(&self, f: impl FnOnce(&mut ScrollControls<'_>) -> R) -> R {
        let mut bridge = self.bridge.borrow_mut();
        let mut sink = ConsoleSink::new();
        let mut controls = ScrollControls::resolve(bridge.as_mut(), &mut Tracer::new(&mut sink));
        f(&mut controls)
    }

    /// Recomputes trigger ranges after a layout change that did not resize
    /// the window.
    pub fn refresh(&self) {
        self.shared.borrow_mut().refresh();
    }
}

impl Drop for MotionRuntime {
    fn drop(&mut self) {
        self.frame_loop.stop();
        if let Ok(mut s) = self.shared.try_borrow_mut() {
            s.context.sampler_mut().stop_monitoring();
            for controller in &mut s.parallax {
                controller.unmount();
            }
        }
        if let Ok(mut slot) = self.bridge.try_borrow_mut()
            && let Some(bridge) = slot.as_mut()
        {
            bridge.destroy();
        }
    }
}
