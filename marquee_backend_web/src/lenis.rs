// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding for the global `Lenis` smooth-scroll class.
//!
//! The page loads Lenis as a script; this module only constructs it with
//! [`SmoothScrollOptions`], subscribes to its `scroll` event and exposes it as
//! a [`ScrollEngine`]. The engine is clocked from the frame loop through
//! `raf`, never by Lenis' own `autoRaf`.

use js_sys::{Object, Reflect};
use marquee_core::bridge::{ScrollEngine, ScrollTarget, ScrollToOptions, SmoothScrollOptions};
use marquee_core::scroll::ScrollMetrics;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::JsFailure;

#[wasm_bindgen]
extern "C" {
    type Lenis;

    #[wasm_bindgen(constructor, catch)]
    fn new(options: &JsValue) -> Result<Lenis, JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &Lenis, event: &str, callback: &JsValue);

    #[wasm_bindgen(method)]
    fn raf(this: &Lenis, time_ms: f64);

    #[wasm_bindgen(method, js_name = "scrollTo")]
    fn scroll_to(this: &Lenis, target: &JsValue, options: &JsValue);

    #[wasm_bindgen(method)]
    fn start(this: &Lenis);

    #[wasm_bindgen(method)]
    fn stop(this: &Lenis);

    #[wasm_bindgen(method)]
    fn destroy(this: &Lenis);
}

/// A constructed Lenis instance.
pub struct LenisEngine {
    lenis: Lenis,
    _easing: Closure<dyn Fn(f64) -> f64>,
    _on_scroll: Closure<dyn FnMut(JsValue)>,
}

impl LenisEngine {
    /// Constructs Lenis and forwards every scroll event to `on_scroll`.
    ///
    /// Viewport and document heights are read alongside the offset so the
    /// callback always sees a consistent triple.
    pub fn new(
        options: &SmoothScrollOptions,
        mut on_scroll: impl FnMut(ScrollMetrics) + 'static,
    ) -> Result<Self, JsFailure> {
        let easing_fn = options.easing;
        let easing = Closure::wrap(Box::new(move |t: f64| easing_fn(t)) as Box<dyn Fn(f64) -> f64>);

        let init = Object::new();
        set(&init, "duration", &options.duration.as_secs().into())?;
        set(&init, "easing", easing.as_ref())?;
        set(&init, "orientation", &options.orientation.as_str().into())?;
        set(
            &init,
            "gestureOrientation",
            &options.gesture_orientation.as_str().into(),
        )?;
        set(&init, "smoothWheel", &options.smooth_wheel.into())?;
        set(&init, "touchMultiplier", &options.touch_multiplier.into())?;
        set(&init, "infinite", &options.infinite.into())?;
        set(&init, "autoRaf", &false.into())?;
        let lenis = Lenis::new(&init)?;

        let window = crate::window()?;
        let on_scroll = Closure::wrap(Box::new(move |event: JsValue| {
            let scroll_y = Reflect::get(&event, &"scroll".into())
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            on_scroll(crate::dom::page_metrics(&window, scroll_y));
        }) as Box<dyn FnMut(JsValue)>);
        lenis.on("scroll", on_scroll.as_ref());

        Ok(Self {
            lenis,
            _easing: easing,
            _on_scroll: on_scroll,
        })
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), JsFailure> {
    Reflect::set(target, &key.into(), value)?;
    Ok(())
}

fn scroll_to_init(options: &ScrollToOptions) -> Result<Object, JsFailure> {
    let init = Object::new();
    set(&init, "offset", &options.offset.into())?;
    if let Some(duration) = options.duration {
        set(&init, "duration", &duration.as_secs().into())?;
    }
    set(&init, "immediate", &options.immediate.into())?;
    set(&init, "lock", &options.lock.into())?;
    Ok(init)
}

impl ScrollEngine for LenisEngine {
    fn start(&mut self) {
        self.lenis.start();
    }

    fn stop(&mut self) {
        self.lenis.stop();
    }

    fn destroy(&mut self) {
        self.lenis.destroy();
    }

    fn scroll_to(&mut self, target: ScrollTarget<'_>, options: &ScrollToOptions) {
        let target = match target {
            ScrollTarget::Offset(y) => JsValue::from_f64(y),
            ScrollTarget::Selector(selector) => JsValue::from_str(selector),
        };
        // Reflect::set on a fresh plain object cannot fail.
        if let Ok(init) = scroll_to_init(options) {
            self.lenis.scroll_to(&target, &init);
        }
    }

    fn raf(&mut self, time_ms: f64) {
        self.lenis.raf(time_ms);
    }
}

impl core::fmt::Debug for LenisEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LenisEngine").finish_non_exhaustive()
    }
}
