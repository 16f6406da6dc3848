// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot capability probes.
//!
//! Every probe degrades silently: a missing API or a thrown exception yields
//! the conservative reading instead of an error.

use js_sys::{Function, Promise, Reflect};
use marquee_core::capability::CapabilitySignal;
use marquee_core::performance::MemoryProbe;
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Navigator, Window};

/// Context names tried in order by [`webgl`].
pub const WEBGL_CONTEXTS: [&str; 2] = ["webgl", "experimental-webgl"];

/// Whether a throwaway canvas yields a WebGL context.
#[must_use]
pub fn webgl(document: &Document) -> CapabilitySignal {
    let supported = document
        .create_element("canvas")
        .ok()
        .and_then(|el| el.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        .is_some_and(|canvas| {
            WEBGL_CONTEXTS
                .iter()
                .any(|name| matches!(canvas.get_context(name), Ok(Some(_))))
        });
    CapabilitySignal::WebGl(supported)
}

/// The window's device pixel ratio.
#[must_use]
pub fn pixel_ratio(window: &Window) -> CapabilitySignal {
    CapabilitySignal::PixelRatio(window.device_pixel_ratio())
}

/// Resolves the battery status, if the navigator exposes `getBattery`.
pub async fn battery(navigator: &Navigator) -> CapabilitySignal {
    let Some(promise) = get_battery(navigator) else {
        return CapabilitySignal::BatteryUnavailable;
    };
    match JsFuture::from(promise).await {
        Ok(manager) => battery_signal(
            Reflect::get(&manager, &"level".into()).ok().and_then(|v| v.as_f64()),
            Reflect::get(&manager, &"charging".into()).ok().and_then(|v| v.as_bool()),
        ),
        Err(_) => CapabilitySignal::BatteryUnavailable,
    }
}

fn get_battery(navigator: &Navigator) -> Option<Promise> {
    let method = Reflect::get(navigator, &"getBattery".into())
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    method.call0(navigator).ok()?.dyn_into::<Promise>().ok()
}

/// Turns raw battery fields into a signal. Missing fields mean the API is
/// unusable.
#[must_use]
pub fn battery_signal(level: Option<f64>, charging: Option<bool>) -> CapabilitySignal {
    match (level, charging) {
        (Some(level), Some(charging)) if level.is_finite() => {
            CapabilitySignal::Battery { level, charging }
        }
        _ => CapabilitySignal::BatteryUnavailable,
    }
}

/// Reads `performance.memory.usedJSHeapSize` where the engine exposes it.
#[must_use]
pub fn memory() -> MemoryProbe {
    Box::new(|| {
        let global = js_sys::global();
        let performance = Reflect::get(&global, &"performance".into()).ok()?;
        let memory = Reflect::get(&performance, &"memory".into()).ok()?;
        heap_bytes(&Reflect::get(&memory, &"usedJSHeapSize".into()).ok()?)
    })
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "checked finite and non-negative; heap sizes fit in u64"
)]
fn heap_bytes(value: &JsValue) -> Option<u64> {
    let bytes = value.as_f64()?;
    if !bytes.is_finite() || bytes < 0.0 {
        return None;
    }
    Some(bytes as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_battery_readings_become_signals() {
        assert_eq!(
            battery_signal(Some(0.1), Some(false)),
            CapabilitySignal::Battery {
                level: 0.1,
                charging: false
            }
        );
    }

    #[test]
    fn partial_battery_readings_are_unavailable() {
        assert_eq!(
            battery_signal(None, Some(true)),
            CapabilitySignal::BatteryUnavailable
        );
        assert_eq!(
            battery_signal(Some(f64::NAN), Some(true)),
            CapabilitySignal::BatteryUnavailable
        );
    }
}
