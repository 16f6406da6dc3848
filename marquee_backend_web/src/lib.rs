// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for marquee.
//!
//! This crate binds [`marquee_core`] to browser APIs:
//!
//! - [`FrameLoop`]: `requestAnimationFrame` clock for sampling and smoothing
//! - [`MediaQueryWatch`]: `matchMedia` listeners feeding capability signals
//! - [`probe`]: one-shot WebGL, pixel-ratio, battery and heap probes
//! - [`IntersectionWatch`]: `IntersectionObserver` batches for sections and
//!   reveals, with targets resolved by identity
//! - [`LenisEngine`]: the global `Lenis` smooth-scroll class
//! - [`dom`]: element bounds and transform application
//! - [`DomSnapshotHost`]: `html2canvas` + `jspdf` export host
//! - [`ConsoleSink`]: trace events on the browser console
//! - [`MotionRuntime`]: everything above wired around one shared context
//!
//! All JavaScript failures surface as [`JsFailure`].

mod console;
pub mod dom;
mod lenis;
mod media;
mod observer;
pub mod probe;
mod raf;
mod runtime;
mod snapshot;

pub use console::ConsoleSink;
pub use lenis::LenisEngine;
pub use media::MediaQueryWatch;
pub use observer::{IntersectionWatch, ObservedEntry, ObserverOptions, Unobserver};
pub use raf::FrameLoop;
pub use runtime::MotionRuntime;
pub use snapshot::{DomSnapshotHost, generate_pdf};

use marquee_core::time::HostTime;
use wasm_bindgen::{JsCast as _, JsValue};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis(raf::performance_now())
}

/// A failed call into JavaScript, rendered to text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct JsFailure(pub String);

impl JsFailure {
    /// A failure raised on the Rust side of the binding.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<JsValue> for JsFailure {
    fn from(value: JsValue) -> Self {
        if let Some(error) = value.dyn_ref::<js_sys::Error>() {
            return Self(String::from(error.message()));
        }
        Self(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

/// The global `window`, or a failure outside a browsing context.
pub(crate) fn window() -> Result<web_sys::Window, JsFailure> {
    web_sys::window().ok_or_else(|| JsFailure::msg("no global window"))
}

/// The window's document.
pub(crate) fn document(window: &web_sys::Window) -> Result<web_sys::Document, JsFailure> {
    window
        .document()
        .ok_or_else(|| JsFailure::msg("window has no document"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_render_their_message() {
        let failure = JsFailure::msg("element with id `resume` not found");
        assert_eq!(failure.to_string(), "element with id `resume` not found");
    }
}
