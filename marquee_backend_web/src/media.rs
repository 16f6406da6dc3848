// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `matchMedia` listeners.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast as _;
use web_sys::{MediaQueryList, MediaQueryListEvent, Window};

use crate::JsFailure;

/// A live media query.
///
/// The callback runs once with the current match state when the watch is
/// created and again on every `change` event. Dropping the watch removes the
/// listener.
pub struct MediaQueryWatch {
    query: &'static str,
    list: MediaQueryList,
    listener: Closure<dyn FnMut(MediaQueryListEvent)>,
}

impl MediaQueryWatch {
    /// Evaluates `query` and subscribes to its changes.
    pub fn new(
        window: &Window,
        query: &'static str,
        mut on_change: impl FnMut(bool) + 'static,
    ) -> Result<Self, JsFailure> {
        let list = window
            .match_media(query)?
            .ok_or_else(|| JsFailure::msg("matchMedia returned null"))?;
        on_change(list.matches());
        let listener = Closure::wrap(Box::new(move |event: MediaQueryListEvent| {
            on_change(event.matches());
        }) as Box<dyn FnMut(MediaQueryListEvent)>);
        list.add_event_listener_with_callback("change", listener.as_ref().unchecked_ref())?;
        Ok(Self {
            query,
            list,
            listener,
        })
    }

    /// The watched query.
    #[must_use]
    pub fn query(&self) -> &'static str {
        self.query
    }

    /// Current match state.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.list.matches()
    }
}

impl Drop for MediaQueryWatch {
    fn drop(&mut self) {
        let _ = self
            .list
            .remove_event_listener_with_callback("change", self.listener.as_ref().unchecked_ref());
    }
}

impl core::fmt::Debug for MediaQueryWatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MediaQueryWatch")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}
