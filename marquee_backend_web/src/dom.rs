// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM reads and writes for the view helpers.
//!
//! Reads turn client rects into document-space [`ElementBounds`] and window
//! geometry into [`ScrollMetrics`]. Writes turn parallax offsets, progress
//! transforms and reveal state into inline CSS.

use kurbo::{Rect, Vec2};
use marquee_core::parallax::{ParallaxOffset, ProgressTransforms};
use marquee_core::scroll::ScrollMetrics;
use marquee_core::trigger::ElementBounds;
use web_sys::{Element, HtmlElement, Window};

/// Document-space bounds of `element` at the given scroll offset.
#[must_use]
pub fn element_bounds(element: &Element, scroll_y: f64) -> ElementBounds {
    let rect = element.get_bounding_client_rect();
    ElementBounds::from_client_rect(
        Rect::new(rect.left(), rect.top(), rect.right(), rect.bottom()),
        scroll_y,
    )
}

/// Viewport and document heights of `window`, paired with `scroll_y`.
///
/// Unreadable heights are zero, which reads as "no overflow".
#[must_use]
pub fn page_metrics(window: &Window, scroll_y: f64) -> ScrollMetrics {
    let viewport_height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let document_height = window
        .document()
        .and_then(|document| document.document_element())
        .map_or(0.0, |root| f64::from(root.scroll_height()));
    ScrollMetrics {
        scroll_y,
        viewport_height,
        document_height,
    }
}

/// The window's own scroll position and heights.
#[must_use]
pub fn window_metrics(window: &Window) -> ScrollMetrics {
    page_metrics(window, window.scroll_y().unwrap_or(0.0))
}

/// CSS `transform` value for a translation.
#[must_use]
pub fn translate_css(offset: Vec2) -> String {
    format!("translate3d({}px, {}px, 0)", offset.x, offset.y)
}

/// CSS `transform` value for a progress-driven slide and scale.
#[must_use]
pub fn progress_transform_css(t: &ProgressTransforms) -> String {
    format!("translateY({}px) scale({})", t.translate_y, t.scale)
}

/// Writes parallax offsets as `transform`s, in order; later entries for the
/// same element win.
pub fn apply_parallax(offsets: &[ParallaxOffset<HtmlElement>]) {
    for ParallaxOffset { key, offset } in offsets {
        let _ = key.style().set_property("transform", &translate_css(*offset));
    }
}

/// Writes the fade-in opacity and slide/scale transform of `t`.
pub fn apply_progress(element: &HtmlElement, t: &ProgressTransforms) {
    let style = element.style();
    let _ = style.set_property("opacity", &t.opacity.to_string());
    let _ = style.set_property("transform", &progress_transform_css(t));
}

/// Shows or hides a reveal target.
pub fn apply_reveal(element: &HtmlElement, visible: bool) {
    let style = element.style();
    if visible {
        let _ = style.set_property("opacity", "1");
        let _ = style.set_property("transform", "none");
    } else {
        let _ = style.set_property("opacity", "0");
        let _ = style.set_property("transform", "translateY(30px)");
    }
}
