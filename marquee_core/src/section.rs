// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Active section detection.
//!
//! Two independent sources can name the active section:
//!
//! - [`ActiveSectionTracker`] consumes intersection observer batches and picks
//!   the most visible intersecting section.
//! - [`section_trigger`] builds a scroll trigger that marks its section active
//!   on enter and records the section's progress into the [`ScrollStore`].

use alloc::string::String;
use alloc::vec::Vec;

use crate::scroll::ScrollStore;
use crate::trigger::{Length, TriggerDescriptor, TriggerPosition};

/// Intersection ratios at which the observer reports.
pub const ACTIVE_SECTION_THRESHOLDS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Root margin that shrinks the observed band to the middle 60% of the viewport.
pub const ACTIVE_SECTION_ROOT_MARGIN: &str = "-20% 0px -20% 0px";

/// One intersection observer entry, reduced to what the tracker needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionSample<'a> {
    /// Id of the observed element.
    pub id: &'a str,
    /// `isIntersecting`.
    pub is_intersecting: bool,
    /// `intersectionRatio`.
    pub ratio: f64,
}

/// Picks the most visible section from intersection batches.
#[derive(Clone, Debug, Default)]
pub struct ActiveSectionTracker {
    ids: Vec<String>,
    active: Option<usize>,
}

impl ActiveSectionTracker {
    /// Tracks the given section ids, in page order.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            active: None,
        }
    }

    /// The observed ids, in page order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The active section id, if any batch has named one.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active.map(|i| self.ids[i].as_str())
    }

    /// Index of the active section in page order.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Folds one observer batch.
    ///
    /// Only entries in this batch are compared. A batch with no intersecting
    /// entry, or whose winner is not a tracked id, leaves the active section
    /// unchanged. Returns the new id when it changed.
    pub fn observe(&mut self, batch: &[IntersectionSample<'_>]) -> Option<&str> {
        let mut best: Option<(f64, &str)> = None;
        for sample in batch {
            if sample.is_intersecting && sample.ratio > best.map_or(0.0, |(r, _)| r) {
                best = Some((sample.ratio, sample.id));
            }
        }
        let (_, id) = best?;
        let index = self.ids.iter().position(|known| known == id)?;
        if self.active == Some(index) {
            return None;
        }
        self.active = Some(index);
        Some(self.ids[index].as_str())
    }
}

/// Where a section's progress starts: its top at 80% of the viewport.
pub const SECTION_START: TriggerPosition = TriggerPosition {
    element: Length::Percent(0.0),
    viewport: Length::Percent(80.0),
};

/// Where a section's progress ends: its bottom at 20% of the viewport.
pub const SECTION_END: TriggerPosition = TriggerPosition {
    element: Length::Percent(100.0),
    viewport: Length::Percent(20.0),
};

/// A trigger that marks `section` active on enter and mirrors its progress
/// into the store.
#[must_use]
pub fn section_trigger(section: &str) -> TriggerDescriptor<ScrollStore> {
    let on_enter = String::from(section);
    let on_update = String::from(section);
    TriggerDescriptor::default()
        .range(SECTION_START, SECTION_END)
        .on_enter(move |store: &mut ScrollStore| {
            store.set_active_section(&on_enter);
        })
        .on_update(move |store: &mut ScrollStore, progress| {
            store.set_section_progress(&on_update, progress);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::HostTime;
    use crate::trace::Tracer;
    use crate::trigger::{ElementBounds, Scrub, ScrollTriggers};
    use kurbo::Rect;

    fn sample(id: &str, is_intersecting: bool, ratio: f64) -> IntersectionSample<'_> {
        IntersectionSample {
            id,
            is_intersecting,
            ratio,
        }
    }

    #[test]
    fn most_visible_intersecting_entry_wins() {
        let mut tracker = ActiveSectionTracker::new(["hero", "about", "skills"]);
        let changed = tracker.observe(&[
            sample("hero", true, 0.25),
            sample("about", true, 0.75),
            sample("skills", false, 1.0),
        ]);
        assert_eq!(changed, Some("about"));
        assert_eq!(tracker.active_index(), Some(1));
    }

    #[test]
    fn empty_or_unknown_batches_keep_the_current_section() {
        let mut tracker = ActiveSectionTracker::new(["hero", "about"]);
        tracker.observe(&[sample("hero", true, 0.5)]);
        assert_eq!(tracker.observe(&[sample("about", false, 0.0)]), None);
        assert_eq!(tracker.observe(&[sample("footer", true, 1.0)]), None);
        assert_eq!(tracker.observe(&[sample("hero", true, 1.0)]), None);
        assert_eq!(tracker.active(), Some("hero"));
    }

    #[test]
    fn zero_ratio_never_wins() {
        let mut tracker = ActiveSectionTracker::new(["hero"]);
        assert_eq!(tracker.observe(&[sample("hero", true, 0.0)]), None);
        assert_eq!(tracker.active(), None);
    }

    #[test]
    fn section_trigger_writes_into_the_store() {
        let mut triggers = ScrollTriggers::new();
        let mut store = ScrollStore::new();
        // Section at [1000, 2000] in a 1000px viewport: range is [200, 1800].
        let id = triggers.create(
            section_trigger("about").scrub(Scrub::Direct),
            ElementBounds(Rect::new(0.0, 1000.0, 100.0, 2000.0)),
            1000.0,
        );
        let mut t = Tracer::none();
        triggers.update(100.0, &mut store, &mut t);
        assert_eq!(store.active_section(), "hero");

        triggers.update(1000.0, &mut store, &mut t);
        assert_eq!(store.active_section(), "about");
        assert!((store.section_progress("about") - 0.5).abs() < 1e-9);

        triggers.advance(HostTime(0), &mut store);
        assert_eq!(triggers.progress(id), Some(0.5));
    }
}
