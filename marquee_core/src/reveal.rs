// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reveal-on-scroll state.
//!
//! The backend registers an intersection observer with the options' threshold
//! and root margin and forwards each entry to [`Reveal::observe`] (or
//! [`RevealGroup::observe`] for staggered groups). Delays are deadlines that
//! [`Reveal::tick`] resolves against frame time.
//!
//! With `once` set, the first intersection both schedules the reveal and
//! stops observation for good: a once-revealed element can never fire again.
//! Without `once`, leaving the intersection hides the element and cancels a
//! reveal that has not fired yet.

use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::{ConfigError, ParseError};
use crate::time::{Duration, HostTime};
use crate::trigger::Length;

/// An intersection observer root margin in CSS shorthand order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    /// Top inset.
    pub top: Length,
    /// Right inset.
    pub right: Length,
    /// Bottom inset.
    pub bottom: Length,
    /// Left inset.
    pub left: Length,
}

impl RootMargin {
    /// `"0px 0px -50px 0px"`: reveal slightly before the bottom edge.
    pub const REVEAL: Self = Self {
        top: Length::Px(0.0),
        right: Length::Px(0.0),
        bottom: Length::Px(-50.0),
        left: Length::Px(0.0),
    };
}

impl FromStr for RootMargin {
    type Err = ParseError;

    /// Accepts one to four lengths with CSS `margin` shorthand expansion.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::RootMargin(s.to_string());
        let parts = s
            .split_whitespace()
            .map(str::parse::<Length>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| err())?;
        let [top, right, bottom, left] = match parts.as_slice() {
            &[all] => [all; 4],
            &[vertical, horizontal] => [vertical, horizontal, vertical, horizontal],
            &[top, horizontal, bottom] => [top, horizontal, bottom, horizontal],
            &[top, right, bottom, left] => [top, right, bottom, left],
            _ => return Err(err()),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

fn write_length(f: &mut fmt::Formatter<'_>, length: Length) -> fmt::Result {
    match length {
        Length::Px(px) => write!(f, "{px}px"),
        Length::Percent(pct) => write!(f, "{pct}%"),
    }
}

impl fmt::Display for RootMargin {
    /// Always writes all four sides, ready for `IntersectionObserverInit`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_length(f, self.top)?;
        f.write_str(" ")?;
        write_length(f, self.right)?;
        f.write_str(" ")?;
        write_length(f, self.bottom)?;
        f.write_str(" ")?;
        write_length(f, self.left)
    }
}

/// Options shared by [`Reveal`] and [`RevealGroup`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealOptions {
    /// Intersection ratio that counts as visible.
    pub threshold: f64,
    /// Observer root margin.
    pub root_margin: RootMargin,
    /// Reveal at most once and stop observing.
    pub once: bool,
    /// Delay between intersection and reveal.
    pub delay: Duration,
}

impl RevealOptions {
    /// Threshold 0.1, `0px 0px -50px 0px`, once, no delay.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin::REVEAL,
            once: true,
            delay: Duration::ZERO,
        }
    }

    /// Checks that the threshold is a ratio.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::NotFinite { field: "threshold" });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::OutOfUnitRange { field: "threshold" });
        }
        Ok(())
    }
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Default spacing between items of a [`RevealGroup`].
pub const DEFAULT_STAGGER: Duration = Duration::from_millis_u64(100);

/// Reveal state for one element or one group item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Slot {
    visible: bool,
    fired: bool,
    observing: bool,
    pending: Option<HostTime>,
}

impl Slot {
    const fn observing() -> Self {
        Self {
            visible: false,
            fired: false,
            observing: true,
            pending: None,
        }
    }

    /// Returns `true` if visibility flipped.
    fn observe(&mut self, intersecting: bool, once: bool, due: HostTime, now: HostTime) -> bool {
        if !self.observing {
            return false;
        }
        if intersecting {
            if once {
                self.observing = false;
            }
            if due <= now {
                return self.reveal();
            }
            if self.pending.is_none() {
                self.pending = Some(due);
            }
            false
        } else if !once {
            self.pending = None;
            core::mem::replace(&mut self.visible, false)
        } else {
            false
        }
    }

    fn tick(&mut self, now: HostTime) -> bool {
        match self.pending {
            Some(due) if due <= now => {
                self.pending = None;
                self.reveal()
            }
            _ => false,
        }
    }

    fn reveal(&mut self) -> bool {
        self.fired = true;
        !core::mem::replace(&mut self.visible, true)
    }
}

/// Reveal state of a single element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reveal {
    options: RevealOptions,
    slot: Slot,
}

impl Reveal {
    /// Starts observing with `options`.
    #[must_use]
    pub fn new(options: RevealOptions) -> Self {
        Self {
            options,
            slot: Slot::observing(),
        }
    }

    /// The options this reveal was created with.
    #[must_use]
    pub fn options(&self) -> &RevealOptions {
        &self.options
    }

    /// Feeds one observer entry. Returns `true` if visibility changed.
    pub fn observe(&mut self, is_intersecting: bool, now: HostTime) -> bool {
        let due = now + self.options.delay;
        self.slot
            .observe(is_intersecting, self.options.once, due, now)
    }

    /// Fires a due delayed reveal. Returns `true` if visibility changed.
    pub fn tick(&mut self, now: HostTime) -> bool {
        self.slot.tick(now)
    }

    /// Whether the element is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.slot.visible
    }

    /// Whether the element has been revealed at least once.
    #[must_use]
    pub fn has_animated(&self) -> bool {
        self.slot.fired
    }

    /// Whether the backend should keep the element observed.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.slot.observing
    }
}

/// Staggered reveal state for a list of elements.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealGroup {
    options: RevealOptions,
    stagger: Duration,
    slots: Vec<Slot>,
}

impl RevealGroup {
    /// A group of `len` items revealed `stagger` apart.
    #[must_use]
    pub fn new(len: usize, options: RevealOptions, stagger: Duration) -> Self {
        Self {
            options,
            stagger,
            slots: vec![Slot::observing(); len],
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` for an empty group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Delay applied to item `index`: `index * stagger + delay`.
    #[must_use]
    pub fn delay_for(&self, index: usize) -> Duration {
        let index = u64::try_from(index).unwrap_or(u64::MAX);
        self.stagger.saturating_mul(index) + self.options.delay
    }

    /// Feeds an observer entry for item `index`; unknown indices are ignored.
    ///
    /// Returns `true` if that item's visibility changed.
    pub fn observe(&mut self, index: usize, is_intersecting: bool, now: HostTime) -> bool {
        let due = now + self.delay_for(index);
        let once = self.options.once;
        self.slots
            .get_mut(index)
            .is_some_and(|slot| slot.observe(is_intersecting, once, due, now))
    }

    /// Fires every due reveal. Returns `true` if any item became visible.
    pub fn tick(&mut self, now: HostTime) -> bool {
        self.slots
            .iter_mut()
            .fold(false, |changed, slot| slot.tick(now) | changed)
    }

    /// Whether item `index` is shown.
    #[must_use]
    pub fn is_item_visible(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.visible)
    }

    /// Whether the backend should keep item `index` observed.
    #[must_use]
    pub fn is_observing(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.observing)
    }

    /// Indices of shown items, ascending.
    pub fn visible_items(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.visible)
            .map(|(i, _)| i)
    }
}
