// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll triggers.
//!
//! A trigger binds an element to a range of document scroll offsets. Each
//! time the scroll position changes, [`ScrollTriggers::update`] recomputes the
//! trigger's progress in `[0, 1]` and fires edge callbacks as the position
//! moves across the range boundaries.
//!
//! ## Resolving positions
//!
//! A [`TriggerPosition`] pairs a point on the element with a point on the
//! viewport, written as `"<element> <viewport>"`: `"top 80%"` is the scroll
//! offset at which the element's top edge sits 80% of the way down the
//! viewport. Each side accepts the keywords `top`, `center` and `bottom`, a
//! percentage, or a pixel length.
//!
//! ## Edges
//!
//! The scroll axis is split into three zones relative to a trigger's
//! [`TriggerRange`]: before `start`, inside `[start, end]`, and after `end`.
//! Moving between zones fires:
//!
//! | from \ to | inside | after | before |
//! |---|---|---|---|
//! | before | enter | enter, leave | |
//! | inside | | leave | leave-back |
//! | after | enter-back | | enter-back, leave-back |
//!
//! A single jump across the whole range therefore still reports both edges, in
//! order, and never the same edge twice for one pass.
//!
//! ## Scrub
//!
//! [`Scrub::Direct`] reports progress as soon as the scroll offset changes.
//! [`Scrub::Smoothed`] lets displayed progress chase the scroll-derived value
//! and settle within roughly the given duration; it moves only in
//! [`ScrollTriggers::advance`], which the frame loop calls with the frame time.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use kurbo::Rect;

use crate::error::ParseError;
use crate::time::{Duration, HostTime};
use crate::trace::{Tracer, TriggerEdgeEvent};

/// Handle to a trigger registered in [`ScrollTriggers`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u32);

/// A boundary crossing reported by a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerEdge {
    /// Scrolling forward past `start`.
    Enter,
    /// Scrolling forward past `end`.
    Leave,
    /// Scrolling backward past `end`.
    EnterBack,
    /// Scrolling backward past `start`.
    LeaveBack,
}

impl TriggerEdge {
    /// Whether the element is inside the range after this edge.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Enter | Self::EnterBack)
    }
}

/// A CSS-style length along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Absolute CSS pixels.
    Px(f64),
    /// Percentage of the reference extent, `100.0` meaning the whole extent.
    Percent(f64),
}

impl Length {
    /// The length in pixels against an extent of `extent` pixels.
    #[must_use]
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl FromStr for Length {
    type Err = ParseError;

    /// Accepts `"12px"`, `"-20%"` and unitless `"12"` (pixels).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::Length(s.to_string());
        let (number, percent) = match s.strip_suffix('%') {
            Some(n) => (n, true),
            None => (s.strip_suffix("px").unwrap_or(s), false),
        };
        let value: f64 = number.parse().map_err(|_| err())?;
        if !value.is_finite() {
            return Err(err());
        }
        Ok(if percent {
            Self::Percent(value)
        } else {
            Self::Px(value)
        })
    }
}

/// `"<element> <viewport>"` pair that resolves to a scroll offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerPosition {
    /// Point on the element, measured from its top edge.
    pub element: Length,
    /// Point on the viewport, measured from its top edge.
    pub viewport: Length,
}

impl TriggerPosition {
    /// `"top bottom"`: the element's top meets the viewport's bottom.
    pub const TOP_BOTTOM: Self = Self {
        element: Length::Percent(0.0),
        viewport: Length::Percent(100.0),
    };

    /// `"bottom top"`: the element's bottom meets the viewport's top.
    pub const BOTTOM_TOP: Self = Self {
        element: Length::Percent(100.0),
        viewport: Length::Percent(0.0),
    };

    /// The document scroll offset at which the two points coincide.
    #[must_use]
    pub fn resolve(&self, bounds: &ElementBounds, viewport_height: f64) -> f64 {
        bounds.top() + self.element.resolve(bounds.height())
            - self.viewport.resolve(viewport_height)
    }
}

fn parse_edge(token: &str) -> Result<Length, ParseError> {
    match token {
        "top" => Ok(Length::Percent(0.0)),
        "center" => Ok(Length::Percent(50.0)),
        "bottom" => Ok(Length::Percent(100.0)),
        other => other.parse(),
    }
}

impl FromStr for TriggerPosition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::Position(s.to_string());
        let mut tokens = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(err());
        };
        Ok(Self {
            element: parse_edge(element).map_err(|_| err())?,
            viewport: parse_edge(viewport).map_err(|_| err())?,
        })
    }
}

/// An element's box in document coordinates (client rect plus scroll offset).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementBounds(pub Rect);

impl ElementBounds {
    /// Converts a viewport-relative client rect taken at `scroll_y`.
    #[must_use]
    pub fn from_client_rect(client: Rect, scroll_y: f64) -> Self {
        Self(client + kurbo::Vec2::new(0.0, scroll_y))
    }

    /// Document offset of the top edge.
    #[must_use]
    pub fn top(&self) -> f64 {
        self.0.y0
    }

    /// Box height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.0.height()
    }
}

/// Resolved scroll range of one trigger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerRange {
    /// Scroll offset where progress is 0.
    pub start: f64,
    /// Scroll offset where progress is 1.
    pub end: f64,
}

impl TriggerRange {
    /// Progress at `scroll_y`, clamped to `[0, 1]`.
    ///
    /// A zero-length range is a step: 0 before `start`, 1 from it onwards.
    #[must_use]
    pub fn progress(&self, scroll_y: f64) -> f64 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return if scroll_y >= self.start { 1.0 } else { 0.0 };
        }
        ((scroll_y - self.start) / span).clamp(0.0, 1.0)
    }

    fn zone(&self, scroll_y: f64) -> Zone {
        if scroll_y < self.start {
            Zone::Before
        } else if scroll_y > self.end {
            Zone::After
        } else {
            Zone::Inside
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Zone {
    Before,
    Inside,
    After,
}

fn edges_between(from: Zone, to: Zone) -> &'static [TriggerEdge] {
    use TriggerEdge as E;
    match (from, to) {
        (Zone::Before, Zone::Inside) => &[E::Enter],
        (Zone::Before, Zone::After) => &[E::Enter, E::Leave],
        (Zone::Inside, Zone::After) => &[E::Leave],
        (Zone::Inside, Zone::Before) => &[E::LeaveBack],
        (Zone::After, Zone::Inside) => &[E::EnterBack],
        (Zone::After, Zone::Before) => &[E::EnterBack, E::LeaveBack],
        _ => &[],
    }
}

/// How displayed progress follows scroll-derived progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scrub {
    /// Progress follows the scroll offset immediately.
    Direct,
    /// Progress catches up over about this long.
    Smoothed(Duration),
}

impl Default for Scrub {
    /// One second of catch-up.
    fn default() -> Self {
        Self::Smoothed(Duration::SECOND)
    }
}

/// Callback run on an edge crossing, with the registry's context.
pub type EdgeCallback<C> = Box<dyn FnMut(&mut C)>;
/// Callback run when displayed progress changes.
pub type UpdateCallback<C> = Box<dyn FnMut(&mut C, f64)>;

/// Optional per-trigger callbacks.
pub struct TriggerCallbacks<C> {
    on_enter: Option<EdgeCallback<C>>,
    on_leave: Option<EdgeCallback<C>>,
    on_enter_back: Option<EdgeCallback<C>>,
    on_leave_back: Option<EdgeCallback<C>>,
    on_update: Option<UpdateCallback<C>>,
}

impl<C> Default for TriggerCallbacks<C> {
    fn default() -> Self {
        Self {
            on_enter: None,
            on_leave: None,
            on_enter_back: None,
            on_leave_back: None,
            on_update: None,
        }
    }
}

impl<C> fmt::Debug for TriggerCallbacks<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerCallbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .field("on_enter_back", &self.on_enter_back.is_some())
            .field("on_leave_back", &self.on_leave_back.is_some())
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

impl<C> TriggerCallbacks<C> {
    fn edge(&mut self, edge: TriggerEdge) -> Option<&mut EdgeCallback<C>> {
        match edge {
            TriggerEdge::Enter => self.on_enter.as_mut(),
            TriggerEdge::Leave => self.on_leave.as_mut(),
            TriggerEdge::EnterBack => self.on_enter_back.as_mut(),
            TriggerEdge::LeaveBack => self.on_leave_back.as_mut(),
        }
    }
}

/// Declarative description of a trigger.
#[derive(Debug)]
pub struct TriggerDescriptor<C = ()> {
    /// Where progress is 0.
    pub start: TriggerPosition,
    /// Where progress is 1.
    pub end: TriggerPosition,
    /// Progress smoothing.
    pub scrub: Scrub,
    /// Hold the element in place while inside the range.
    pub pin: bool,
    /// Lifecycle callbacks.
    pub callbacks: TriggerCallbacks<C>,
}

impl<C> Default for TriggerDescriptor<C> {
    /// `"top bottom"` to `"bottom top"`, smoothed over one second, unpinned.
    fn default() -> Self {
        Self {
            start: TriggerPosition::TOP_BOTTOM,
            end: TriggerPosition::BOTTOM_TOP,
            scrub: Scrub::default(),
            pin: false,
            callbacks: TriggerCallbacks::default(),
        }
    }
}

impl<C> TriggerDescriptor<C> {
    /// Sets both range ends.
    #[must_use]
    pub fn range(mut self, start: TriggerPosition, end: TriggerPosition) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Sets the scrub mode.
    #[must_use]
    pub fn scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }

    /// Pins the element while inside the range.
    #[must_use]
    pub fn pinned(mut self) -> Self {
        self.pin = true;
        self
    }

    /// Callback for [`TriggerEdge::Enter`].
    #[must_use]
    pub fn on_enter(mut self, f: impl FnMut(&mut C) + 'static) -> Self {
        self.callbacks.on_enter = Some(Box::new(f));
        self
    }

    /// Callback for [`TriggerEdge::Leave`].
    #[must_use]
    pub fn on_leave(mut self, f: impl FnMut(&mut C) + 'static) -> Self {
        self.callbacks.on_leave = Some(Box::new(f));
        self
    }

    /// Callback for [`TriggerEdge::EnterBack`].
    #[must_use]
    pub fn on_enter_back(mut self, f: impl FnMut(&mut C) + 'static) -> Self {
        self.callbacks.on_enter_back = Some(Box::new(f));
        self
    }

    /// Callback for [`TriggerEdge::LeaveBack`].
    #[must_use]
    pub fn on_leave_back(mut self, f: impl FnMut(&mut C) + 'static) -> Self {
        self.callbacks.on_leave_back = Some(Box::new(f));
        self
    }

    /// Callback for progress changes.
    #[must_use]
    pub fn on_update(mut self, f: impl FnMut(&mut C, f64) + 'static) -> Self {
        self.callbacks.on_update = Some(Box::new(f));
        self
    }
}

/// Smoothed progress is considered caught up within this distance.
const SETTLE_EPSILON: f64 = 1e-4;

struct Entry<C> {
    id: TriggerId,
    start: TriggerPosition,
    end: TriggerPosition,
    scrub: Scrub,
    pin: bool,
    callbacks: TriggerCallbacks<C>,
    bounds: ElementBounds,
    range: TriggerRange,
    zone: Zone,
    target: f64,
    displayed: f64,
    last_advance: Option<HostTime>,
}

impl<C> Entry<C> {
    fn set_displayed(&mut self, value: f64, ctx: &mut C) {
        if value == self.displayed {
            return;
        }
        self.displayed = value;
        if let Some(f) = &mut self.callbacks.on_update {
            f(ctx, value);
        }
    }
}

/// Registry of live triggers.
///
/// `C` is the context passed to callbacks, which lets them mutate state that
/// lives beside the registry (typically the scroll store) without shared
/// ownership.
pub struct ScrollTriggers<C = ()> {
    entries: Vec<Entry<C>>,
    next_id: u32,
    viewport_height: f64,
    scroll_y: f64,
}

impl<C> Default for ScrollTriggers<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            viewport_height: 0.0,
            scroll_y: 0.0,
        }
    }
}

impl<C> fmt::Debug for ScrollTriggers<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollTriggers")
            .field("len", &self.entries.len())
            .field("viewport_height", &self.viewport_height)
            .field("scroll_y", &self.scroll_y)
            .finish_non_exhaustive()
    }
}

impl<C> ScrollTriggers<C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no trigger is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a trigger.
    ///
    /// The trigger starts in the "before" zone; the next
    /// [`update`](Self::update) fires whichever edges the current scroll
    /// offset implies.
    pub fn create(
        &mut self,
        descriptor: TriggerDescriptor<C>,
        bounds: ElementBounds,
        viewport_height: f64,
    ) -> TriggerId {
        let id = TriggerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.viewport_height = viewport_height;
        let range = TriggerRange {
            start: descriptor.start.resolve(&bounds, viewport_height),
            end: descriptor.end.resolve(&bounds, viewport_height),
        };
        self.entries.push(Entry {
            id,
            start: descriptor.start,
            end: descriptor.end,
            scrub: descriptor.scrub,
            pin: descriptor.pin,
            callbacks: descriptor.callbacks,
            bounds,
            range,
            zone: Zone::Before,
            target: 0.0,
            displayed: 0.0,
            last_advance: None,
        });
        id
    }

    /// Removes a trigger; its callbacks never run again.
    ///
    /// Returns `false` if `id` was not live.
    pub fn kill(&mut self, id: TriggerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Removes every trigger.
    pub fn kill_all(&mut self) {
        self.entries.clear();
    }

    /// Recomputes every range after a layout change.
    ///
    /// `bounds_of` returns fresh bounds per trigger; `None` keeps the
    /// previous bounds (the element may be detached mid-teardown).
    pub fn refresh(
        &mut self,
        viewport_height: f64,
        mut bounds_of: impl FnMut(TriggerId) -> Option<ElementBounds>,
    ) {
        self.viewport_height = viewport_height;
        for e in &mut self.entries {
            if let Some(bounds) = bounds_of(e.id) {
                e.bounds = bounds;
            }
            e.range = TriggerRange {
                start: e.start.resolve(&e.bounds, viewport_height),
                end: e.end.resolve(&e.bounds, viewport_height),
            };
        }
    }

    /// Feeds a new scroll offset to every trigger.
    ///
    /// Edge callbacks run in the order the edges are crossed, followed by the
    /// progress callback for [`Scrub::Direct`] triggers.
    pub fn update(&mut self, scroll_y: f64, ctx: &mut C, tracer: &mut Tracer<'_>) {
        self.scroll_y = scroll_y;
        for e in &mut self.entries {
            let zone = e.range.zone(scroll_y);
            for &edge in edges_between(e.zone, zone) {
                tracer.trigger_edge(&TriggerEdgeEvent {
                    trigger: e.id,
                    edge,
                    scroll_y,
                });
                if let Some(f) = e.callbacks.edge(edge) {
                    f(ctx);
                }
            }
            e.zone = zone;
            e.target = e.range.progress(scroll_y);
            if e.scrub == Scrub::Direct {
                let target = e.target;
                e.set_displayed(target, ctx);
            }
        }
    }

    /// Moves smoothed progress towards its target.
    pub fn advance(&mut self, now: HostTime, ctx: &mut C) {
        for e in &mut self.entries {
            let Scrub::Smoothed(lag) = e.scrub else {
                continue;
            };
            let last = e.last_advance.replace(now);
            let gap = e.target - e.displayed;
            if gap == 0.0 {
                continue;
            }
            let dt = last.map_or(Duration::ZERO, |last| now - last);
            let alpha = if lag == Duration::ZERO {
                1.0
            } else {
                (dt.as_millis() / lag.as_millis()).min(1.0)
            };
            let mut next = e.displayed + gap * alpha;
            if (e.target - next).abs() < SETTLE_EPSILON {
                next = e.target;
            }
            e.set_displayed(next, ctx);
        }
    }

    /// Displayed progress of a trigger.
    #[must_use]
    pub fn progress(&self, id: TriggerId) -> Option<f64> {
        self.entry(id).map(|e| e.displayed)
    }

    /// Resolved range of a trigger.
    #[must_use]
    pub fn range(&self, id: TriggerId) -> Option<TriggerRange> {
        self.entry(id).map(|e| e.range)
    }

    /// Returns `true` while the last update placed `scroll_y` inside the range.
    #[must_use]
    pub fn is_active(&self, id: TriggerId) -> bool {
        self.entry(id).is_some_and(|e| e.zone == Zone::Inside)
    }

    /// Translation that keeps a pinned element fixed at `scroll_y`.
    ///
    /// Zero before the range, follows the scroll inside it, and stays at the
    /// range length afterwards. `None` for unknown or unpinned triggers.
    #[must_use]
    pub fn pin_offset(&self, id: TriggerId, scroll_y: f64) -> Option<f64> {
        let e = self.entry(id).filter(|e| e.pin)?;
        let span = (e.range.end - e.range.start).max(0.0);
        Some((scroll_y - e.range.start).clamp(0.0, span))
    }

    /// Last scroll offset passed to [`update`](Self::update).
    #[must_use]
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn entry(&self, id: TriggerId) -> Option<&Entry<C>> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceSink;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    fn bounds(top: f64, height: f64) -> ElementBounds {
        ElementBounds(Rect::new(0.0, top, 100.0, top + height))
    }

    fn pos(s: &str) -> TriggerPosition {
        s.parse().unwrap()
    }

    #[test]
    fn parses_keywords_percentages_and_pixels() {
        assert_eq!(pos("top bottom"), TriggerPosition::TOP_BOTTOM);
        assert_eq!(
            pos("center 80%"),
            TriggerPosition {
                element: Length::Percent(50.0),
                viewport: Length::Percent(80.0),
            }
        );
        assert_eq!(
            pos("top 100px"),
            TriggerPosition {
                element: Length::Percent(0.0),
                viewport: Length::Px(100.0),
            }
        );
        assert!("top".parse::<TriggerPosition>().is_err());
        assert!("top bottom left".parse::<TriggerPosition>().is_err());
        assert!("top middle".parse::<TriggerPosition>().is_err());
    }

    #[test]
    fn lengths_parse_and_resolve() {
        assert_eq!("-50px".parse::<Length>(), Ok(Length::Px(-50.0)));
        assert_eq!("-20%".parse::<Length>(), Ok(Length::Percent(-20.0)));
        assert_eq!("0".parse::<Length>(), Ok(Length::Px(0.0)));
        assert!("px".parse::<Length>().is_err());
        assert!("inf%".parse::<Length>().is_err());
        assert!((Length::Percent(-20.0).resolve(1000.0) + 200.0).abs() < 1e-9);
    }

    #[test]
    fn default_range_spans_element_passing_through_viewport() {
        let b = bounds(2000.0, 500.0);
        let start = TriggerPosition::TOP_BOTTOM.resolve(&b, 800.0);
        let end = TriggerPosition::BOTTOM_TOP.resolve(&b, 800.0);
        assert!((start - 1200.0).abs() < 1e-9);
        assert!((end - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn client_rect_is_shifted_into_document_space() {
        let b = ElementBounds::from_client_rect(Rect::new(0.0, 100.0, 10.0, 150.0), 400.0);
        assert!((b.top() - 500.0).abs() < 1e-9);
        assert!((b.height() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn range_progress_is_clamped() {
        let r = TriggerRange {
            start: 100.0,
            end: 300.0,
        };
        assert_eq!(r.progress(0.0), 0.0);
        assert!((r.progress(200.0) - 0.5).abs() < 1e-9);
        assert_eq!(r.progress(1000.0), 1.0);

        let step = TriggerRange {
            start: 100.0,
            end: 100.0,
        };
        assert_eq!(step.progress(99.0), 0.0);
        assert_eq!(step.progress(100.0), 1.0);
    }

    type Log = Rc<RefCell<Vec<TriggerEdge>>>;

    fn logging(log: &Log) -> TriggerDescriptor {
        let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
        TriggerDescriptor::default()
            .scrub(Scrub::Direct)
            .on_enter(move |_| a.borrow_mut().push(TriggerEdge::Enter))
            .on_leave(move |_| b.borrow_mut().push(TriggerEdge::Leave))
            .on_enter_back(move |_| c.borrow_mut().push(TriggerEdge::EnterBack))
            .on_leave_back(move |_| d.borrow_mut().push(TriggerEdge::LeaveBack))
    }

    #[test]
    fn each_edge_fires_once_per_pass() {
        let log = Log::default();
        let mut triggers = ScrollTriggers::new();
        // Range is [1200, 2500].
        triggers.create(logging(&log), bounds(2000.0, 500.0), 800.0);
        let mut t = Tracer::none();

        for y in [0.0, 1000.0, 1300.0, 1500.0, 2400.0, 2600.0, 3000.0] {
            triggers.update(y, &mut (), &mut t);
        }
        assert_eq!(*log.borrow(), vec![TriggerEdge::Enter, TriggerEdge::Leave]);

        log.borrow_mut().clear();
        for y in [2400.0, 2000.0, 1100.0, 0.0] {
            triggers.update(y, &mut (), &mut t);
        }
        assert_eq!(
            *log.borrow(),
            vec![TriggerEdge::EnterBack, TriggerEdge::LeaveBack]
        );
    }

    #[test]
    fn jumping_over_the_range_reports_both_edges() {
        let log = Log::default();
        let mut triggers = ScrollTriggers::new();
        let id = triggers.create(logging(&log), bounds(2000.0, 500.0), 800.0);
        let mut t = Tracer::none();

        triggers.update(5000.0, &mut (), &mut t);
        assert_eq!(*log.borrow(), vec![TriggerEdge::Enter, TriggerEdge::Leave]);
        assert_eq!(triggers.progress(id), Some(1.0));

        log.borrow_mut().clear();
        triggers.update(0.0, &mut (), &mut t);
        assert_eq!(
            *log.borrow(),
            vec![TriggerEdge::EnterBack, TriggerEdge::LeaveBack]
        );
        assert_eq!(triggers.progress(id), Some(0.0));
    }

    #[test]
    fn callbacks_can_mutate_the_context() {
        let mut triggers: ScrollTriggers<Vec<f64>> = ScrollTriggers::new();
        triggers.create(
            TriggerDescriptor::default()
                .scrub(Scrub::Direct)
                .on_update(|seen: &mut Vec<f64>, p| seen.push(p)),
            bounds(0.0, 100.0),
            100.0,
        );
        // Range is [-100, 100].
        let mut seen = Vec::new();
        let mut t = Tracer::none();
        triggers.update(0.0, &mut seen, &mut t);
        triggers.update(0.0, &mut seen, &mut t);
        triggers.update(50.0, &mut seen, &mut t);
        assert_eq!(seen, vec![0.5, 0.75], "unchanged progress is not reported");
    }

    #[test]
    fn killed_triggers_stay_silent() {
        let log = Log::default();
        let mut triggers = ScrollTriggers::new();
        let id = triggers.create(logging(&log), bounds(2000.0, 500.0), 800.0);
        assert!(triggers.kill(id));
        assert!(!triggers.kill(id));
        triggers.update(2000.0, &mut (), &mut Tracer::none());
        assert!(log.borrow().is_empty());
        assert_eq!(triggers.progress(id), None);
    }

    #[test]
    fn refresh_recomputes_ranges() {
        let mut triggers: ScrollTriggers = ScrollTriggers::new();
        let id = triggers.create(TriggerDescriptor::default(), bounds(2000.0, 500.0), 800.0);
        triggers.refresh(1000.0, |_| Some(bounds(3000.0, 500.0)));
        let r = triggers.range(id).unwrap();
        assert!((r.start - 2000.0).abs() < 1e-9);
        assert!((r.end - 3500.0).abs() < 1e-9);

        triggers.refresh(800.0, |_| None);
        let r = triggers.range(id).unwrap();
        assert!((r.start - 2200.0).abs() < 1e-9, "previous bounds are kept");
    }

    #[test]
    fn smoothed_scrub_catches_up_over_time() {
        let mut triggers: ScrollTriggers = ScrollTriggers::new();
        let id = triggers.create(
            TriggerDescriptor::default().scrub(Scrub::Smoothed(Duration::from_millis_u64(100))),
            bounds(0.0, 100.0),
            100.0,
        );
        triggers.advance(HostTime(0), &mut ());
        triggers.update(100.0, &mut (), &mut Tracer::none());
        assert_eq!(triggers.progress(id), Some(0.0), "moves only on advance");

        triggers.advance(HostTime(50_000), &mut ());
        let half = triggers.progress(id).unwrap();
        assert!(half > 0.0 && half < 1.0, "{half}");

        triggers.advance(HostTime(200_000), &mut ());
        assert_eq!(triggers.progress(id), Some(1.0));
    }

    #[test]
    fn pin_offset_holds_element_inside_range() {
        let mut triggers: ScrollTriggers = ScrollTriggers::new();
        let pinned = triggers.create(
            TriggerDescriptor::default()
                .range(pos("top top"), pos("bottom top"))
                .pinned(),
            bounds(1000.0, 400.0),
            800.0,
        );
        let loose = triggers.create(TriggerDescriptor::default(), bounds(0.0, 10.0), 800.0);
        assert_eq!(triggers.pin_offset(pinned, 500.0), Some(0.0));
        assert_eq!(triggers.pin_offset(pinned, 1100.0), Some(100.0));
        assert_eq!(triggers.pin_offset(pinned, 9000.0), Some(400.0));
        assert_eq!(triggers.pin_offset(loose, 0.0), None);
    }

    #[test]
    fn edges_are_traced() {
        #[derive(Default)]
        struct Edges(Vec<TriggerEdge>);
        impl TraceSink for Edges {
            fn on_trigger_edge(&mut self, e: &TriggerEdgeEvent) {
                self.0.push(e.edge);
            }
        }

        let mut sink = Edges::default();
        let mut triggers: ScrollTriggers = ScrollTriggers::new();
        triggers.create(TriggerDescriptor::default(), bounds(2000.0, 500.0), 800.0);
        triggers.update(1500.0, &mut (), &mut Tracer::new(&mut sink));
        assert_eq!(sink.0, vec![TriggerEdge::Enter]);
    }
}
