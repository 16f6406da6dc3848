// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `IntersectionObserver` batches.
//!
//! Each callback invocation is one batch: the entries whose intersection
//! changed since the previous one. Every entry is handed to Rust as an
//! [`ObservedEntry`]: the [`IntersectionSample`] the active-section tracker
//! consumes, keyed by element id, plus the position of the target among the
//! observed elements. Positions are resolved by element identity, so targets
//! without an id (or sharing one) stay distinct.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Object};
use marquee_core::reveal::RevealOptions;
use marquee_core::section::{
    ACTIVE_SECTION_ROOT_MARGIN, ACTIVE_SECTION_THRESHOLDS, IntersectionSample,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::JsFailure;

/// Observer construction options.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    /// Intersection ratios that produce a callback.
    pub thresholds: Vec<f64>,
    /// CSS margin around the root, e.g. `"0px 0px -50px 0px"`.
    pub root_margin: String,
}

impl ObserverOptions {
    /// Options for active-section tracking.
    #[must_use]
    pub fn sections() -> Self {
        Self {
            thresholds: ACTIVE_SECTION_THRESHOLDS.to_vec(),
            root_margin: ACTIVE_SECTION_ROOT_MARGIN.into(),
        }
    }

    /// Options matching a reveal configuration.
    #[must_use]
    pub fn reveal(options: &RevealOptions) -> Self {
        Self {
            thresholds: vec![options.threshold],
            root_margin: options.root_margin.to_string(),
        }
    }

    fn to_init(&self) -> IntersectionObserverInit {
        let init = IntersectionObserverInit::new();
        let thresholds: Array = self.thresholds.iter().map(|&t| JsValue::from_f64(t)).collect();
        init.set_threshold(&thresholds);
        init.set_root_margin(&self.root_margin);
        init
    }
}

/// One observer entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservedEntry<'a> {
    /// Position of the target in [`observe`](IntersectionWatch::observe)
    /// order, `None` if it was never observed through this watch.
    pub target: Option<usize>,
    /// The entry's intersection state, keyed by the target's id.
    pub sample: IntersectionSample<'a>,
}

/// Targets in observe order. Positions stay stable after `unobserve`.
#[derive(Debug)]
struct ObservedTargets<T> {
    targets: Vec<T>,
}

impl<T> ObservedTargets<T> {
    fn new() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    fn push(&mut self, target: T) -> usize {
        self.targets.push(target);
        self.targets.len() - 1
    }

    fn position(&self, is_target: impl Fn(&T) -> bool) -> Option<usize> {
        self.targets.iter().position(is_target)
    }
}

type BatchClosure = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// An intersection observer delivering batches of entries.
///
/// Dropping the watch disconnects the observer.
pub struct IntersectionWatch {
    observer: IntersectionObserver,
    targets: Rc<RefCell<ObservedTargets<Element>>>,
    _callback: BatchClosure,
}

impl IntersectionWatch {
    /// Creates an observer; add targets with [`observe`](Self::observe).
    pub fn new(
        options: &ObserverOptions,
        mut on_batch: impl FnMut(&[ObservedEntry<'_>]) + 'static,
    ) -> Result<Self, JsFailure> {
        let targets = Rc::new(RefCell::new(ObservedTargets::<Element>::new()));
        let lookup = Rc::clone(&targets);
        let callback = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
            let Ok(observed) = lookup.try_borrow() else {
                return;
            };
            let raw: Vec<(Option<usize>, String, bool, f64)> = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| {
                    let target = entry.target();
                    (
                        observed.position(|el| Object::is(el, &target)),
                        target.id(),
                        entry.is_intersecting(),
                        entry.intersection_ratio(),
                    )
                })
                .collect();
            drop(observed);
            let batch: Vec<ObservedEntry<'_>> = raw
                .iter()
                .map(|(target, id, is_intersecting, ratio)| ObservedEntry {
                    target: *target,
                    sample: IntersectionSample {
                        id,
                        is_intersecting: *is_intersecting,
                        ratio: *ratio,
                    },
                })
                .collect();
            on_batch(&batch);
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let observer = IntersectionObserver::new_with_options(
            callback.as_ref().unchecked_ref(),
            &options.to_init(),
        )?;
        Ok(Self {
            observer,
            targets,
            _callback: callback,
        })
    }

    /// Starts observing `element` and returns its position, which entries
    /// for it carry as [`ObservedEntry::target`].
    pub fn observe(&self, element: &Element) -> usize {
        let index = self.targets.borrow_mut().push(element.clone());
        self.observer.observe(element);
        index
    }

    /// A handle that can stop observing targets from inside a batch callback.
    #[must_use]
    pub fn unobserver(&self) -> Unobserver {
        Unobserver(self.observer.clone())
    }

    /// Stops observing `element`.
    pub fn unobserve(&self, element: &Element) {
        self.observer.unobserve(element);
    }
}

/// Stops observation on the watch it came from.
#[derive(Clone, Debug)]
pub struct Unobserver(IntersectionObserver);

impl Unobserver {
    /// Stops observing `element`. Entries already queued may still arrive.
    pub fn unobserve(&self, element: &Element) {
        self.0.unobserve(element);
    }
}

impl Drop for IntersectionWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl core::fmt::Debug for IntersectionWatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntersectionWatch").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_options_carry_threshold_and_margin() {
        let options = ObserverOptions::reveal(&RevealOptions::standard());
        assert_eq!(options.thresholds, [0.1]);
        assert_eq!(options.root_margin, "0px 0px -50px 0px");
    }

    #[test]
    fn targets_resolve_by_identity_not_by_id() {
        // Three targets without an id attribute all report the same id.
        let nodes: Vec<Rc<str>> = vec![Rc::from(""), Rc::from(""), Rc::from("")];
        let mut observed = ObservedTargets::new();
        for node in &nodes {
            observed.push(Rc::clone(node));
        }
        for (expected, node) in nodes.iter().enumerate() {
            assert_eq!(
                observed.position(|candidate| Rc::ptr_eq(candidate, node)),
                Some(expected)
            );
        }
        let stranger: Rc<str> = Rc::from("");
        assert_eq!(
            observed.position(|candidate| Rc::ptr_eq(candidate, &stranger)),
            None
        );
    }

    #[test]
    fn section_options_use_five_thresholds() {
        let options = ObserverOptions::sections();
        assert_eq!(options.thresholds.len(), 5);
        assert_eq!(options.root_margin, "-20% 0px -20% 0px");
    }
}
