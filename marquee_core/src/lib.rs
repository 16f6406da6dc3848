// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Performance-adaptive scroll and animation coordination.
//!
//! `marquee_core` holds the platform-independent half of a scroll-driven
//! page: device capability readings, a frame-rate sampler, a scroll store,
//! declarative scroll triggers, and the scene gatekeeper that decides which
//! heavy effects may run. It is `no_std` compatible (with `alloc`). Every
//! timer is a deadline checked against a caller-supplied [`HostTime`], so the
//! whole crate is driven by the backend's frame loop and testable without one.
//!
//! # Architecture
//!
//! ```text
//!   Backend probes ──► CapabilitySignal ──► CapabilityDetector ─┐
//!   Frame loop ──────► PerformanceSampler ──────────────────────┴─► EffectGates
//!       │
//!       ├──► ScrollBridge ──► ScrollStore ◄── ScrollTriggers (section progress)
//!       │                          │
//!       │                          └──► active section ──► SceneManager
//!       │
//!       └──► ParallaxController / Reveal / Typewriter (per-view helpers)
//! ```
//!
//! **[`context`]**: [`MotionContext`](context::MotionContext) wires the
//! shared pieces together and is what backends hold.
//!
//! **[`capability`]**: Device capability snapshot and its derived effect
//! recommendations.
//!
//! **[`performance`]**: Rolling frame-time sampler with a 0-100 score and
//! low/critical frame-rate warnings.
//!
//! **[`scroll`]**: Scroll store (offset, viewport, document height, active
//! section, per-section progress) and the throttled document progress meter.
//!
//! **[`trigger`]**: Scroll-position triggers with enter/leave edges and
//! direct or smoothed progress.
//!
//! **[`section`]**: Section tracking from intersection batches and the
//! per-section progress trigger.
//!
//! **[`scene`]**: Scene state machine with exit/enter choreography and the
//! [`EffectGates`](scene::EffectGates) decision.
//!
//! **[`bridge`]**: Smooth-scroll engine trait and the bridge that feeds it.
//!
//! **[`parallax`]**, **[`reveal`]**, **[`typewriter`]**: View helpers.
//!
//! **[`snapshot`]**: Paginated snapshot export over a host trait.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with the [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod bridge;
pub mod capability;
pub mod context;
pub mod error;
pub mod parallax;
pub mod performance;
pub mod reveal;
pub mod scene;
pub mod scroll;
pub mod section;
pub mod snapshot;
pub mod time;
pub mod trace;
pub mod trigger;
pub mod typewriter;

pub use time::{Duration, HostTime};
