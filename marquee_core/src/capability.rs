// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device capability detection.
//!
//! [`CapabilityDetector`] holds the latest [`CapabilitySnapshot`]. Consumers
//! only ever read it; the values are written by backend probes through
//! [`CapabilityDetector::apply`], which reports whether anything actually
//! changed so that dependants (parallax bindings in particular) can react.
//!
//! Probes degrade silently. A failed WebGL context creation is reported as
//! [`CapabilitySignal::WebGl`]`(false)` and a missing battery API as
//! [`CapabilitySignal::BatteryUnavailable`], which leaves low-power mode off
//! for the rest of the session.

/// Viewport width at or below which the device is treated as mobile.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// Media query matching the mobile breakpoint.
pub const MOBILE_MEDIA_QUERY: &str = "(max-width: 768px)";

/// Media query matching the reduced-motion accessibility preference.
pub const REDUCED_MOTION_MEDIA_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Battery level below which a discharging device is considered low-power.
pub const LOW_BATTERY_LEVEL: f64 = 0.2;

/// Particle budget for mobile or low-power devices.
pub const PARTICLES_CONSTRAINED: u32 = 100;
/// Particle budget for very dense displays.
pub const PARTICLES_HIGH_DPI: u32 = 300;
/// Particle budget otherwise.
pub const PARTICLES_FULL: u32 = 500;

/// What the current device and browser can do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapabilitySnapshot {
    /// Viewport is at or below [`MOBILE_BREAKPOINT_PX`].
    pub is_mobile: bool,
    /// The user asked the OS/browser to minimize motion.
    pub prefers_reduced_motion: bool,
    /// A WebGL context could be created.
    pub supports_webgl: bool,
    /// `window.devicePixelRatio`.
    pub device_pixel_ratio: f64,
    /// Battery is low and not charging.
    pub is_low_power_mode: bool,
}

impl Default for CapabilitySnapshot {
    /// Desktop defaults used before any probe has run.
    fn default() -> Self {
        Self {
            is_mobile: false,
            prefers_reduced_motion: false,
            supports_webgl: false,
            device_pixel_ratio: 1.0,
            is_low_power_mode: false,
        }
    }
}

impl CapabilitySnapshot {
    /// Heavy 3D content: desktop, motion allowed, WebGL present, not on a
    /// low battery.
    #[must_use]
    pub fn should_enable_3d(&self) -> bool {
        !self.is_mobile
            && !self.prefers_reduced_motion
            && self.supports_webgl
            && !self.is_low_power_mode
    }

    /// Parallax only depends on the motion preference.
    #[must_use]
    pub fn should_enable_parallax(&self) -> bool {
        !self.prefers_reduced_motion
    }

    /// Particle budget; the first matching tier wins.
    #[must_use]
    pub fn recommended_particle_count(&self) -> u32 {
        if self.is_mobile || self.is_low_power_mode {
            PARTICLES_CONSTRAINED
        } else if self.device_pixel_ratio > 2.0 {
            PARTICLES_HIGH_DPI
        } else {
            PARTICLES_FULL
        }
    }
}

/// A single observation from a backend probe or media-query listener.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CapabilitySignal {
    /// The mobile breakpoint query changed (or was first evaluated).
    Viewport {
        /// Whether the breakpoint query matches.
        is_mobile: bool,
    },
    /// The reduced-motion query changed (or was first evaluated).
    ReducedMotion(bool),
    /// Result of the one-time WebGL probe.
    WebGl(bool),
    /// Current device pixel ratio.
    PixelRatio(f64),
    /// Battery status resolved.
    Battery {
        /// Charge level in `[0, 1]`.
        level: f64,
        /// Whether the device is plugged in.
        charging: bool,
    },
    /// The battery API is missing or its promise rejected.
    BatteryUnavailable,
}

/// Which fields a [`CapabilityDetector::apply`] call modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CapabilityChange {
    /// `is_mobile` flipped.
    pub mobile: bool,
    /// `prefers_reduced_motion` flipped.
    pub reduced_motion: bool,
    /// `supports_webgl` flipped.
    pub webgl: bool,
    /// `device_pixel_ratio` changed.
    pub pixel_ratio: bool,
    /// `is_low_power_mode` flipped.
    pub low_power: bool,
}

/// Owner of the process-wide [`CapabilitySnapshot`].
#[derive(Clone, Debug, Default)]
pub struct CapabilityDetector {
    snapshot: CapabilitySnapshot,
}

impl CapabilityDetector {
    /// Creates a detector with [`CapabilitySnapshot::default`] values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector seeded from an initial snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: CapabilitySnapshot) -> Self {
        Self { snapshot }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &CapabilitySnapshot {
        &self.snapshot
    }

    /// Folds a probe observation into the snapshot.
    ///
    /// Returns `None` when the signal did not change anything.
    pub fn apply(&mut self, signal: CapabilitySignal) -> Option<CapabilityChange> {
        let mut change = CapabilityChange::default();
        let s = &mut self.snapshot;
        match signal {
            CapabilitySignal::Viewport { is_mobile } => {
                change.mobile = replace_flag(&mut s.is_mobile, is_mobile);
            }
            CapabilitySignal::ReducedMotion(reduced) => {
                change.reduced_motion = replace_flag(&mut s.prefers_reduced_motion, reduced);
            }
            CapabilitySignal::WebGl(supported) => {
                change.webgl = replace_flag(&mut s.supports_webgl, supported);
            }
            CapabilitySignal::PixelRatio(ratio) => {
                let ratio = if ratio.is_finite() && ratio > 0.0 {
                    ratio
                } else {
                    1.0
                };
                if (s.device_pixel_ratio - ratio).abs() > f64::EPSILON {
                    s.device_pixel_ratio = ratio;
                    change.pixel_ratio = true;
                }
            }
            CapabilitySignal::Battery { level, charging } => {
                let low = level < LOW_BATTERY_LEVEL && !charging;
                change.low_power = replace_flag(&mut s.is_low_power_mode, low);
            }
            CapabilitySignal::BatteryUnavailable => {}
        }
        (change != CapabilityChange::default()).then_some(change)
    }
}

fn replace_flag(slot: &mut bool, value: bool) -> bool {
    let changed = *slot != value;
    *slot = value;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> CapabilitySnapshot {
        CapabilitySnapshot {
            supports_webgl: true,
            ..CapabilitySnapshot::default()
        }
    }

    #[test]
    fn three_d_requires_every_condition() {
        assert!(desktop().should_enable_3d());
        for snapshot in [
            CapabilitySnapshot {
                is_mobile: true,
                ..desktop()
            },
            CapabilitySnapshot {
                prefers_reduced_motion: true,
                ..desktop()
            },
            CapabilitySnapshot {
                supports_webgl: false,
                ..desktop()
            },
            CapabilitySnapshot {
                is_low_power_mode: true,
                ..desktop()
            },
        ] {
            assert!(!snapshot.should_enable_3d(), "{snapshot:?}");
        }
    }

    #[test]
    fn parallax_follows_motion_preference() {
        assert!(desktop().should_enable_parallax());
        let reduced = CapabilitySnapshot {
            prefers_reduced_motion: true,
            ..desktop()
        };
        assert!(!reduced.should_enable_parallax());
    }

    #[test]
    fn particle_tiers_first_match_wins() {
        let mobile_dense = CapabilitySnapshot {
            is_mobile: true,
            device_pixel_ratio: 3.0,
            ..desktop()
        };
        assert_eq!(mobile_dense.recommended_particle_count(), 100);

        let dense = CapabilitySnapshot {
            device_pixel_ratio: 2.5,
            ..desktop()
        };
        assert_eq!(dense.recommended_particle_count(), 300);

        let retina = CapabilitySnapshot {
            device_pixel_ratio: 2.0,
            ..desktop()
        };
        assert_eq!(retina.recommended_particle_count(), 500);
    }

    #[test]
    fn apply_reports_only_real_changes() {
        let mut detector = CapabilityDetector::new();
        assert_eq!(
            detector.apply(CapabilitySignal::ReducedMotion(false)),
            None,
            "default is already false"
        );
        let change = detector
            .apply(CapabilitySignal::ReducedMotion(true))
            .unwrap();
        assert!(change.reduced_motion);
        assert!(!change.mobile);
        assert!(detector.snapshot().prefers_reduced_motion);
    }

    #[test]
    fn battery_sets_low_power_only_when_discharging() {
        let mut detector = CapabilityDetector::new();
        detector.apply(CapabilitySignal::Battery {
            level: 0.1,
            charging: true,
        });
        assert!(!detector.snapshot().is_low_power_mode);

        detector.apply(CapabilitySignal::Battery {
            level: 0.1,
            charging: false,
        });
        assert!(detector.snapshot().is_low_power_mode);
    }

    #[test]
    fn unavailable_battery_is_silent() {
        let mut detector = CapabilityDetector::new();
        assert_eq!(detector.apply(CapabilitySignal::BatteryUnavailable), None);
        assert!(!detector.snapshot().is_low_power_mode);
    }

    #[test]
    fn invalid_pixel_ratio_falls_back_to_one() {
        let mut detector = CapabilityDetector::new();
        detector.apply(CapabilitySignal::PixelRatio(3.0));
        detector.apply(CapabilitySignal::PixelRatio(f64::NAN));
        assert!((detector.snapshot().device_pixel_ratio - 1.0).abs() < f64::EPSILON);
    }
}
