// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time in microsecond ticks.
//!
//! Browsers deliver frame timestamps as `DOMHighResTimeStamp` values, i.e.
//! fractional milliseconds since page load. [`HostTime`] stores them as whole
//! microseconds so that deadline comparisons are exact and `Ord`, while
//! [`HostTime::from_millis`] and [`HostTime::as_millis`] convert at the edges.
//!
//! Every timer in this crate (scene choreography, reveal delays, typewriter
//! pacing, throttling) is a deadline expressed as a [`HostTime`] and checked
//! against the time carried by the current frame.

use core::fmt;
use core::ops::{Add, Sub};

/// Microseconds per millisecond.
const MICROS_PER_MILLI: f64 = 1000.0;

/// A point in time expressed as microsecond ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts a `DOMHighResTimeStamp`-style millisecond value.
    ///
    /// Negative and non-finite inputs map to zero.
    #[inline]
    #[must_use]
    pub fn from_millis(ms: f64) -> Self {
        Self(millis_to_ticks(ms))
    }

    /// Returns this time in fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / MICROS_PER_MILLI
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Saturating addition of a duration.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}µs)", self.0)
    }
}

/// A duration in microsecond ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// One second.
    pub const SECOND: Self = Self::from_millis_u64(1000);

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis_u64(ms: u64) -> Self {
        Self(ms.saturating_mul(1000))
    }

    /// Creates a duration from fractional milliseconds.
    ///
    /// Negative and non-finite inputs map to zero.
    #[inline]
    #[must_use]
    pub fn from_millis(ms: f64) -> Self {
        Self(millis_to_ticks(ms))
    }

    /// Creates a duration from fractional seconds.
    #[inline]
    #[must_use]
    pub fn from_secs(secs: f64) -> Self {
        Self::from_millis(secs * 1000.0)
    }

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns this duration in fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / MICROS_PER_MILLI
    }

    /// Returns this duration in fractional seconds.
    #[inline]
    #[must_use]
    pub fn as_secs(self) -> f64 {
        self.as_millis() / 1000.0
    }

    /// Multiplies the duration by an integer factor, saturating.
    #[inline]
    #[must_use]
    pub const fn saturating_mul(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}µs)", self.0)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "input is clamped to a finite non-negative value; µs fits in u64"
)]
fn millis_to_ticks(ms: f64) -> u64 {
    if !ms.is_finite() || ms <= 0.0 {
        return 0;
    }
    libm::round(ms * MICROS_PER_MILLI) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_round_trip() {
        let t = HostTime::from_millis(16.667);
        assert_eq!(t.ticks(), 16_667);
        assert!((t.as_millis() - 16.667).abs() < 1e-9);
    }

    #[test]
    fn negative_and_nan_millis_clamp_to_zero() {
        assert_eq!(HostTime::from_millis(-5.0), HostTime(0));
        assert_eq!(HostTime::from_millis(f64::NAN), HostTime(0));
        assert_eq!(Duration::from_millis(f64::INFINITY), Duration::ZERO);
    }

    #[test]
    fn duration_arithmetic() {
        let a = Duration::from_millis_u64(100);
        let b = Duration::from_millis_u64(30);
        assert_eq!((a + b).ticks(), 130_000);
        assert_eq!((a - b).ticks(), 70_000);
        assert_eq!(b - a, Duration::ZERO, "subtraction saturates");
        assert_eq!(b.saturating_mul(3), Duration::from_millis_u64(90));
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        let d = Duration(200);
        assert_eq!((t + d).ticks(), 1200);
        assert_eq!(t - HostTime(400), Duration(600));
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
    }

    #[test]
    fn seconds_conversion() {
        assert_eq!(Duration::from_secs(1.2), Duration::from_millis_u64(1200));
        assert!((Duration::SECOND.as_secs() - 1.0).abs() < f64::EPSILON);
    }
}
