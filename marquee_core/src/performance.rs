// Copyright 2026 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-rate sampling and performance scoring.
//!
//! [`PerformanceSampler`] is fed one timestamp per animation frame via
//! [`record_frame`](PerformanceSampler::record_frame). Frame deltas go into a
//! fixed-capacity [`FrameRing`]; once at least one aggregation window
//! (default one second) has elapsed, a new [`PerformanceSnapshot`] is computed:
//!
//! ```text
//! fps               = round(frames * 1000 / elapsed_ms)
//! avg_frame_time    = mean(buffered deltas)      (nominal if empty)
//! performance_score = 100 if fps >= target
//!                     0   if fps <= critical
//!                     round(fps / target * 100)  otherwise
//! is_low_performance = fps < low_fps
//! ```
//!
//! Derived policy helpers on the snapshot translate the score into effect
//! budgets.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::ConfigError;
use crate::time::{Duration, HostTime};
use crate::trace::{FrameRateWarning, PerformanceSampleEvent, Tracer};

/// Configuration for the [`PerformanceSampler`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Frame rate considered "full speed".
    pub target_fps: u32,
    /// Capacity of the frame-delta ring buffer.
    pub sample_size: usize,
    /// Below this rate the snapshot is flagged as low performance.
    pub low_fps: u32,
    /// At or below this rate the score is zero; below it a warning is traced.
    pub critical_fps: u32,
    /// Minimum time between aggregations.
    pub window: Duration,
    /// Emit [`FrameRateWarning`]s for critical readings.
    pub auto_degrade: bool,
}

impl SamplerConfig {
    /// Defaults for a 60 Hz browser page.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            target_fps: 60,
            sample_size: 60,
            low_fps: 30,
            critical_fps: 20,
            window: Duration::SECOND,
            auto_degrade: true,
        }
    }

    /// Checks that counts are positive and thresholds are ordered
    /// `critical_fps <= low_fps <= target_fps`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::Zero {
                field: "target_fps",
            });
        }
        if self.sample_size == 0 {
            return Err(ConfigError::Zero {
                field: "sample_size",
            });
        }
        if self.window == Duration::ZERO {
            return Err(ConfigError::Zero { field: "window" });
        }
        if self.critical_fps > self.low_fps {
            return Err(ConfigError::Ordering {
                lower: "critical_fps",
                upper: "low_fps",
            });
        }
        if self.low_fps > self.target_fps {
            return Err(ConfigError::Ordering {
                lower: "low_fps",
                upper: "target_fps",
            });
        }
        Ok(())
    }

    /// Frame time in milliseconds at the target rate.
    #[must_use]
    pub fn nominal_frame_time(&self) -> f64 {
        1000.0 / f64::from(self.target_fps.max(1))
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::web()
    }
}

/// Smoothed frame-rate estimate for the most recent window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceSnapshot {
    /// Frames per second over the last window.
    pub fps: u32,
    /// Most recent frame delta in milliseconds.
    pub frame_time: f64,
    /// Mean of the buffered frame deltas in milliseconds.
    pub avg_frame_time: f64,
    /// JS heap usage in MiB, where the browser exposes it.
    pub memory_usage_mb: Option<u32>,
    /// Score in `[0, 100]`.
    pub performance_score: u8,
    /// `fps` is below the low threshold.
    pub is_low_performance: bool,
}

impl PerformanceSnapshot {
    /// The optimistic snapshot reported before the first window closes.
    #[must_use]
    pub fn nominal(config: &SamplerConfig) -> Self {
        let frame_time = config.nominal_frame_time();
        Self {
            fps: config.target_fps,
            frame_time,
            avg_frame_time: frame_time,
            memory_usage_mb: None,
            performance_score: 100,
            is_low_performance: false,
        }
    }

    /// Trim optional effects when the score drops below 60.
    #[must_use]
    pub fn should_reduce_effects(&self) -> bool {
        self.performance_score < 60
    }

    /// Stop decorative animation entirely when the score drops below 30.
    #[must_use]
    pub fn should_disable_animations(&self) -> bool {
        self.performance_score < 30
    }

    /// Scale factor for particle budgets.
    #[must_use]
    pub fn recommended_particle_multiplier(&self) -> f64 {
        match self.performance_score {
            80.. => 1.0,
            60..=79 => 0.7,
            40..=59 => 0.5,
            _ => 0.3,
        }
    }
}

/// Maps a frame rate to a score in `[0, 100]`.
///
/// Piecewise: 100 at or above `target`, 0 at or below `critical`, and the
/// rounded percentage of `target` in between.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "fps < target, so the percentage lies in [0, 100)"
)]
pub fn performance_score(fps: u32, target: u32, critical: u32) -> u8 {
    if fps >= target {
        return 100;
    }
    if fps <= critical {
        return 0;
    }
    libm::round(f64::from(fps) / f64::from(target) * 100.0) as u8
}

/// Fixed-capacity ring buffer of frame deltas in milliseconds.
///
/// Once full, each push overwrites the oldest sample.
#[derive(Clone, Debug)]
pub struct FrameRing {
    samples: Vec<f64>,
    capacity: usize,
    cursor: usize,
}

impl FrameRing {
    /// Creates an empty ring holding at most `capacity` samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Appends a sample, dropping the oldest when full.
    pub fn push(&mut self, delta_ms: f64) {
        if self.samples.len() < self.capacity {
            self.samples.push(delta_ms);
        } else {
            self.samples[self.cursor] = delta_ms;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Number of buffered samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no samples are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Removes every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.cursor = 0;
    }

    /// The most recently pushed sample.
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = (self.cursor + self.capacity - 1) % self.capacity;
        self.samples.get(idx).copied()
    }

    /// Mean of the buffered samples.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Iterates samples oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = if self.samples.len() < self.capacity {
            0
        } else {
            self.cursor
        };
        let len = self.samples.len();
        (0..len).map(move |i| self.samples[(start + i) % len])
    }
}

/// Reads the current JS heap usage in bytes, if the platform exposes it.
pub type MemoryProbe = Box<dyn Fn() -> Option<u64>>;

/// Per-frame timer producing [`PerformanceSnapshot`]s.
pub struct PerformanceSampler {
    config: SamplerConfig,
    ring: FrameRing,
    last_frame: Option<HostTime>,
    frame_count: u32,
    window_start: HostTime,
    monitoring: bool,
    snapshot: PerformanceSnapshot,
    memory_probe: Option<MemoryProbe>,
}

impl core::fmt::Debug for PerformanceSampler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PerformanceSampler")
            .field("config", &self.config)
            .field("buffered", &self.ring.len())
            .field("frame_count", &self.frame_count)
            .field("monitoring", &self.monitoring)
            .field("snapshot", &self.snapshot)
            .field("memory_probe", &self.memory_probe.is_some())
            .finish_non_exhaustive()
    }
}

impl PerformanceSampler {
    /// Creates a sampler that is **not yet monitoring**.
    pub fn new(config: SamplerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ring: FrameRing::new(config.sample_size),
            last_frame: None,
            frame_count: 0,
            window_start: HostTime(0),
            monitoring: false,
            snapshot: PerformanceSnapshot::nominal(&config),
            memory_probe: None,
            config,
        })
    }

    /// Installs a heap-usage probe consulted once per window.
    #[must_use]
    pub fn with_memory_probe(mut self, probe: MemoryProbe) -> Self {
        self.memory_probe = Some(probe);
        self
    }

    /// Replaces the heap-usage probe of a sampler that is already shared.
    pub fn set_memory_probe(&mut self, probe: MemoryProbe) {
        self.memory_probe = Some(probe);
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Returns the latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &PerformanceSnapshot {
        &self.snapshot
    }

    /// Returns `true` while frames are being recorded.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Starts a fresh measurement at `now`.
    ///
    /// If already monitoring, this is a no-op.
    pub fn start_monitoring(&mut self, now: HostTime) {
        if self.monitoring {
            return;
        }
        self.monitoring = true;
        self.last_frame = None;
        self.frame_count = 0;
        self.window_start = now;
        self.ring.clear();
    }

    /// Stops recording. The last snapshot stays readable.
    ///
    /// If not monitoring, this is a no-op.
    pub fn stop_monitoring(&mut self) {
        self.monitoring = false;
    }

    /// Records one animation frame.
    ///
    /// Returns the new snapshot when this frame closed an aggregation window.
    pub fn record_frame(
        &mut self,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Option<PerformanceSnapshot> {
        if !self.monitoring {
            return None;
        }

        if let Some(last) = self.last_frame {
            self.ring.push(now.saturating_duration_since(last).as_millis());
        }
        self.last_frame = Some(now);
        self.frame_count = self.frame_count.saturating_add(1);

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.config.window {
            return None;
        }

        let snapshot = self.aggregate(elapsed);
        self.snapshot = snapshot;
        self.frame_count = 0;
        self.window_start = now;

        tracer.performance_sample(&PerformanceSampleEvent { at: now, snapshot });
        if self.config.auto_degrade && snapshot.fps < self.config.critical_fps {
            tracer.frame_rate_warning(&FrameRateWarning {
                at: now,
                fps: snapshot.fps,
                critical_fps: self.config.critical_fps,
            });
        }
        Some(snapshot)
    }

    fn aggregate(&self, elapsed: Duration) -> PerformanceSnapshot {
        let nominal = self.config.nominal_frame_time();
        let rate = f64::from(self.frame_count) * 1000.0 / elapsed.as_millis();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "frame rate over a non-empty window is small and non-negative"
        )]
        let fps = libm::round(rate) as u32;

        let memory_usage_mb = self
            .memory_probe
            .as_ref()
            .and_then(|probe| probe())
            .map(heap_mebibytes);

        PerformanceSnapshot {
            fps,
            frame_time: self.ring.latest().unwrap_or(nominal),
            avg_frame_time: self.ring.mean().unwrap_or(nominal),
            memory_usage_mb,
            performance_score: performance_score(
                fps,
                self.config.target_fps,
                self.config.critical_fps,
            ),
            is_low_performance: fps < self.config.low_fps,
        }
    }
}

/// Heap bytes rounded to the nearest whole mebibyte.
fn heap_mebibytes(bytes: u64) -> u32 {
    const MIB: u64 = 1024 * 1024;
    u32::try_from(bytes.saturating_add(MIB / 2) / MIB).unwrap_or(u32::MAX)
}
