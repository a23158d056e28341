// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::instrument::histogram::{Histogram, HistogramSnapshot};
use crate::instrument::meter::{Meter, MeterSnapshot};
use std::time::{Duration, Instant};

/// Times durations: a histogram of elapsed nanoseconds combined with a meter
/// of timing events. Cloning shares the state.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    /// Creates an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one duration.
    pub fn update(&self, duration: Duration) {
        self.histogram.update(duration.as_nanos() as i64);
        self.meter.mark(1);
    }

    /// Records the time elapsed since `start`.
    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Runs `f`, records how long it took, and returns its result.
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.update_since(start);
        out
    }

    /// Returns the number of durations recorded.
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// Takes a read-only copy of the duration distribution and event rates.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            histogram: self.histogram.snapshot(),
            meter: self.meter.snapshot(),
        }
    }
}

/// A point-in-time copy of a [`Timer`]. Durations are in nanoseconds.
#[derive(Debug, Clone)]
pub struct TimerSnapshot {
    histogram: HistogramSnapshot,
    meter: MeterSnapshot,
}

impl TimerSnapshot {
    /// Number of durations recorded.
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// Shortest duration in the window, in nanoseconds.
    pub fn min(&self) -> i64 {
        self.histogram.min()
    }

    /// Longest duration in the window, in nanoseconds.
    pub fn max(&self) -> i64 {
        self.histogram.max()
    }

    /// Mean duration over the window, in nanoseconds.
    pub fn mean(&self) -> f64 {
        self.histogram.mean()
    }

    /// Standard deviation of the window, in nanoseconds.
    pub fn std_dev(&self) -> f64 {
        self.histogram.std_dev()
    }

    /// An arbitrary percentile of the window, in nanoseconds.
    pub fn percentile(&self, p: f64) -> f64 {
        self.histogram.percentile(p)
    }

    /// Several percentiles of the window, in nanoseconds.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        self.histogram.percentiles(ps)
    }

    /// One-minute EWMA rate of timing events per second.
    pub fn rate1(&self) -> f64 {
        self.meter.rate1()
    }

    /// Five-minute EWMA rate.
    pub fn rate5(&self) -> f64 {
        self.meter.rate5()
    }

    /// Fifteen-minute EWMA rate.
    pub fn rate15(&self) -> f64 {
        self.meter.rate15()
    }

    /// Lifetime mean rate of timing events per second.
    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }
}
