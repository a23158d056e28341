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

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// EWMA decay is applied in fixed 5-second intervals.
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// An event-rate meter: total count plus 1-, 5- and 15-minute exponentially
/// weighted moving average rates and the lifetime mean rate. Cloning shares
/// the state.
///
/// Ticks are applied lazily on access instead of from a background thread.
#[derive(Debug, Clone)]
pub struct Meter {
    inner: Arc<Mutex<MeterState>>,
}

#[derive(Debug)]
struct MeterState {
    count: u64,
    start: Instant,
    last_tick: Instant,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl Meter {
    /// Creates a meter with zero events.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            inner: Arc::new(Mutex::new(MeterState {
                count: 0,
                start: now,
                last_tick: now,
                m1: Ewma::new(1.0),
                m5: Ewma::new(5.0),
                m15: Ewma::new(15.0),
            })),
        }
    }

    /// Records `n` events.
    pub fn mark(&self, n: u64) {
        let mut state = self.inner.lock().unwrap();
        state.tick_if_needed();
        state.count += n;
        state.m1.update(n);
        state.m5.update(n);
        state.m15.update(n);
    }

    /// Returns the number of events recorded.
    pub fn count(&self) -> u64 {
        self.inner.lock().unwrap().count
    }

    /// Takes a read-only copy of the current rates.
    pub fn snapshot(&self) -> MeterSnapshot {
        let mut state = self.inner.lock().unwrap();
        state.tick_if_needed();
        let elapsed = state.start.elapsed().as_secs_f64();
        MeterSnapshot {
            count: state.count,
            rate1: state.m1.rate(),
            rate5: state.m5.rate(),
            rate15: state.m15.rate(),
            mean_rate: if state.count == 0 || elapsed == 0.0 {
                0.0
            } else {
                state.count as f64 / elapsed
            },
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterState {
    /// Applies one EWMA tick per elapsed 5-second interval.
    fn tick_if_needed(&mut self) {
        while self.last_tick.elapsed() >= TICK_INTERVAL {
            self.m1.tick();
            self.m5.tick();
            self.m15.tick();
            self.last_tick += TICK_INTERVAL;
        }
    }
}

/// A point-in-time copy of a [`Meter`]'s count and rates (events/second).
#[derive(Debug, Clone, Copy)]
pub struct MeterSnapshot {
    count: u64,
    rate1: f64,
    rate5: f64,
    rate15: f64,
    mean_rate: f64,
}

impl MeterSnapshot {
    /// Total events recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// One-minute EWMA rate.
    pub fn rate1(&self) -> f64 {
        self.rate1
    }

    /// Five-minute EWMA rate.
    pub fn rate5(&self) -> f64 {
        self.rate5
    }

    /// Fifteen-minute EWMA rate.
    pub fn rate15(&self) -> f64 {
        self.rate15
    }

    /// Lifetime mean rate.
    pub fn mean_rate(&self) -> f64 {
        self.mean_rate
    }
}

/// One exponentially weighted moving average over 5-second ticks.
#[derive(Debug)]
struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
    uncounted: u64,
}

impl Ewma {
    fn new(minutes: f64) -> Self {
        Self {
            alpha: 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp(),
            rate: 0.0,
            initialized: false,
            uncounted: 0,
        }
    }

    fn update(&mut self, n: u64) {
        self.uncounted += n;
    }

    fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}
