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

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default number of samples retained in the window.
const DEFAULT_WINDOW: usize = 1028;

/// A distribution of integer measurements over a bounded sliding window of
/// the most recent samples. Cloning shares the window.
///
/// The window bounds memory use; the total count keeps growing past it.
#[derive(Debug, Clone)]
pub struct Histogram {
    inner: Arc<Mutex<Window>>,
}

#[derive(Debug)]
struct Window {
    values: VecDeque<i64>,
    capacity: usize,
    count: u64,
}

impl Histogram {
    /// Creates a histogram with the default window size.
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    /// Creates a histogram retaining at most `capacity` recent samples.
    pub fn with_window(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Window {
                values: VecDeque::with_capacity(capacity.min(DEFAULT_WINDOW)),
                capacity: capacity.max(1),
                count: 0,
            })),
        }
    }

    /// Records a new sample.
    pub fn update(&self, value: i64) {
        let mut window = self.inner.lock().unwrap();
        window.count += 1;
        if window.values.len() == window.capacity {
            window.values.pop_front();
        }
        window.values.push_back(value);
    }

    /// Returns the number of samples recorded since the last clear.
    pub fn count(&self) -> u64 {
        self.inner.lock().unwrap().count
    }

    /// Drops all samples and resets the count.
    pub fn clear(&self) {
        let mut window = self.inner.lock().unwrap();
        window.values.clear();
        window.count = 0;
    }

    /// Takes a read-only copy of the current window.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let window = self.inner.lock().unwrap();
        HistogramSnapshot {
            count: window.count,
            values: window.values.iter().copied().collect(),
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of a [`Histogram`] window, in recording order.
#[derive(Debug, Clone)]
pub struct HistogramSnapshot {
    count: u64,
    values: Vec<i64>,
}

impl HistogramSnapshot {
    /// Total samples recorded when the snapshot was taken.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smallest sample in the window, or 0 when empty.
    pub fn min(&self) -> i64 {
        self.values.iter().copied().min().unwrap_or(0)
    }

    /// Largest sample in the window, or 0 when empty.
    pub fn max(&self) -> i64 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// Sum of the samples in the window.
    pub fn sum(&self) -> i64 {
        self.values.iter().sum()
    }

    /// Mean of the samples in the window, or 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum() as f64 / self.values.len() as f64
    }

    /// Sample variance of the window (n-1 denominator), or 0.0 when fewer
    /// than two samples exist.
    pub fn variance(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self
            .values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum();
        sum_sq / (self.values.len() - 1) as f64
    }

    /// Standard deviation of the window.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// The most recently recorded sample in the window, if any.
    pub fn last(&self) -> Option<i64> {
        self.values.last().copied()
    }

    /// An arbitrary percentile (`0.0..=1.0`) of the window, with linear
    /// interpolation between adjacent samples. 0.0 when empty.
    pub fn percentile(&self, p: f64) -> f64 {
        self.percentiles(&[p])[0]
    }

    /// Several percentiles of the window in one sorting pass.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_unstable();
        ps.iter()
            .map(|&p| {
                if sorted.is_empty() {
                    return 0.0;
                }
                let pos = p * (sorted.len() + 1) as f64;
                if pos < 1.0 {
                    sorted[0] as f64
                } else if pos >= sorted.len() as f64 {
                    sorted[sorted.len() - 1] as f64
                } else {
                    let lower = sorted[pos as usize - 1] as f64;
                    let upper = sorted[pos as usize] as f64;
                    lower + (pos - pos.floor()) * (upper - lower)
                }
            })
            .collect()
    }
}
