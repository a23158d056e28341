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

//! Provides the foundational types and data structures for tagged metrics.
//!
//! This crate defines the "common language" of the pulse metrics system: tag
//! sets and their canonical identity, the closed set of measurement
//! instruments, the tagged-metric pairing, and the error taxonomy. It defines
//! the abstract "what" of instrumentation, while `pulse-telemetry` provides
//! the registries that aggregate it and the exporters that ship it to
//! time-series backends.

pub mod error;
pub mod instrument;
pub mod tagged;
pub mod tags;

pub use self::error::{MetricsError, MetricsResult};
pub use self::instrument::{
    Counter, Gauge, GaugeFloat, HealthCheck, HealthStatus, Histogram, HistogramSnapshot,
    Instrument, InstrumentKind, Meter, MeterSnapshot, Timer, TimerSnapshot,
};
pub use self::tagged::TaggedMetric;
pub use self::tags::{Tags, TagsId};
