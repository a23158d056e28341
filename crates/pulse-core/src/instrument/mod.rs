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

//! Measurement instruments and the closed capability set over them.
//!
//! Every instrument is a cheap-to-clone shared handle: cloning shares the
//! underlying state, so a handle returned by a registry and a handle held by
//! the instrumented code always observe the same values.

mod counter;
mod gauge;
mod healthcheck;
mod histogram;
mod meter;
mod timer;

pub use self::counter::Counter;
pub use self::gauge::{Gauge, GaugeFloat};
pub use self::healthcheck::{HealthCheck, HealthStatus};
pub use self::histogram::{Histogram, HistogramSnapshot};
pub use self::meter::{Meter, MeterSnapshot};
pub use self::timer::{Timer, TimerSnapshot};

/// The fundamental kind of an instrument. Registries and exporters dispatch
/// on this explicit tag instead of inspecting runtime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// A signed count that can be incremented and decremented.
    Counter,
    /// An integer value that is replaced on every update.
    Gauge,
    /// A floating-point value that is replaced on every update.
    GaugeFloat,
    /// A distribution of integer measurements.
    Histogram,
    /// An event rate (1m/5m/15m EWMA plus mean).
    Meter,
    /// A histogram of durations combined with an event rate.
    Timer,
    /// A callable liveness probe with a stored result.
    HealthCheck,
}

/// A measurement instrument handle.
///
/// This is the closed set of capabilities a registry accepts; there is no
/// open-ended "any handle" escape hatch.
#[derive(Debug, Clone)]
pub enum Instrument {
    /// See [`Counter`].
    Counter(Counter),
    /// See [`Gauge`].
    Gauge(Gauge),
    /// See [`GaugeFloat`].
    GaugeFloat(GaugeFloat),
    /// See [`Histogram`].
    Histogram(Histogram),
    /// See [`Meter`].
    Meter(Meter),
    /// See [`Timer`].
    Timer(Timer),
    /// See [`HealthCheck`].
    HealthCheck(HealthCheck),
}

impl Instrument {
    /// Returns the [`InstrumentKind`] of this handle.
    pub fn kind(&self) -> InstrumentKind {
        match self {
            Instrument::Counter(_) => InstrumentKind::Counter,
            Instrument::Gauge(_) => InstrumentKind::Gauge,
            Instrument::GaugeFloat(_) => InstrumentKind::GaugeFloat,
            Instrument::Histogram(_) => InstrumentKind::Histogram,
            Instrument::Meter(_) => InstrumentKind::Meter,
            Instrument::Timer(_) => InstrumentKind::Timer,
            Instrument::HealthCheck(_) => InstrumentKind::HealthCheck,
        }
    }

    /// Returns the inner handle if this is a `Counter`.
    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            Instrument::Counter(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the inner handle if this is a `Gauge`.
    pub fn as_gauge(&self) -> Option<&Gauge> {
        match self {
            Instrument::Gauge(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the inner handle if this is a `GaugeFloat`.
    pub fn as_gauge_float(&self) -> Option<&GaugeFloat> {
        match self {
            Instrument::GaugeFloat(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the inner handle if this is a `Histogram`.
    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            Instrument::Histogram(h) => Some(h),
            _ => None,
        }
    }

    /// Returns the inner handle if this is a `Meter`.
    pub fn as_meter(&self) -> Option<&Meter> {
        match self {
            Instrument::Meter(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the inner handle if this is a `Timer`.
    pub fn as_timer(&self) -> Option<&Timer> {
        match self {
            Instrument::Timer(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the inner handle if this is a `HealthCheck`.
    pub fn as_health_check(&self) -> Option<&HealthCheck> {
        match self {
            Instrument::HealthCheck(h) => Some(h),
            _ => None,
        }
    }
}

impl From<Counter> for Instrument {
    fn from(c: Counter) -> Self {
        Instrument::Counter(c)
    }
}

impl From<Gauge> for Instrument {
    fn from(g: Gauge) -> Self {
        Instrument::Gauge(g)
    }
}

impl From<GaugeFloat> for Instrument {
    fn from(g: GaugeFloat) -> Self {
        Instrument::GaugeFloat(g)
    }
}

impl From<Histogram> for Instrument {
    fn from(h: Histogram) -> Self {
        Instrument::Histogram(h)
    }
}

impl From<Meter> for Instrument {
    fn from(m: Meter) -> Self {
        Instrument::Meter(m)
    }
}

impl From<Timer> for Instrument {
    fn from(t: Timer) -> Self {
        Instrument::Timer(t)
    }
}

impl From<HealthCheck> for Instrument {
    fn from(h: HealthCheck) -> Self {
        Instrument::HealthCheck(h)
    }
}
