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

//! OpenTSDB exporter: tcollector `put` lines or a JSON point array.

use crate::registry::Registry;
use pulse_core::{Instrument, Tags};
use serde::Serialize;
use std::fmt;
use std::io::{self, BufWriter, Write};
use std::net::TcpStream;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Percentiles emitted for histogram and timer distributions.
const PERCENTILES: [f64; 5] = [0.5, 0.75, 0.90, 0.95, 0.99];
const PERCENTILE_SUFFIXES: [&str; 5] = ["p50", "p75", "p90", "p95", "p99"];

/// Wire format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTsdbFormat {
    /// `put <name> <timestamp> <value> <tags>` lines, one per data point.
    Tcollector,
    /// A JSON array of `{metric, value, timestamp, tags}` objects.
    Json,
}

/// One data point bound for OpenTSDB.
#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub metric: String,
    pub value: PointValue,
    pub timestamp: i64,
    pub tags: Tags,
}

/// A point value, integer or floating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PointValue {
    Int(i64),
    Float(f64),
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointValue::Int(v) => write!(f, "{v}"),
            PointValue::Float(v) => write!(f, "{v:.2}"),
        }
    }
}

type PrecaptureFn = Box<dyn FnMut(&Registry) + Send>;

/// Ships periodic snapshots of a registry to an OpenTSDB endpoint over TCP.
///
/// Each tick runs the pre-capture hooks (sampling callbacks that want to run
/// right before a flush), collects every live metric into [`Point`]s, and
/// writes them in the configured format. A connect or write failure is
/// logged and the tick's points are dropped.
pub struct OpenTsdbExporter {
    addr: String,
    registry: Registry,
    flush_interval: Duration,
    duration_unit: Duration,
    format: OpenTsdbFormat,
    precapture: Vec<PrecaptureFn>,
}

impl OpenTsdbExporter {
    /// Creates an exporter. `duration_unit` scales timer durations (recorded
    /// in nanoseconds) down to the unit reported on the wire.
    pub fn new(
        addr: impl Into<String>,
        registry: Registry,
        flush_interval: Duration,
        duration_unit: Duration,
        format: OpenTsdbFormat,
    ) -> Self {
        Self {
            addr: addr.into(),
            registry,
            flush_interval,
            duration_unit,
            format,
            precapture: Vec::new(),
        }
    }

    /// Adds a hook run before every flush, in registration order.
    pub fn with_precapture(mut self, hook: impl FnMut(&Registry) + Send + 'static) -> Self {
        self.precapture.push(Box::new(hook));
        self
    }

    /// Blocks, flushing every `flush_interval`, until `shutdown` receives a
    /// message or all senders drop.
    pub fn run(&mut self, shutdown: flume::Receiver<()>) {
        loop {
            match shutdown.recv_timeout(self.flush_interval) {
                Err(flume::RecvTimeoutError::Timeout) => {
                    for hook in &mut self.precapture {
                        hook(&self.registry);
                    }
                    if let Err(err) = self.flush_once() {
                        log::warn!("OpenTSDB flush to {} failed: {err}", self.addr);
                    }
                }
                Ok(()) | Err(flume::RecvTimeoutError::Disconnected) => {
                    log::trace!("OpenTSDB exporter for {} shutting down", self.addr);
                    return;
                }
            }
        }
    }

    /// Collects and ships one snapshot.
    pub fn flush_once(&self) -> io::Result<()> {
        let points = collect_points(&self.registry, self.duration_unit, unix_now());
        if points.is_empty() {
            log::trace!("no metrics to send to {}", self.addr);
            return Ok(());
        }

        let stream = TcpStream::connect(&self.addr)?;
        stream.set_write_timeout(Some(self.flush_interval))?;
        let mut writer = BufWriter::new(stream);
        match self.format {
            OpenTsdbFormat::Tcollector => write_lines(&mut writer, &points)?,
            OpenTsdbFormat::Json => {
                serde_json::to_writer(&mut writer, &points)?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()
    }
}

/// Writes one tcollector `put` line per point. The tag field is omitted
/// entirely when a point has no tags.
pub fn write_lines<W: Write>(writer: &mut W, points: &[Point]) -> io::Result<()> {
    for point in points {
        if point.tags.is_empty() {
            writeln!(writer, "put {} {} {}", point.metric, point.timestamp, point.value)?;
        } else {
            writeln!(
                writer,
                "put {} {} {} {}",
                point.metric, point.timestamp, point.value, point.tags
            )?;
        }
    }
    Ok(())
}

/// Enumerates `registry` once and fans each instrument out into its wire
/// points. Histograms and timers emit count/min/max/mean/std-dev plus the
/// fixed percentile set; meters and timers emit EWMA rates; health checks
/// produce no points.
pub fn collect_points(registry: &Registry, duration_unit: Duration, timestamp: i64) -> Vec<Point> {
    let unit = duration_unit.as_nanos().max(1) as i64;
    let mut points = Vec::new();

    registry.each(|name, tm| {
        let name = clean_name(&name);
        let tags = tm.tags().clone();
        let mut push = |suffix: &str, value: PointValue| {
            let metric = if suffix.is_empty() {
                name.clone()
            } else {
                format!("{name}.{suffix}")
            };
            points.push(Point {
                metric,
                value,
                timestamp,
                tags: tags.clone(),
            });
        };

        match tm.instrument() {
            Instrument::Counter(c) => push("", PointValue::Int(c.count())),
            Instrument::Gauge(g) => push("", PointValue::Int(g.value())),
            Instrument::GaugeFloat(g) => push("", PointValue::Float(g.value())),
            Instrument::Histogram(h) => {
                let s = h.snapshot();
                push("count", PointValue::Int(s.count() as i64));
                push("min", PointValue::Int(s.min()));
                push("max", PointValue::Int(s.max()));
                push("mean", PointValue::Float(s.mean()));
                push("std-dev", PointValue::Float(s.std_dev()));
                let ps = s.percentiles(&PERCENTILES);
                for (suffix, p) in PERCENTILE_SUFFIXES.iter().zip(ps) {
                    push(suffix, PointValue::Float(p));
                }
            }
            Instrument::Meter(m) => {
                let s = m.snapshot();
                push("", PointValue::Int(s.count() as i64));
                push("1m-rate", PointValue::Float(s.rate1()));
                push("5m-rate", PointValue::Float(s.rate5()));
                push("15m-rate", PointValue::Float(s.rate15()));
                push("mean-rate", PointValue::Float(s.mean_rate()));
            }
            Instrument::Timer(t) => {
                let s = t.snapshot();
                let unit_f = unit as f64;
                push("count", PointValue::Int(s.count() as i64));
                push("min", PointValue::Int(s.min() / unit));
                push("max", PointValue::Int(s.max() / unit));
                push("mean", PointValue::Float(s.mean() / unit_f));
                push("std-dev", PointValue::Float(s.std_dev() / unit_f));
                let ps = s.percentiles(&PERCENTILES);
                for (suffix, p) in PERCENTILE_SUFFIXES.iter().zip(ps) {
                    push(suffix, PointValue::Float(p / unit_f));
                }
                push("1m-rate", PointValue::Float(s.rate1()));
                push("5m-rate", PointValue::Float(s.rate5()));
                push("15m-rate", PointValue::Float(s.rate15()));
                push("mean-rate", PointValue::Float(s.mean_rate()));
            }
            Instrument::HealthCheck(_) => {}
        }
    });

    points
}

/// Replaces every character outside `[A-Za-z0-9._/-]` with `_`, the charset
/// OpenTSDB accepts in metric names.
pub fn clean_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '/' => c,
            _ => '_',
        })
        .collect()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
