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

//! Bridges a registry into Prometheus text exposition format.

use crate::registry::Registry;
use pulse_core::{Instrument, Tags};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::Duration;

/// Maps every surfaced metric to a Prometheus gauge sample.
///
/// Per instrument kind: counters report their count, gauges their value,
/// histograms the most recent window sample, timers their one-minute rate.
/// Meters and health checks are not bridged. Names are flattened to
/// `namespace_subsystem_name` with Prometheus-illegal characters replaced;
/// tags become labels.
///
/// [`Self::update_once`] refreshes the samples; [`Self::render`] serves them
/// as a text-format scrape body.
#[derive(Debug)]
pub struct PrometheusBridge {
    registry: Registry,
    namespace: String,
    subsystem: String,
    flush_interval: Duration,
    // flattened name -> rendered label set -> last value
    gauges: Mutex<BTreeMap<String, BTreeMap<String, f64>>>,
}

impl PrometheusBridge {
    /// Creates a bridge over `registry`. `namespace` and `subsystem` prefix
    /// every produced gauge name.
    pub fn new(
        registry: Registry,
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        flush_interval: Duration,
    ) -> Self {
        Self {
            registry,
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            flush_interval,
            gauges: Mutex::new(BTreeMap::new()),
        }
    }

    /// Blocks, refreshing the samples every `flush_interval`, until
    /// `shutdown` receives a message or all senders drop.
    pub fn run(&self, shutdown: flume::Receiver<()>) {
        loop {
            match shutdown.recv_timeout(self.flush_interval) {
                Err(flume::RecvTimeoutError::Timeout) => self.update_once(),
                Ok(()) | Err(flume::RecvTimeoutError::Disconnected) => {
                    log::trace!("prometheus bridge shutting down");
                    return;
                }
            }
        }
    }

    /// Enumerates the registry once and refreshes the gauge samples. Names
    /// seen before keep their slot; a name that stops surfacing keeps its
    /// last value, matching scrape-cache behavior.
    pub fn update_once(&self) {
        let mut samples: Vec<(String, String, f64)> = Vec::new();
        self.registry.each(|name, tm| {
            let value = match tm.instrument() {
                Instrument::Counter(c) => Some(c.count() as f64),
                Instrument::Gauge(g) => Some(g.value() as f64),
                Instrument::GaugeFloat(g) => Some(g.value()),
                Instrument::Histogram(h) => h.snapshot().last().map(|v| v as f64),
                Instrument::Timer(t) => Some(t.snapshot().rate1()),
                Instrument::Meter(_) | Instrument::HealthCheck(_) => None,
            };
            if let Some(value) = value {
                samples.push((self.full_name(&name), render_labels(tm.tags()), value));
            }
        });

        let mut gauges = self.gauges.lock().unwrap();
        for (name, labels, value) in samples {
            gauges.entry(name).or_default().insert(labels, value);
        }
    }

    /// Renders the current samples in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let gauges = self.gauges.lock().unwrap();
        let mut out = String::new();
        for (name, series) in gauges.iter() {
            let _ = writeln!(out, "# HELP {name} {name}");
            let _ = writeln!(out, "# TYPE {name} gauge");
            for (labels, value) in series {
                let _ = writeln!(out, "{name}{labels} {value}");
            }
        }
        out
    }

    fn full_name(&self, name: &str) -> String {
        format!(
            "{}_{}_{}",
            flatten_key(&self.namespace),
            flatten_key(&self.subsystem),
            flatten_key(name)
        )
    }
}

/// Replaces the characters Prometheus rejects in metric names (space, dot,
/// dash, equals) with underscores.
pub fn flatten_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            ' ' | '.' | '-' | '=' => '_',
            other => other,
        })
        .collect()
}

/// Renders a tag set as a Prometheus label block, `{k="v",...}` in key
/// order, or the empty string for no tags.
fn render_labels(tags: &Tags) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let body: Vec<String> = tags.iter().map(|(k, v)| format!("{k}=\"{v}\"")).collect();
    format!("{{{}}}", body.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Counter, Gauge, GaugeFloat, HealthCheck, Histogram, Meter};

    fn bridge(registry: Registry) -> PrometheusBridge {
        PrometheusBridge::new(registry, "pulse", "test", Duration::from_secs(1))
    }

    #[test]
    fn test_flatten_key_replaces_illegal_characters() {
        assert_eq!(flatten_key("proc.mem-rss use=2"), "proc_mem_rss_use_2");
    }

    #[test]
    fn test_counter_and_gauges_become_gauge_samples() {
        let registry = Registry::leaf();
        let counter = Counter::new();
        counter.inc(3);
        registry
            .register("req.count", Tags::from([("host", "a")]), counter.into())
            .unwrap();
        let gauge = Gauge::new();
        gauge.update(12);
        registry.register("depth", Tags::new(), gauge.into()).unwrap();
        let gf = GaugeFloat::new();
        gf.update(0.5);
        registry.register("load", Tags::new(), gf.into()).unwrap();

        let bridge = bridge(registry);
        bridge.update_once();
        let body = bridge.render();

        assert!(body.contains("# TYPE pulse_test_req_count gauge"));
        assert!(body.contains("pulse_test_req_count{host=\"a\"} 3"));
        assert!(body.contains("pulse_test_depth 12"));
        assert!(body.contains("pulse_test_load 0.5"));
    }

    #[test]
    fn test_histogram_reports_last_window_sample() {
        let registry = Registry::leaf();
        let h = Histogram::new();
        h.update(10);
        h.update(40);
        registry.register("lat", Tags::new(), h.into()).unwrap();

        let bridge = bridge(registry);
        bridge.update_once();
        assert!(bridge.render().contains("pulse_test_lat 40"));
    }

    #[test]
    fn test_empty_histogram_produces_no_sample() {
        let registry = Registry::leaf();
        registry
            .register("lat", Tags::new(), Histogram::new().into())
            .unwrap();

        let bridge = bridge(registry);
        bridge.update_once();
        assert!(!bridge.render().contains("pulse_test_lat"));
    }

    #[test]
    fn test_meters_and_health_checks_are_not_bridged() {
        let registry = Registry::leaf();
        registry
            .register("events", Tags::new(), Meter::new().into())
            .unwrap();
        registry
            .register("alive", Tags::new(), HealthCheck::new(|| Ok(())).into())
            .unwrap();

        let bridge = bridge(registry);
        bridge.update_once();
        assert_eq!(bridge.render(), "");
    }

    #[test]
    fn test_update_refreshes_existing_sample_in_place() {
        let registry = Registry::leaf();
        let counter = Counter::new();
        registry
            .register("req", Tags::new(), counter.clone().into())
            .unwrap();

        let bridge = bridge(registry);
        counter.inc(1);
        bridge.update_once();
        counter.inc(1);
        bridge.update_once();

        let body = bridge.render();
        assert!(body.contains("pulse_test_req 2"));
        assert!(!body.contains("pulse_test_req 1\n"));
    }

    #[test]
    fn test_distinct_tag_sets_render_as_separate_series() {
        let registry = Registry::leaf();
        for host in ["a", "b"] {
            let c = Counter::new();
            c.inc(1);
            registry
                .register("req", Tags::from([("host", host)]), c.into())
                .unwrap();
        }

        let bridge = bridge(registry);
        bridge.update_once();
        let body = bridge.render();
        assert!(body.contains("pulse_test_req{host=\"a\"} 1"));
        assert!(body.contains("pulse_test_req{host=\"b\"} 1"));
        // one family header for both series
        assert_eq!(body.matches("# TYPE pulse_test_req gauge").count(), 1);
    }
}
