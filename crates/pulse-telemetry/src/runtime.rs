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

//! Process-level runtime statistics captured into registry instruments.

use crate::registry::Registry;
use pulse_core::{Gauge, GaugeFloat, MetricsResult, Tags, Timer};
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Samples the current process's resource usage into a fixed set of
/// instruments.
///
/// Call [`Self::register`] once to create the instruments in a registry,
/// then [`Self::capture_once`] on whatever cadence the caller owns —
/// typically as an exporter pre-capture hook. Each capturer owns its own
/// [`sysinfo::System`] and previous-sample counters, so independent
/// capturers never interfere.
#[derive(Debug)]
pub struct RuntimeStatCapturer {
    system: System,
    pid: Pid,
    last_disk: Option<(u64, u64)>,
    resident: Gauge,
    virtual_mem: Gauge,
    cpu: GaugeFloat,
    disk_read: Gauge,
    disk_written: Gauge,
    disk_read_total: Gauge,
    disk_written_total: Gauge,
    uptime: Gauge,
    refresh: Timer,
}

impl RuntimeStatCapturer {
    /// Creates a capturer for the current process.
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(std::process::id()),
            last_disk: None,
            resident: Gauge::new(),
            virtual_mem: Gauge::new(),
            cpu: GaugeFloat::new(),
            disk_read: Gauge::new(),
            disk_written: Gauge::new(),
            disk_read_total: Gauge::new(),
            disk_written_total: Gauge::new(),
            uptime: Gauge::new(),
            refresh: Timer::new(),
        }
    }

    /// Registers the capturer's instruments under fixed `process.runtime.*`
    /// names with empty tags. Fails with a duplicate error if the registry
    /// already holds any of the names, leaving the earlier entries in place.
    pub fn register(&self, registry: &Registry) -> MetricsResult<()> {
        registry.register(
            "process.runtime.memory.resident",
            Tags::new(),
            self.resident.clone().into(),
        )?;
        registry.register(
            "process.runtime.memory.virtual",
            Tags::new(),
            self.virtual_mem.clone().into(),
        )?;
        registry.register(
            "process.runtime.cpu.percent",
            Tags::new(),
            self.cpu.clone().into(),
        )?;
        registry.register(
            "process.runtime.disk.read",
            Tags::new(),
            self.disk_read.clone().into(),
        )?;
        registry.register(
            "process.runtime.disk.written",
            Tags::new(),
            self.disk_written.clone().into(),
        )?;
        registry.register(
            "process.runtime.disk.read.total",
            Tags::new(),
            self.disk_read_total.clone().into(),
        )?;
        registry.register(
            "process.runtime.disk.written.total",
            Tags::new(),
            self.disk_written_total.clone().into(),
        )?;
        registry.register(
            "process.runtime.uptime",
            Tags::new(),
            self.uptime.clone().into(),
        )?;
        registry.register(
            "process.runtime.refresh",
            Tags::new(),
            self.refresh.clone().into(),
        )?;
        Ok(())
    }

    /// Refreshes the process sample and updates every instrument. Disk
    /// deltas need two captures before they carry a value; the first capture
    /// only seeds the previous-sample counters.
    pub fn capture_once(&mut self) {
        let started = Instant::now();
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        match self.system.process(self.pid) {
            Some(process) => {
                self.resident.update(process.memory() as i64);
                self.virtual_mem.update(process.virtual_memory() as i64);
                self.cpu.update(process.cpu_usage() as f64);
                self.uptime.update(process.run_time() as i64);

                let disk = process.disk_usage();
                if let Some((last_read, last_written)) = self.last_disk {
                    self.disk_read
                        .update(disk.total_read_bytes.saturating_sub(last_read) as i64);
                    self.disk_written
                        .update(disk.total_written_bytes.saturating_sub(last_written) as i64);
                }
                self.disk_read_total.update(disk.total_read_bytes as i64);
                self.disk_written_total
                    .update(disk.total_written_bytes as i64);
                self.last_disk = Some((disk.total_read_bytes, disk.total_written_bytes));
            }
            None => {
                log::warn!("process {} not visible to sysinfo, skipping sample", self.pid);
            }
        }

        self.refresh.update_since(started);
    }
}

impl Default for RuntimeStatCapturer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{InstrumentKind, MetricsError};

    #[test]
    fn test_register_creates_the_fixed_instrument_set() {
        let registry = Registry::leaf();
        let capturer = RuntimeStatCapturer::new();
        capturer.register(&registry).unwrap();

        let mut names = Vec::new();
        registry.each(|name, tm| {
            assert!(tm.tags().is_empty());
            names.push(name);
        });
        names.sort();
        assert_eq!(
            names,
            vec![
                "process.runtime.cpu.percent",
                "process.runtime.disk.read",
                "process.runtime.disk.read.total",
                "process.runtime.disk.written",
                "process.runtime.disk.written.total",
                "process.runtime.memory.resident",
                "process.runtime.memory.virtual",
                "process.runtime.refresh",
                "process.runtime.uptime",
            ]
        );

        let refresh = registry
            .get("process.runtime.refresh", &Tags::new())
            .unwrap();
        assert_eq!(refresh.kind(), InstrumentKind::Timer);
    }

    #[test]
    fn test_second_register_into_same_registry_fails() {
        let registry = Registry::leaf();
        RuntimeStatCapturer::new().register(&registry).unwrap();
        let err = RuntimeStatCapturer::new().register(&registry).unwrap_err();
        assert!(matches!(err, MetricsError::DuplicateMetric { .. }));
    }

    #[test]
    fn test_capture_updates_instruments() {
        let registry = Registry::leaf();
        let mut capturer = RuntimeStatCapturer::new();
        capturer.register(&registry).unwrap();

        capturer.capture_once();
        capturer.capture_once();

        let refresh = registry
            .get("process.runtime.refresh", &Tags::new())
            .unwrap();
        assert_eq!(refresh.as_timer().map(Timer::count), Some(2));

        let resident = registry
            .get("process.runtime.memory.resident", &Tags::new())
            .unwrap();
        assert!(resident.as_gauge().map(Gauge::value).unwrap() > 0);
    }

    #[test]
    fn test_capturer_writes_through_a_segment() {
        let root = Registry::leaf();
        let seg = Registry::segmented("svc", Tags::from([("env", "test")]), root.clone());
        RuntimeStatCapturer::new().register(&seg).unwrap();

        assert!(root
            .get(
                "svc.process.runtime.uptime",
                &Tags::from([("env", "test")])
            )
            .is_some());
    }
}
