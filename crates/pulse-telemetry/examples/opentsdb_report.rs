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

//! Reports a small registry tree to a local OpenTSDB endpoint.
//!
//! Run a listener first, e.g. `nc -lk 4242`, then:
//! `RUST_LOG=trace cargo run --example opentsdb_report`

use anyhow::Result;
use pulse_core::{Counter, Tags, Timer};
use pulse_telemetry::export::{OpenTsdbExporter, OpenTsdbFormat};
use pulse_telemetry::{Registry, RuntimeStatCapturer};
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    let root = Registry::leaf();
    let service = Registry::segmented("demo", Tags::from([("env", "dev")]), root.clone());

    let requests = Counter::new();
    service.register("requests", Tags::new(), requests.clone().into())?;
    let handler = Timer::new();
    service.register("handler", Tags::new(), handler.clone().into())?;

    let mut capturer = RuntimeStatCapturer::new();
    capturer.register(&service)?;

    // simulate some traffic
    for i in 0u64..50 {
        requests.inc(1);
        handler.time(|| std::thread::sleep(Duration::from_millis(i % 5)));
    }

    let (stop, shutdown) = flume::bounded(1);
    let mut exporter = OpenTsdbExporter::new(
        "127.0.0.1:4242",
        root,
        Duration::from_secs(2),
        Duration::from_millis(1),
        OpenTsdbFormat::Tcollector,
    )
    .with_precapture(move |_| capturer.capture_once());

    let reporter = std::thread::spawn(move || exporter.run(shutdown));

    std::thread::sleep(Duration::from_secs(7));
    let _ = stop.send(());
    reporter.join().expect("exporter thread panicked");
    Ok(())
}
