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

//! Periodic exporters over a registry tree.
//!
//! Exporters are thin consumers: on each tick they enumerate a root-level
//! registry node, format the surfaced metrics, and ship them. Transport
//! errors are logged and never affect registry state.

pub mod opentsdb;
pub mod prometheus;

pub use self::opentsdb::{OpenTsdbExporter, OpenTsdbFormat, Point, PointValue};
pub use self::prometheus::PrometheusBridge;
