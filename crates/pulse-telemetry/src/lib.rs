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

//! Tagged metric registries and exporters.
//!
//! This crate aggregates the instruments defined in `pulse-core`: the
//! mutex-protected [`registry::LeafRegistry`] owns all metric storage, the
//! prefixed/segmented decorators compose naming and default-tag transforms
//! over it, [`runtime::RuntimeStatCapturer`] samples process-level
//! statistics into pre-registered instruments, and the [`export`] reporters
//! ship periodic snapshots to OpenTSDB or a Prometheus scrape surface.

pub mod export;
pub mod registry;
pub mod runtime;

pub use self::registry::{LeafRegistry, PrefixedRegistry, Registry, SegmentedRegistry};
pub use self::runtime::RuntimeStatCapturer;
