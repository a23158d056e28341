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

//! Enumeration-time renaming decorator.

use crate::registry::{join_name, Registry};
use pulse_core::{Instrument, MetricsResult, TaggedMetric, Tags};

/// Decorates an underlying registry with a display prefix and default tags.
///
/// The prefix and tags are applied ONLY when metrics are enumerated: `get`,
/// `register`, `get_or_register` and `unregister` pass through to the
/// underlying registry with the name and tags untouched, so storage identity
/// is independent of this decorator. Use [`super::SegmentedRegistry`] when
/// the transform must apply on write as well.
#[derive(Debug)]
pub struct PrefixedRegistry {
    underlying: Registry,
    prefix: String,
    default_tags: Tags,
}

impl PrefixedRegistry {
    /// Wraps `underlying` with `prefix` and `default_tags`.
    pub fn new(prefix: impl Into<String>, default_tags: Tags, underlying: Registry) -> Self {
        Self {
            underlying,
            prefix: prefix.into(),
            default_tags,
        }
    }

    /// Pass-through lookup: the stored name is the caller's name.
    pub fn get(&self, name: &str, tags: &Tags) -> Option<Instrument> {
        self.underlying.get(name, tags)
    }

    pub fn get_or_register(&self, name: &str, tags: Tags, instrument: Instrument) -> Instrument {
        self.underlying.get_or_register(name, tags, instrument)
    }

    pub fn get_or_register_with<F>(&self, name: &str, tags: Tags, factory: F) -> Instrument
    where
        F: FnOnce() -> Instrument,
    {
        self.underlying.get_or_register_with(name, tags, factory)
    }

    pub fn register(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        self.underlying.register(name, tags, instrument)
    }

    pub fn add(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        self.underlying.add(name, tags, instrument)
    }

    pub fn unregister(&self, name: &str, tags: &Tags) {
        self.underlying.unregister(name, tags)
    }

    pub fn unregister_all(&self) {
        self.underlying.unregister_all()
    }

    pub fn run_healthchecks(&self) {
        self.underlying.run_healthchecks()
    }

    /// Enumerates the underlying registry, renaming each entry to
    /// `prefix.name` (name unchanged when the prefix is empty) and merging
    /// in the default tags. A metric's own tags win over the defaults.
    pub fn each<F>(&self, visit: F)
    where
        F: FnMut(String, TaggedMetric),
    {
        let transform = |name: String, metric: TaggedMetric| {
            (
                join_name(&self.prefix, &name),
                metric.add_tags(&self.default_tags),
            )
        };
        self.underlying.wrapped_each(transform, visit);
    }

    /// Forwards the caller's transform unchanged; this decorator's own
    /// prefix and tags do not participate.
    pub fn wrapped_each<T, F>(&self, transform: T, visit: F)
    where
        T: Fn(String, TaggedMetric) -> (String, TaggedMetric),
        F: FnMut(String, TaggedMetric),
    {
        self.underlying.wrapped_each(transform, visit);
    }
}
