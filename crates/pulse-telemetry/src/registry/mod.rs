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

//! Tagged metric registries.
//!
//! [`LeafRegistry`] owns all storage; [`PrefixedRegistry`] and
//! [`SegmentedRegistry`] are non-storage-owning decorators that compose
//! naming and default-tag transforms over it. [`Registry`] closes the three
//! over one cheaply clonable handle so decorators can nest to any depth.

mod leaf;
mod prefixed;
mod segmented;

pub use self::leaf::LeafRegistry;
pub use self::prefixed::PrefixedRegistry;
pub use self::segmented::SegmentedRegistry;

use pulse_core::{Instrument, MetricsResult, TaggedMetric, Tags};
use std::sync::Arc;

/// A shared handle to a registry node.
///
/// Cloning shares the node. Decorator construction consumes handles, so a
/// tree is built bottom-up:
///
/// ```
/// use pulse_telemetry::Registry;
/// use pulse_core::Tags;
///
/// let root = Registry::leaf();
/// let service = Registry::segmented("svc", Tags::from([("env", "prod")]), root.clone());
/// let worker = Registry::segmented("worker", Tags::new(), service);
/// # let _ = (root, worker);
/// ```
#[derive(Debug, Clone)]
pub enum Registry {
    /// The storage-owning node.
    Leaf(Arc<LeafRegistry>),
    /// Enumeration-time rename/re-tag decorator.
    Prefixed(Arc<PrefixedRegistry>),
    /// Write-time rename/re-tag decorator.
    Segmented(Arc<SegmentedRegistry>),
}

impl Registry {
    /// A fresh storage-owning registry.
    pub fn leaf() -> Self {
        Registry::Leaf(Arc::new(LeafRegistry::new()))
    }

    /// A prefixing decorator over a fresh leaf.
    pub fn prefixed(prefix: impl Into<String>, default_tags: Tags) -> Self {
        Self::prefixed_over(prefix, default_tags, Self::leaf())
    }

    /// A prefixing decorator over an existing registry.
    pub fn prefixed_over(
        prefix: impl Into<String>,
        default_tags: Tags,
        underlying: Registry,
    ) -> Self {
        Registry::Prefixed(Arc::new(PrefixedRegistry::new(
            prefix,
            default_tags,
            underlying,
        )))
    }

    /// A root segment over a fresh leaf: no prefix, only default tags.
    pub fn segmented_root(default_tags: Tags) -> Self {
        Self::segmented("", default_tags, Self::leaf())
    }

    /// A segment over `parent` (another segment or a storage-owning node).
    pub fn segmented(prefix: impl Into<String>, default_tags: Tags, parent: Registry) -> Self {
        Registry::Segmented(Arc::new(SegmentedRegistry::new(
            prefix,
            default_tags,
            parent,
        )))
    }

    /// Looks up the instrument for `(name, tags)`. Segments transform the
    /// identity before delegating; the other nodes pass it through.
    pub fn get(&self, name: &str, tags: &Tags) -> Option<Instrument> {
        match self {
            Registry::Leaf(r) => r.get(name, tags),
            Registry::Prefixed(r) => r.get(name, tags),
            Registry::Segmented(r) => r.get(name, tags),
        }
    }

    /// Returns the stored instrument for `(name, tags)`, registering
    /// `instrument` first when absent.
    pub fn get_or_register(&self, name: &str, tags: Tags, instrument: Instrument) -> Instrument {
        match self {
            Registry::Leaf(r) => r.get_or_register(name, tags, instrument),
            Registry::Prefixed(r) => r.get_or_register(name, tags, instrument),
            Registry::Segmented(r) => r.get_or_register(name, tags, instrument),
        }
    }

    /// Like [`Self::get_or_register`] with a lazily built instrument. The
    /// factory runs outside the storage lock; at most one result is kept per
    /// identity.
    pub fn get_or_register_with<F>(&self, name: &str, tags: Tags, factory: F) -> Instrument
    where
        F: FnOnce() -> Instrument,
    {
        match self {
            Registry::Leaf(r) => r.get_or_register_with(name, tags, factory),
            Registry::Prefixed(r) => r.get_or_register_with(name, tags, factory),
            Registry::Segmented(r) => r.get_or_register_with(name, tags, factory),
        }
    }

    /// Registers a durable metric; fails on a duplicate identity.
    pub fn register(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        match self {
            Registry::Leaf(r) => r.register(name, tags, instrument),
            Registry::Prefixed(r) => r.register(name, tags, instrument),
            Registry::Segmented(r) => r.register(name, tags, instrument),
        }
    }

    /// Registers a fire-once metric, surfaced by the next enumeration only.
    pub fn add(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        match self {
            Registry::Leaf(r) => r.add(name, tags, instrument),
            Registry::Prefixed(r) => r.add(name, tags, instrument),
            Registry::Segmented(r) => r.add(name, tags, instrument),
        }
    }

    /// Removes the entry matching the identity exactly; no-op when absent.
    pub fn unregister(&self, name: &str, tags: &Tags) {
        match self {
            Registry::Leaf(r) => r.unregister(name, tags),
            Registry::Prefixed(r) => r.unregister(name, tags),
            Registry::Segmented(r) => r.unregister(name, tags),
        }
    }

    /// Clears the durable store.
    pub fn unregister_all(&self) {
        match self {
            Registry::Leaf(r) => r.unregister_all(),
            Registry::Prefixed(r) => r.unregister_all(),
            Registry::Segmented(r) => r.unregister_all(),
        }
    }

    /// Runs every registered health check once, outside the storage lock.
    pub fn run_healthchecks(&self) {
        match self {
            Registry::Leaf(r) => r.run_healthchecks(),
            Registry::Prefixed(r) => r.run_healthchecks(),
            Registry::Segmented(r) => r.run_healthchecks(),
        }
    }

    /// Visits every live metric once, through this node's rename/re-tag
    /// transform where it has one. Pending fire-once entries are drained.
    pub fn each<F>(&self, visit: F)
    where
        F: FnMut(String, TaggedMetric),
    {
        match self {
            Registry::Leaf(r) => r.each(visit),
            Registry::Prefixed(r) => r.each(visit),
            Registry::Segmented(r) => r.each(visit),
        }
    }

    /// Visits every live metric once, through the caller's transform.
    /// Decorator nodes forward the transform unchanged down to storage.
    pub fn wrapped_each<T, F>(&self, transform: T, visit: F)
    where
        T: Fn(String, TaggedMetric) -> (String, TaggedMetric),
        F: FnMut(String, TaggedMetric),
    {
        match self {
            Registry::Leaf(r) => r.wrapped_each(transform, visit),
            Registry::Prefixed(r) => r.wrapped_each(transform, visit),
            Registry::Segmented(r) => r.wrapped_each(transform, visit),
        }
    }
}

impl From<LeafRegistry> for Registry {
    fn from(r: LeafRegistry) -> Self {
        Registry::Leaf(Arc::new(r))
    }
}

/// Joins `prefix` and `name` with a dot. An empty prefix contributes no
/// separator; an empty name yields the prefix alone.
pub(crate) fn join_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
