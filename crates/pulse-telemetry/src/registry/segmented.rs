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

//! Write-time renaming decorator, composable into a tree.

use crate::registry::{join_name, Registry};
use pulse_core::{Instrument, MetricsResult, TaggedMetric, Tags};

/// A segment in a registry tree: contributes one prefix segment and a set of
/// default tags, accumulating with its ancestors' down to the storage root.
///
/// Unlike [`super::PrefixedRegistry`], the accumulated prefix and tags are
/// applied on WRITE: every storage operation transforms `(name, tags)` and
/// delegates to the nearest non-segmented ancestor, so the leaf store holds
/// the fully qualified identity. A segment with an empty prefix contributes
/// no name segment and no separator.
///
/// Tag priority on merge, highest first: caller tags, this segment's
/// defaults, then each ancestor's defaults walking up.
#[derive(Debug)]
pub struct SegmentedRegistry {
    parent: Registry,
    prefix: String,
    default_tags: Tags,
}

impl SegmentedRegistry {
    /// Creates a segment over `parent` (another segment or a storage-owning
    /// registry).
    pub fn new(prefix: impl Into<String>, default_tags: Tags, parent: Registry) -> Self {
        Self {
            parent,
            prefix: prefix.into(),
            default_tags,
        }
    }

    /// The fully qualified name for `name`: every ancestor segment's prefix
    /// joined with `.`, root first.
    pub fn full_name(&self, name: &str) -> String {
        join_name(&self.full_prefix(), name)
    }

    /// The accumulated prefix, root segment first. Empty segments are
    /// skipped.
    pub fn full_prefix(&self) -> String {
        let parent_prefix = match &self.parent {
            Registry::Segmented(parent) => parent.full_prefix(),
            _ => String::new(),
        };
        join_name(&parent_prefix, &self.prefix)
    }

    /// Merges `caller` tags with this segment's defaults and every
    /// ancestor's. The caller's tags take priority over this segment's
    /// defaults, which in turn beat the ancestors'.
    pub fn effective_tags(&self, caller: &Tags) -> Tags {
        let merged = caller.add_tags(&self.default_tags);
        match &self.parent {
            Registry::Segmented(parent) => parent.effective_tags(&merged),
            _ => merged,
        }
    }

    /// Walks to the nearest non-segmented ancestor, the registry that
    /// actually stores metrics for this tree.
    pub fn root_registry(&self) -> Registry {
        match &self.parent {
            Registry::Segmented(parent) => parent.root_registry(),
            other => other.clone(),
        }
    }

    pub fn get(&self, name: &str, tags: &Tags) -> Option<Instrument> {
        self.root_registry()
            .get(&self.full_name(name), &self.effective_tags(tags))
    }

    pub fn get_or_register(&self, name: &str, tags: Tags, instrument: Instrument) -> Instrument {
        self.root_registry()
            .get_or_register(&self.full_name(name), self.effective_tags(&tags), instrument)
    }

    pub fn get_or_register_with<F>(&self, name: &str, tags: Tags, factory: F) -> Instrument
    where
        F: FnOnce() -> Instrument,
    {
        self.root_registry()
            .get_or_register_with(&self.full_name(name), self.effective_tags(&tags), factory)
    }

    pub fn register(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        self.root_registry()
            .register(&self.full_name(name), self.effective_tags(&tags), instrument)
    }

    pub fn add(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        self.root_registry()
            .add(&self.full_name(name), self.effective_tags(&tags), instrument)
    }

    /// Removes the entry this segment would have written `(name, tags)`
    /// under, applying the same name/tag transform as `register`.
    pub fn unregister(&self, name: &str, tags: &Tags) {
        self.root_registry()
            .unregister(&self.full_name(name), &self.effective_tags(tags));
    }

    pub fn unregister_all(&self) {
        self.parent.unregister_all()
    }

    pub fn run_healthchecks(&self) {
        self.parent.run_healthchecks()
    }

    /// Enumerates the storage root. Entries written through this segment
    /// already carry the accumulated prefix and tags, so the transform here
    /// only re-applies the accumulated rename for entries registered
    /// directly on the root.
    pub fn each<F>(&self, visit: F)
    where
        F: FnMut(String, TaggedMetric),
    {
        let prefix = self.full_prefix();
        let defaults = self.effective_tags(&Tags::new());
        let transform = move |name: String, metric: TaggedMetric| {
            (join_name(&prefix, &name), metric.add_tags(&defaults))
        };
        self.parent.wrapped_each(transform, visit);
    }

    /// Forwards the caller's transform unchanged down to the storage root.
    pub fn wrapped_each<T, F>(&self, transform: T, visit: F)
    where
        T: Fn(String, TaggedMetric) -> (String, TaggedMetric),
        F: FnMut(String, TaggedMetric),
    {
        self.parent.wrapped_each(transform, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::Counter;

    fn tree() -> (Registry, Registry, Registry) {
        let root = Registry::leaf();
        let a = Registry::segmented("a", Tags::from([("env", "p")]), root.clone());
        let b = Registry::segmented("b", Tags::from([("team", "x")]), a.clone());
        (root, a, b)
    }

    #[test]
    fn test_write_through_tree_stores_fully_qualified_identity() {
        let (root, _, b) = tree();
        b.register("m", Tags::from([("team", "y")]), Counter::new().into())
            .unwrap();

        // caller's tag beats segment b's default; segment a's default merges in
        let stored_tags = Tags::from([("env", "p"), ("team", "y")]);
        assert!(root.get("a.b.m", &stored_tags).is_some());
        assert!(root.get("m", &stored_tags).is_none());

        // read back through the segment with the caller-side identity
        assert!(b.get("m", &Tags::from([("team", "y")])).is_some());
    }

    #[test]
    fn test_caller_tags_beat_own_defaults_beat_ancestor_defaults() {
        let root = Registry::leaf();
        let a = Registry::segmented("a", Tags::from([("k", "a"), ("only-a", "1")]), root);
        let b = Registry::segmented("b", Tags::from([("k", "b"), ("only-b", "2")]), a);
        let seg = match &b {
            Registry::Segmented(seg) => seg,
            _ => unreachable!(),
        };

        let merged = seg.effective_tags(&Tags::from([("k", "caller")]));
        assert_eq!(merged.get("k"), Some("caller"));
        assert_eq!(merged.get("only-a"), Some("1"));
        assert_eq!(merged.get("only-b"), Some("2"));

        let merged = seg.effective_tags(&Tags::new());
        assert_eq!(merged.get("k"), Some("b"));
    }

    #[test]
    fn test_empty_prefix_contributes_no_separator() {
        let root = Registry::leaf();
        let unnamed = Registry::segmented("", Tags::from([("env", "p")]), root.clone());
        let inner = Registry::segmented("svc", Tags::new(), unnamed);

        inner
            .register("m", Tags::new(), Counter::new().into())
            .unwrap();
        assert!(root.get("svc.m", &Tags::from([("env", "p")])).is_some());
    }

    #[test]
    fn test_unregister_applies_the_write_transform() {
        let (root, _, b) = tree();
        b.register("m", Tags::new(), Counter::new().into()).unwrap();

        b.unregister("m", &Tags::new());
        let stored_tags = Tags::from([("env", "p"), ("team", "x")]);
        assert!(root.get("a.b.m", &stored_tags).is_none());
    }

    #[test]
    fn test_enumeration_surfaces_fully_qualified_entries() {
        let (root, _, b) = tree();
        b.register("m", Tags::new(), Counter::new().into()).unwrap();

        let mut surfaced = Vec::new();
        root.each(|name, tm| surfaced.push((name, tm.tags().clone())));
        assert_eq!(surfaced.len(), 1);
        assert_eq!(surfaced[0].0, "a.b.m");
        assert_eq!(surfaced[0].1.get("env"), Some("p"));
        assert_eq!(surfaced[0].1.get("team"), Some("x"));
    }

    #[test]
    fn test_root_registry_skips_intermediate_segments() {
        let (root, _, b) = tree();
        let seg = match &b {
            Registry::Segmented(seg) => seg,
            _ => unreachable!(),
        };
        let storage = seg.root_registry();
        storage
            .register("direct", Tags::new(), Counter::new().into())
            .unwrap();
        assert!(root.get("direct", &Tags::new()).is_some());
    }

    #[test]
    fn test_get_or_register_through_segment_reuses_stored_handle() {
        let (_, _, b) = tree();
        let counter = Counter::new();
        counter.inc(3);
        b.register("m", Tags::new(), counter.into()).unwrap();

        let got = b.get_or_register("m", Tags::new(), Counter::new().into());
        assert_eq!(got.as_counter().map(Counter::count), Some(3));
    }
}
