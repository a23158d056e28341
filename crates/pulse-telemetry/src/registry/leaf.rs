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

//! The storage-owning registry implementation.

use pulse_core::{HealthCheck, Instrument, MetricsError, MetricsResult, TaggedMetric, Tags, TagsId};
use std::collections::HashMap;
use std::sync::Mutex;

/// name -> tag identity -> tagged metric.
type Store = HashMap<String, HashMap<TagsId, TaggedMetric>>;

/// The authoritative, mutex-protected store of tagged metrics.
///
/// A single mutex serializes every state transition. It is held only for map
/// manipulation: visitor callbacks, lazy factories, and health checks all run
/// outside the lock, so they may call back into the registry freely.
///
/// Besides the durable store there is a fire-once store fed by [`Self::add`];
/// its entries are surfaced exactly once by the next enumeration and then
/// discarded.
#[derive(Debug, Default)]
pub struct LeafRegistry {
    inner: Mutex<Stores>,
}

#[derive(Debug, Default)]
struct Stores {
    metrics: Store,
    additional: Store,
}

impl LeafRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instrument registered under `(name, tags)`, if any.
    /// Never creates an entry.
    pub fn get(&self, name: &str, tags: &Tags) -> Option<Instrument> {
        let inner = self.inner.lock().unwrap();
        lookup(&inner.metrics, name, &tags.id())
    }

    /// Returns the instrument registered under `(name, tags)`, registering
    /// `instrument` first if none exists. A single critical section, so no
    /// two concurrent callers can both win the registration race.
    pub fn get_or_register(&self, name: &str, tags: Tags, instrument: Instrument) -> Instrument {
        let id = tags.id();
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = lookup(&inner.metrics, name, &id) {
            return existing;
        }
        inner
            .metrics
            .entry(name.to_string())
            .or_default()
            .insert(id, TaggedMetric::new(tags, instrument.clone()));
        instrument
    }

    /// Like [`Self::get_or_register`], but the instrument is built lazily.
    ///
    /// The factory runs outside the lock, so it may itself use the registry.
    /// Exactly one instrument is ever stored per identity; if two callers
    /// race, the loser's factory output is discarded and the winner's handle
    /// is returned to both.
    pub fn get_or_register_with<F>(&self, name: &str, tags: Tags, factory: F) -> Instrument
    where
        F: FnOnce() -> Instrument,
    {
        let id = tags.id();
        if let Some(existing) = lookup(&self.inner.lock().unwrap().metrics, name, &id) {
            return existing;
        }

        let candidate = factory();

        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = lookup(&inner.metrics, name, &id) {
            return existing;
        }
        inner
            .metrics
            .entry(name.to_string())
            .or_default()
            .insert(id, TaggedMetric::new(tags, candidate.clone()));
        candidate
    }

    /// Registers `instrument` under `(name, tags)`. Fails with
    /// [`MetricsError::DuplicateMetric`] when that identity already exists;
    /// the original registration is left untouched.
    pub fn register(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        let mut inner = self.inner.lock().unwrap();
        insert(&mut inner.metrics, name, tags, instrument)
    }

    /// Registers a fire-once metric: it is surfaced by the next enumeration
    /// only, then discarded. Uniqueness within the pending batch follows the
    /// same rule as [`Self::register`].
    pub fn add(&self, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
        let mut inner = self.inner.lock().unwrap();
        insert(&mut inner.additional, name, tags, instrument)
    }

    /// Removes the entry matching `(name, tags)` exactly; other tag
    /// identities under the same name remain. No-op when absent.
    pub fn unregister(&self, name: &str, tags: &Tags) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(bucket) = inner.metrics.get_mut(name) {
            bucket.remove(&tags.id());
            if bucket.is_empty() {
                inner.metrics.remove(name);
            }
        }
    }

    /// Clears the durable store. (Mostly for test teardown.)
    pub fn unregister_all(&self) {
        self.inner.lock().unwrap().metrics.clear();
    }

    /// Runs every registered health check once. Checks execute outside the
    /// lock, so a slow or reentrant check cannot block other operations.
    pub fn run_healthchecks(&self) {
        let checks: Vec<HealthCheck> = {
            let inner = self.inner.lock().unwrap();
            inner
                .metrics
                .values()
                .flat_map(|bucket| bucket.values())
                .filter_map(|tm| tm.instrument().as_health_check().cloned())
                .collect()
        };
        for check in checks {
            check.check();
        }
    }

    /// Calls `visit` for every live metric in a frozen snapshot. Pending
    /// fire-once entries are included and drained. Iteration order is
    /// unspecified.
    pub fn each<F>(&self, mut visit: F)
    where
        F: FnMut(String, TaggedMetric),
    {
        for (name, metric) in self.snapshot() {
            visit(name, metric);
        }
    }

    /// Like [`Self::each`], but every `(name, metric)` pair is passed through
    /// `transform` first. This is the hook decorators use to rename and
    /// re-tag entries without this registry knowing about prefixes.
    pub fn wrapped_each<T, F>(&self, transform: T, mut visit: F)
    where
        T: Fn(String, TaggedMetric) -> (String, TaggedMetric),
        F: FnMut(String, TaggedMetric),
    {
        for (name, metric) in self.snapshot() {
            let (name, metric) = transform(name, metric);
            visit(name, metric);
        }
    }

    /// Copies the durable store, merges in the fire-once store, and drains
    /// the latter, all under one lock acquisition. Callers iterate the result
    /// with the lock released.
    fn snapshot(&self) -> Vec<(String, TaggedMetric)> {
        let mut inner = self.inner.lock().unwrap();
        let mut merged: Store = inner.metrics.clone();
        for (name, bucket) in inner.additional.drain() {
            let slot = merged.entry(name).or_default();
            for (id, metric) in bucket {
                slot.insert(id, metric);
            }
        }
        drop(inner);

        let mut out = Vec::new();
        for (name, bucket) in merged {
            for (_, metric) in bucket {
                out.push((name.clone(), metric));
            }
        }
        out
    }
}

fn lookup(store: &Store, name: &str, id: &TagsId) -> Option<Instrument> {
    store
        .get(name)
        .and_then(|bucket| bucket.get(id))
        .map(|tm| tm.instrument().clone())
}

fn insert(store: &mut Store, name: &str, tags: Tags, instrument: Instrument) -> MetricsResult<()> {
    let id = tags.id();
    if let Some(bucket) = store.get(name) {
        if bucket.contains_key(&id) {
            return Err(MetricsError::DuplicateMetric {
                name: name.to_string(),
                tags,
            });
        }
    }
    store
        .entry(name.to_string())
        .or_default()
        .insert(id, TaggedMetric::new(tags, instrument));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Counter, Gauge, HealthCheck, MetricsError};
    use std::sync::Arc;

    #[test]
    fn test_register_then_get() {
        let r = LeafRegistry::new();
        let counter = Counter::new();
        let tags = Tags::from([("host", "web01")]);

        r.register("requests", tags.clone(), counter.clone().into())
            .unwrap();
        counter.inc(2);

        let found = r.get("requests", &tags).unwrap();
        assert_eq!(found.as_counter().map(Counter::count), Some(2));
        assert!(r.get("requests", &Tags::new()).is_none());
        assert!(r.get("other", &tags).is_none());
    }

    #[test]
    fn test_duplicate_registration_fails_and_keeps_original() {
        let r = LeafRegistry::new();
        let tags = Tags::from([("t", "1")]);
        let original = Counter::new();
        original.inc(7);

        r.register("m", tags.clone(), original.clone().into())
            .unwrap();
        let err = r
            .register("m", tags.clone(), Counter::new().into())
            .unwrap_err();
        assert!(matches!(err, MetricsError::DuplicateMetric { .. }));

        let kept = r.get("m", &tags).unwrap();
        assert_eq!(kept.as_counter().map(Counter::count), Some(7));
    }

    #[test]
    fn test_same_name_different_tags_coexist() {
        let r = LeafRegistry::new();
        r.register("m", Tags::from([("t", "1")]), Counter::new().into())
            .unwrap();
        r.register("m", Tags::from([("t", "2")]), Counter::new().into())
            .unwrap();

        let mut seen = 0;
        r.each(|name, _| {
            assert_eq!(name, "m");
            seen += 1;
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_get_or_register_returns_existing() {
        let r = LeafRegistry::new();
        let first = Counter::new();
        first.inc(1);

        r.register("m", Tags::new(), first.into()).unwrap();
        let got = r.get_or_register("m", Tags::new(), Counter::new().into());
        assert_eq!(got.as_counter().map(Counter::count), Some(1));
    }

    #[test]
    fn test_get_or_register_with_concurrent_creates_exactly_one() {
        let r = Arc::new(LeafRegistry::new());
        let tags = Tags::from([("race", "on")]);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let r = Arc::clone(&r);
                let tags = tags.clone();
                std::thread::spawn(move || {
                    let got = r.get_or_register_with("m", tags, || {
                        let g = Gauge::new();
                        g.update(i);
                        g.into()
                    });
                    got.as_gauge().map(Gauge::value).unwrap()
                })
            })
            .collect();

        let observed: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        // every caller saw the same stored handle, and it is one of the
        // factory outputs
        let winner = observed[0];
        assert!(observed.iter().all(|&v| v == winner));
        assert!((0..8).contains(&winner));

        let stored = r.get("m", &tags).unwrap();
        assert_eq!(stored.as_gauge().map(Gauge::value), Some(winner));
    }

    #[test]
    fn test_factory_may_reenter_the_registry() {
        let r = Arc::new(LeafRegistry::new());
        r.register("seed", Tags::new(), Counter::new().into())
            .unwrap();

        let inner = Arc::clone(&r);
        let got = r.get_or_register_with("derived", Tags::new(), move || {
            // would deadlock if the lock were held across the factory
            assert!(inner.get("seed", &Tags::new()).is_some());
            Counter::new().into()
        });
        assert!(got.as_counter().is_some());
    }

    #[test]
    fn test_add_surfaces_exactly_once() {
        let r = LeafRegistry::new();
        r.register("durable", Tags::new(), Counter::new().into())
            .unwrap();
        r.add("x", Tags::new(), Gauge::new().into()).unwrap();

        let mut first: Vec<String> = Vec::new();
        r.each(|name, _| first.push(name));
        first.sort();
        assert_eq!(first, vec!["durable".to_string(), "x".to_string()]);

        let mut second: Vec<String> = Vec::new();
        r.each(|name, _| second.push(name));
        assert_eq!(second, vec!["durable".to_string()]);
    }

    #[test]
    fn test_add_duplicate_within_batch_fails() {
        let r = LeafRegistry::new();
        r.add("x", Tags::new(), Counter::new().into()).unwrap();
        assert!(r.add("x", Tags::new(), Counter::new().into()).is_err());
    }

    #[test]
    fn test_fire_once_alongside_durable_entry_of_same_name() {
        let r = LeafRegistry::new();
        let tags = Tags::from([("kind", "durable")]);
        r.register("m", tags.clone(), Counter::new().into()).unwrap();
        r.add("m", Tags::from([("kind", "oneshot")]), Counter::new().into())
            .unwrap();

        let mut kinds: Vec<String> = Vec::new();
        r.each(|_, tm| kinds.push(tm.tags().get("kind").unwrap().to_string()));
        kinds.sort();
        assert_eq!(kinds, vec!["durable".to_string(), "oneshot".to_string()]);

        let mut remaining = 0;
        r.each(|_, _| remaining += 1);
        assert_eq!(remaining, 1);
    }

    #[test]
    fn test_unregister_removes_only_matching_identity() {
        let r = LeafRegistry::new();
        let t1 = Tags::from([("t", "1")]);
        let t2 = Tags::from([("t", "2")]);
        r.register("m", t1.clone(), Counter::new().into()).unwrap();
        r.register("m", t2.clone(), Counter::new().into()).unwrap();

        r.unregister("m", &t1);
        assert!(r.get("m", &t1).is_none());
        assert!(r.get("m", &t2).is_some());

        // removing the last identity drops the name bucket; re-registering
        // works again
        r.unregister("m", &t2);
        r.register("m", t2, Counter::new().into()).unwrap();
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let r = LeafRegistry::new();
        r.unregister("missing", &Tags::new());
    }

    #[test]
    fn test_unregister_all_clears_durable_store() {
        let r = LeafRegistry::new();
        r.register("a", Tags::new(), Counter::new().into()).unwrap();
        r.register("b", Tags::new(), Counter::new().into()).unwrap();
        r.unregister_all();

        let mut count = 0;
        r.each(|_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_run_healthchecks_runs_every_check() {
        let r = LeafRegistry::new();
        let ok = HealthCheck::new(|| Ok(()));
        let bad = HealthCheck::new(|| Err("down".to_string()));
        r.register("ok", Tags::new(), ok.clone().into()).unwrap();
        r.register("bad", Tags::from([("t", "1")]), bad.clone().into())
            .unwrap();
        r.register("noise", Tags::new(), Counter::new().into())
            .unwrap();

        r.run_healthchecks();
        assert!(ok.is_healthy());
        assert!(!bad.is_healthy());
    }

    #[test]
    fn test_visitor_may_reenter_the_registry() {
        let r = LeafRegistry::new();
        r.register("m", Tags::new(), Counter::new().into()).unwrap();
        r.each(|name, tm| {
            // would deadlock if the snapshot were iterated under the lock
            assert!(r.get(&name, tm.tags()).is_some());
            let _ = r.register("late", Tags::new(), Counter::new().into());
        });
        assert!(r.get("late", &Tags::new()).is_some());
    }
}
