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

//! Tag sets and their canonical identity.

use crate::error::{MetricsError, MetricsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

/// A set of key-value tags qualifying a metric name.
///
/// Two tag sets denote the same metric identity iff their [`TagsId`]s are
/// equal. Tags are stored sorted by key so identity derivation never depends
/// on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds a tag, returning the updated set. Overwrites an existing key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Inserts a tag in place. Overwrites an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the set holds no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Derives the canonical identity of this tag set: keys sorted
    /// lexicographically, each pair rendered as `key=value;`.
    ///
    /// The result is a pure function of the map contents and is stable
    /// across process runs.
    pub fn id(&self) -> TagsId {
        let mut id = String::new();
        for (k, v) in &self.0 {
            id.push_str(k);
            id.push('=');
            id.push_str(v);
            id.push(';');
        }
        TagsId(id)
    }

    /// Merges `other` into a copy of `self`: every pair of `other` whose key
    /// is not already present is added. Existing pairs win on collision, so
    /// caller-supplied tags always beat registry default tags. Neither input
    /// is mutated.
    pub fn add_tags(&self, other: &Tags) -> Tags {
        let mut merged = self.0.clone();
        for (k, v) in &other.0 {
            merged.entry(k.clone()).or_insert_with(|| v.clone());
        }
        Tags(merged)
    }
}

impl Display for Tags {
    /// Human-readable `key=value` pairs separated by spaces. For messages
    /// and wire tag syntax only; never used for identity.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Tags {
    type Err = MetricsError;

    /// Parses a comma-separated `key=value` list. The empty string parses to
    /// an empty tag set. A segment without exactly one `=` fails with
    /// [`MetricsError::TagParse`] naming the offending input.
    fn from_str(s: &str) -> MetricsResult<Self> {
        let mut tags = Tags::new();
        if s.is_empty() {
            return Ok(tags);
        }

        for segment in s.split(',') {
            let mut parts = segment.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) => tags.insert(key, value),
                _ => {
                    return Err(MetricsError::TagParse {
                        input: s.to_string(),
                    })
                }
            }
        }
        Ok(tags)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Tags {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Canonical, order-independent identity of a tag set. Used as the
/// uniqueness key for a metric under a given name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagsId(String);

impl TagsId {
    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TagsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_string() {
        let tags: Tags = "".parse().unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_key_value_list() {
        let tags: Tags = "host=web01,dc=east".parse().unwrap();
        assert_eq!(tags.get("host"), Some("web01"));
        assert_eq!(tags.get("dc"), Some("east"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_parse_rejects_segment_without_equals() {
        let err = "a=1,b".parse::<Tags>().unwrap_err();
        assert!(err.to_string().contains("a=1,b"));
    }

    #[test]
    fn test_parse_rejects_segment_with_two_equals() {
        assert!("a==1".parse::<Tags>().is_err());
    }

    #[test]
    fn test_parse_permits_empty_keys_and_values() {
        let tags: Tags = "=,k=".parse().unwrap();
        assert_eq!(tags.get(""), Some(""));
        assert_eq!(tags.get("k"), Some(""));
    }

    #[test]
    fn test_identity_is_insertion_order_independent() {
        let a = Tags::new().with("b", "2").with("a", "1").with("c", "3");
        let b = Tags::new().with("c", "3").with("a", "1").with("b", "2");
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().as_str(), "a=1;b=2;c=3;");
    }

    #[test]
    fn test_identity_distinguishes_values() {
        let a = Tags::new().with("k", "1");
        let b = Tags::new().with("k", "2");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_add_tags_existing_wins() {
        let a = Tags::from([("env", "prod"), ("team", "y")]);
        let b = Tags::from([("team", "x"), ("dc", "east")]);
        let merged = a.add_tags(&b);
        assert_eq!(merged.get("team"), Some("y"));
        assert_eq!(merged.get("env"), Some("prod"));
        assert_eq!(merged.get("dc"), Some("east"));
    }

    #[test]
    fn test_add_tags_does_not_mutate_inputs() {
        let a = Tags::from([("k", "a")]);
        let b = Tags::from([("k", "b"), ("other", "1")]);
        let _ = a.add_tags(&b);
        assert_eq!(a.len(), 1);
        assert_eq!(b.get("k"), Some("b"));
    }

    #[test]
    fn test_merge_identity_is_deterministic() {
        let a = Tags::from([("z", "1"), ("m", "2")]);
        let b = Tags::from([("a", "3")]);
        assert_eq!(a.add_tags(&b).id().as_str(), "a=3;m=2;z=1;");
    }

    #[test]
    fn test_display_form() {
        let tags = Tags::from([("b", "2"), ("a", "1")]);
        assert_eq!(tags.to_string(), "a=1 b=2");
        assert_eq!(Tags::new().to_string(), "");
    }
}
