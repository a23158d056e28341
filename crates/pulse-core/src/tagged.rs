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

//! Binds a tag set to an instrument handle.

use crate::instrument::Instrument;
use crate::tags::{Tags, TagsId};

/// An instrument together with the tag set it was registered under.
///
/// Cloning is cheap: the instrument handle is shared, the tags are copied.
#[derive(Debug, Clone)]
pub struct TaggedMetric {
    tags: Tags,
    instrument: Instrument,
}

impl TaggedMetric {
    /// Pairs `tags` with `instrument`.
    pub fn new(tags: Tags, instrument: Instrument) -> Self {
        Self { tags, instrument }
    }

    /// The tag set.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// The instrument handle.
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// The canonical identity of the tag set.
    pub fn tags_id(&self) -> TagsId {
        self.tags.id()
    }

    /// The human-readable tag string.
    pub fn tag_string(&self) -> String {
        self.tags.to_string()
    }

    /// Returns a new `TaggedMetric` whose tags are `self.tags.add_tags(extra)`
    /// (existing tags win) and whose instrument handle is shared with `self`.
    pub fn add_tags(&self, extra: &Tags) -> TaggedMetric {
        TaggedMetric {
            tags: self.tags.add_tags(extra),
            instrument: self.instrument.clone(),
        }
    }
}
