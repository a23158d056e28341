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

//! Error taxonomy for the metrics system.

use crate::tags::Tags;
use std::fmt::{self, Display};

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
///
/// All registry errors are returned values; the registry never terminates
/// the process. Callers decide whether to unregister and retry or ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// A metric is already registered under the same name and tag identity.
    /// If you mean to register it you must first unregister the existing
    /// metric.
    DuplicateMetric {
        /// The metric name that collided.
        name: String,
        /// The tag set of the rejected registration.
        tags: Tags,
    },
    /// A tag string did not follow the comma-separated `key=value` format.
    TagParse {
        /// The malformed input, verbatim.
        input: String,
    },
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::DuplicateMetric { name, tags } => {
                write!(f, "duplicate metric: {name} {tags}")
            }
            MetricsError::TagParse { input } => {
                write!(
                    f,
                    "comma delimited tag should follow the format tag=value: {input}"
                )
            }
        }
    }
}

impl std::error::Error for MetricsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_metric_display_names_metric_and_tags() {
        let err = MetricsError::DuplicateMetric {
            name: "requests".to_string(),
            tags: Tags::from([("host", "web01")]),
        };
        assert_eq!(err.to_string(), "duplicate metric: requests host=web01");
    }

    #[test]
    fn test_tag_parse_display_names_input() {
        let err = MetricsError::TagParse {
            input: "a=1,b".to_string(),
        };
        assert!(err.to_string().ends_with("tag=value: a=1,b"));
    }
}
