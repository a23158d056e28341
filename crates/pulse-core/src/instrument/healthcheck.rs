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

use std::fmt;
use std::sync::{Arc, Mutex};

type CheckFn = dyn Fn() -> Result<(), String> + Send + Sync;

/// The last observed result of a health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The check has never run.
    Unknown,
    /// The last run succeeded.
    Healthy,
    /// The last run failed, with the failure message.
    Unhealthy(String),
}

/// A liveness probe: a user-supplied check function plus its last result.
/// Cloning shares the stored status.
///
/// Results are read back through the handle; running the check returns
/// nothing.
#[derive(Clone)]
pub struct HealthCheck {
    inner: Arc<Inner>,
}

struct Inner {
    check: Box<CheckFn>,
    status: Mutex<HealthStatus>,
}

impl HealthCheck {
    /// Creates a health check around `check`.
    pub fn new(check: impl Fn() -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                check: Box::new(check),
                status: Mutex::new(HealthStatus::Unknown),
            }),
        }
    }

    /// Runs the check and stores the outcome.
    pub fn check(&self) {
        let outcome = match (self.inner.check)() {
            Ok(()) => HealthStatus::Healthy,
            Err(message) => HealthStatus::Unhealthy(message),
        };
        *self.inner.status.lock().unwrap() = outcome;
    }

    /// Returns the last observed status.
    pub fn status(&self) -> HealthStatus {
        self.inner.status.lock().unwrap().clone()
    }

    /// Returns `true` when the last run succeeded.
    pub fn is_healthy(&self) -> bool {
        self.status() == HealthStatus::Healthy
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_status_starts_unknown() {
        let hc = HealthCheck::new(|| Ok(()));
        assert_eq!(hc.status(), HealthStatus::Unknown);
        assert!(!hc.is_healthy());
    }

    #[test]
    fn test_check_stores_latest_outcome() {
        let broken = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&broken);
        let hc = HealthCheck::new(move || {
            if flag.load(Ordering::SeqCst) {
                Err("backend unreachable".to_string())
            } else {
                Ok(())
            }
        });

        hc.check();
        assert!(hc.is_healthy());

        broken.store(true, Ordering::SeqCst);
        hc.check();
        assert_eq!(
            hc.status(),
            HealthStatus::Unhealthy("backend unreachable".to_string())
        );
    }

    #[test]
    fn test_clone_shares_status() {
        let hc = HealthCheck::new(|| Ok(()));
        let view = hc.clone();
        hc.check();
        assert!(view.is_healthy());
    }
}
