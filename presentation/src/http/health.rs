//! `/healthz` checks
//!
//! Each registered check is an async closure producing a
//! [`HealthCheckResult`]. Without the configured password the endpoint only
//! answers `OK` or `Service Unavailable`; with `?code=<password>` it returns
//! the full [`HealthCheckSummary`].

use futures::future::{BoxFuture, join_all};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::error;

const DEFAULT_CHECK: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub status: bool,
    pub message: String,
}

impl HealthCheckResult {
    pub fn new(status: bool, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Aggregated results; `status` is false as soon as one result fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckSummary {
    pub status: bool,
    pub results: BTreeMap<String, HealthCheckResult>,
}

impl Default for HealthCheckSummary {
    fn default() -> Self {
        Self {
            status: true,
            results: BTreeMap::new(),
        }
    }
}

impl HealthCheckSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, result: HealthCheckResult) {
        self.status = self.status && result.status;
        self.results.insert(name.into(), result);
    }

    pub fn add_default(&mut self) {
        self.add(DEFAULT_CHECK, HealthCheckResult::new(true, "This is the default check"));
    }

    pub fn add_exception(&mut self, name: impl Into<String>, err: impl std::fmt::Display) {
        let name = name.into();
        error!("Health check {name} failed: {err}");
        self.add(name, HealthCheckResult::new(false, err.to_string()));
    }
}

type CheckFn = dyn Fn() -> BoxFuture<'static, Result<HealthCheckResult, String>> + Send + Sync;

/// Named async health checks
#[derive(Clone, Default)]
pub struct HealthChecks {
    checks: Vec<(String, Arc<CheckFn>)>,
}

impl HealthChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check<F, Fut>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HealthCheckResult, String>> + Send + 'static,
    {
        let check: Arc<CheckFn> =
            Arc::new(move || -> BoxFuture<'static, _> { Box::pin(check()) });
        self.checks.push((name.into(), check));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check concurrently.
    pub async fn run(&self) -> HealthCheckSummary {
        let mut summary = HealthCheckSummary::new();
        summary.add_default();

        let outcomes = join_all(self.checks.iter().map(|(_, check)| check.as_ref()())).await;
        for ((name, _), outcome) in self.checks.iter().zip(outcomes) {
            match outcome {
                Ok(result) => summary.add(name.clone(), result),
                Err(err) => summary.add_exception(name.clone(), err),
            }
        }
        summary
    }
}
