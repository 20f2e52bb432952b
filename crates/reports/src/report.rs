//! Common shape of read-side reports.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;

/// A report computed on demand from current inventory state.
///
/// Reports take no snapshot: a report built while writers are active may
/// mix pre- and post-write state.
#[async_trait]
pub trait Report: Send + Sync {
    type Output: Send;

    /// Returns the name of this report.
    fn name(&self) -> &'static str;

    /// Builds the report as of `now`.
    async fn generate(&self, now: DateTime<Utc>) -> Result<Self::Output>;
}

/// Builds a report, recording how long it took.
pub async fn run<R: Report>(report: &R, now: DateTime<Utc>) -> Result<R::Output> {
    let start = Instant::now();
    let result = report.generate(now).await;
    metrics::histogram!("report_duration_seconds", "report" => report.name())
        .record(start.elapsed().as_secs_f64());
    if let Err(ref err) = result {
        tracing::error!(report = report.name(), error = %err, "report failed");
    }
    result
}
