//! Counts of recent inbound-to-storage moves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use domain::{InboundRecordLog, RecordSummary};

use crate::Result;
use crate::report::Report;

/// Daily, weekly and monthly counts of audit records.
pub struct InboundSummary<S: DocumentStore> {
    records: InboundRecordLog<S>,
}

impl<S: DocumentStore> InboundSummary<S> {
    pub fn new(records: InboundRecordLog<S>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl<S: DocumentStore> Report for InboundSummary<S> {
    type Output = RecordSummary;

    fn name(&self) -> &'static str {
        "inbound_summary"
    }

    async fn generate(&self, now: DateTime<Utc>) -> Result<RecordSummary> {
        Ok(self.records.summary(now).await?)
    }
}
