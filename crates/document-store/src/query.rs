use chrono::{DateTime, Utc};

use crate::Document;

/// Builder for constructing document queries.
///
/// Every filter is optional; a query with only a collection returns the
/// whole collection.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Collection to read from.
    pub collection: String,

    /// Filter by key prefix.
    pub key_prefix: Option<String>,

    /// Filter by documents created at or after this timestamp.
    pub created_from: Option<DateTime<Utc>>,

    /// Filter by documents created at or before this timestamp.
    pub created_to: Option<DateTime<Utc>>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl DocumentQuery {
    /// Creates a query over a whole collection.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Filters by key prefix.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Filters to documents created at or after this timestamp.
    pub fn created_from(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_from = Some(timestamp);
        self
    }

    /// Filters to documents created at or before this timestamp.
    pub fn created_to(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_to = Some(timestamp);
        self
    }

    /// Filters to documents created within the inclusive range.
    pub fn created_between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from(from).created_to(to)
    }

    /// Limits the number of documents returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many documents before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the document passes every filter except paging.
    pub fn matches(&self, document: &Document) -> bool {
        if document.collection != self.collection {
            return false;
        }
        if let Some(ref prefix) = self.key_prefix
            && !document.key.starts_with(prefix.as_str())
        {
            return false;
        }
        if let Some(from) = self.created_from
            && document.created_at < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && document.created_at > to
        {
            return false;
        }
        true
    }
}
