use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Document, DocumentQuery, DocumentStoreError, Result, Version,
    store::{DocumentStore, DocumentStream, PutOptions, validate_document_for_put},
};

type DocumentMap = HashMap<(String, String), Document>;

/// In-memory document store.
///
/// Provides the same interface and concurrency semantics as the
/// PostgreSQL implementation; used by tests and by the API when no
/// database is configured.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<DocumentMap>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Clears all documents.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }

    fn sorted(mut documents: Vec<Document>) -> Vec<Document> {
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.key.cmp(&b.key)));
        documents
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let store = self.documents.read().await;
        Ok(store
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(&self, mut document: Document, options: PutOptions) -> Result<Version> {
        validate_document_for_put(&document)?;

        let id = (document.collection.clone(), document.key.clone());
        let mut store = self.documents.write().await;

        let existing = store.get(&id);
        let current_version = existing
            .map(|d| d.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            tracing::debug!(
                collection = %document.collection,
                key = %document.key,
                %expected,
                actual = %current_version,
                "Rejected stale document write"
            );
            return Err(DocumentStoreError::ConcurrencyConflict {
                collection: document.collection,
                key: document.key,
                expected,
                actual: current_version,
            });
        }

        let new_version = current_version.next();
        if let Some(existing) = existing {
            document.created_at = existing.created_at;
            document.updated_at = Utc::now();
        }
        document.version = new_version;
        store.insert(id, document);

        metrics::counter!("documents_written_total").increment(1);
        Ok(new_version)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let mut store = self.documents.write().await;
        Ok(store
            .remove(&(collection.to_string(), key.to_string()))
            .is_some())
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let store = self.documents.read().await;
        let documents: Vec<_> = store
            .values()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();

        // Apply offset and limit
        let offset = query.offset.unwrap_or(0);
        let documents = Self::sorted(documents).into_iter().skip(offset);

        let documents = if let Some(limit) = query.limit {
            documents.take(limit).collect()
        } else {
            documents.collect()
        };

        Ok(documents)
    }

    async fn stream_collection(&self, collection: &str) -> Result<DocumentStream> {
        use futures_util::stream;

        let store = self.documents.read().await;
        let documents: Vec<_> = store
            .values()
            .filter(|d| d.collection == collection)
            .cloned()
            .collect();

        let stream = stream::iter(Self::sorted(documents).into_iter().map(Ok));
        Ok(Box::pin(stream))
    }
}
