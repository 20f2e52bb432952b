use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::{Document, DocumentQuery, DocumentStoreError, Result, Version};

/// Options for writing a document.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Version the writer read the document at.
    /// If None, no version check is performed (last write wins).
    pub expected_version: Option<Version>,
}

impl PutOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the document to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }

    /// Creates options expecting the version carried by the document itself.
    pub fn matching(document: &Document) -> Self {
        Self::expect_version(document.version)
    }
}

/// A stream of documents.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<Document>> + Send>>;

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document by collection and key.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Writes a document.
    ///
    /// If `options.expected_version` is set, the write fails with
    /// `ConcurrencyConflict` unless the stored version matches. The stored
    /// `created_at` is kept on update; on insert the document's own
    /// `created_at` is used.
    ///
    /// Returns the new version of the document.
    async fn put(&self, document: Document, options: PutOptions) -> Result<Version>;

    /// Deletes a document. Returns false if it did not exist.
    async fn delete(&self, collection: &str, key: &str) -> Result<bool>;

    /// Retrieves documents matching a query, ordered by creation time then key.
    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Streams every document of a collection, ordered by creation time then key.
    async fn stream_collection(&self, collection: &str) -> Result<DocumentStream>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Loads and decodes a document body.
    async fn get_as<T: DeserializeOwned + Send>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<(T, Document)>> {
        match self.get(collection, key).await? {
            Some(document) => {
                let body = document.decode()?;
                Ok(Some((body, document)))
            }
            None => Ok(None),
        }
    }

    /// Checks if a document exists.
    async fn exists(&self, collection: &str, key: &str) -> Result<bool> {
        Ok(self.get(collection, key).await?.is_some())
    }

    /// Collects a full collection scan into memory.
    async fn collect_collection(&self, collection: &str) -> Result<Vec<Document>> {
        let mut stream = self.stream_collection(collection).await?;
        let mut documents = Vec::new();
        while let Some(document) = stream.next().await {
            documents.push(document?);
        }
        Ok(documents)
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Validates a document before it is written.
pub fn validate_document_for_put(document: &Document) -> Result<()> {
    if document.collection.is_empty() {
        return Err(DocumentStoreError::InvalidKey(
            "collection must not be empty".to_string(),
        ));
    }
    if document.key.is_empty() {
        return Err(DocumentStoreError::InvalidKey(format!(
            "empty key in collection {}",
            document.collection
        )));
    }
    Ok(())
}
