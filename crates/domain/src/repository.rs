//! Versioned load/save of entities over a document store.

use std::marker::PhantomData;

use document_store::{Document, DocumentQuery, DocumentStore, DocumentStoreExt, PutOptions, Version};

use crate::entity::Entity;
use crate::error::Result;

/// An entity together with the version it was read or written at.
#[derive(Debug, Clone)]
pub struct Stored<E> {
    pub entity: E,
    pub version: Version,
}

impl<E> Stored<E> {
    /// Wraps an entity that has never been written.
    pub fn fresh(entity: E) -> Self {
        Self {
            entity,
            version: Version::initial(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.version == Version::initial()
    }

    pub fn into_inner(self) -> E {
        self.entity
    }
}

/// Loads and persists one kind of entity.
///
/// Writes always carry the version the entity was read at, so a writer
/// that lost a race gets `InventoryError::Conflict` instead of silently
/// overwriting the winner.
pub struct Repository<S, E>
where
    S: DocumentStore,
    E: Entity,
{
    store: S,
    _phantom: PhantomData<E>,
}

impl<S, E> Clone for Repository<S, E>
where
    S: DocumentStore + Clone,
    E: Entity,
{
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<S, E> Repository<S, E>
where
    S: DocumentStore,
    E: Entity,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an entity by key.
    pub async fn load(&self, key: &str) -> Result<Option<Stored<E>>> {
        match self.store.get_as::<E>(E::COLLECTION, key).await? {
            Some((entity, document)) => Ok(Some(Stored {
                entity,
                version: document.version,
            })),
            None => Ok(None),
        }
    }

    /// Loads every entity whose key starts with `prefix`.
    pub async fn load_prefix(&self, prefix: &str) -> Result<Vec<Stored<E>>> {
        self.query(DocumentQuery::collection(E::COLLECTION).key_prefix(prefix))
            .await
    }

    /// Runs a query against the entity's collection.
    pub async fn query(&self, query: DocumentQuery) -> Result<Vec<Stored<E>>> {
        let query = DocumentQuery {
            collection: E::COLLECTION.to_string(),
            ..query
        };
        let documents = self.store.query(query).await?;
        documents.into_iter().map(Self::decode).collect()
    }

    /// Loads the whole collection.
    pub async fn scan(&self) -> Result<Vec<E>> {
        let documents = self.store.collect_collection(E::COLLECTION).await?;
        documents
            .into_iter()
            .map(|document| Ok(document.decode()?))
            .collect()
    }

    /// Writes an entity, requiring the stored version to still be `stored.version`.
    pub async fn save(&self, stored: Stored<E>) -> Result<Stored<E>> {
        let document = Document::from_body(E::COLLECTION, stored.entity.key(), &stored.entity)?
            .created_at(stored.entity.created_at());
        let version = self
            .store
            .put(document, PutOptions::expect_version(stored.version))
            .await?;
        Ok(Stored {
            entity: stored.entity,
            version,
        })
    }

    /// Loads an entity, lets `mutate` change it, and writes it back.
    ///
    /// `mutate` receives `None` when no entity exists under the key and
    /// decides whether to create one.
    pub async fn update<F>(&self, key: &str, mutate: F) -> Result<Stored<E>>
    where
        F: FnOnce(Option<E>) -> Result<E>,
    {
        let loaded = self.load(key).await?;
        let version = loaded
            .as_ref()
            .map(|stored| stored.version)
            .unwrap_or(Version::initial());
        let entity = mutate(loaded.map(Stored::into_inner))?;
        self.save(Stored { entity, version }).await
    }

    /// Deletes an entity. Returns false if it did not exist.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.store.delete(E::COLLECTION, key).await?)
    }

    fn decode(document: Document) -> Result<Stored<E>> {
        Ok(Stored {
            entity: document.decode()?,
            version: document.version,
        })
    }
}
