use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Document, DocumentQuery, DocumentStoreError, Result, Version,
    store::{DocumentStore, DocumentStream, PutOptions, validate_document_for_put},
};

/// PostgreSQL-backed document store implementation.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            collection: row.try_get("collection")?,
            key: row.try_get("key")?,
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            body: row.try_get("body")?,
        })
    }

    fn conflict(document: &Document, expected: Version, actual: Version) -> DocumentStoreError {
        tracing::debug!(
            collection = %document.collection,
            key = %document.key,
            %expected,
            %actual,
            "Rejected stale document write"
        );
        DocumentStoreError::ConcurrencyConflict {
            collection: document.collection.clone(),
            key: document.key.clone(),
            expected,
            actual,
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT collection, key, version, created_at, updated_at, body
            FROM documents
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn put(&self, document: Document, options: PutOptions) -> Result<Version> {
        validate_document_for_put(&document)?;

        let mut tx = self.pool.begin().await?;

        // Lock the row (if any) so the version check and the write are one unit
        let current: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND key = $2 FOR UPDATE",
        )
        .bind(&document.collection)
        .bind(&document.key)
        .fetch_optional(&mut *tx)
        .await?;

        let current_version = Version::new(current.unwrap_or(0));

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(Self::conflict(&document, expected, current_version));
        }

        let new_version = current_version.next();

        if current.is_some() {
            sqlx::query(
                r#"
                UPDATE documents
                SET version = $3, updated_at = NOW(), body = $4
                WHERE collection = $1 AND key = $2
                "#,
            )
            .bind(&document.collection)
            .bind(&document.key)
            .bind(new_version.as_i64())
            .bind(&document.body)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO documents (collection, key, version, created_at, updated_at, body)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&document.collection)
            .bind(&document.key)
            .bind(new_version.as_i64())
            .bind(document.created_at)
            .bind(document.updated_at)
            .bind(&document.body)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // A concurrent insert of the same key won the race
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("documents_pkey")
                {
                    return Self::conflict(
                        &document,
                        options.expected_version.unwrap_or(Version::initial()),
                        Version::first(),
                    );
                }
                DocumentStoreError::Database(e)
            })?;
        }

        tx.commit().await?;
        metrics::counter!("documents_written_total").increment(1);
        Ok(new_version)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let mut sql = String::from(
            "SELECT collection, key, version, created_at, updated_at, body FROM documents WHERE collection = $1",
        );
        let mut param_count = 1;

        // Build dynamic query
        if query.key_prefix.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND starts_with(key, ${param_count})"));
        }
        if query.created_from.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.created_to.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at ASC, key ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        // Build and execute query with parameters
        let mut sqlx_query = sqlx::query(&sql).bind(&query.collection);

        if let Some(ref prefix) = query.key_prefix {
            sqlx_query = sqlx_query.bind(prefix);
        }
        if let Some(from) = query.created_from {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.created_to {
            sqlx_query = sqlx_query.bind(to);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn stream_collection(&self, collection: &str) -> Result<DocumentStream> {
        use futures_util::StreamExt;

        let stream = sqlx::query(
            r#"
            SELECT collection, key, version, created_at, updated_at, body
            FROM documents
            WHERE collection = $1
            ORDER BY created_at ASC, key ASC
            "#,
        )
        .bind(collection.to_string())
        .fetch(&self.pool)
        .map(|result| match result {
            Ok(row) => Self::row_to_document(row),
            Err(e) => Err(DocumentStoreError::Database(e)),
        });

        Ok(Box::pin(stream))
    }
}
