use chrono::{DateTime, Utc};
use firmado_core::{AppError, Document};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Trait for document repository operations
/// This abstracts the database implementation (PostgreSQL)
#[async_trait::async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(
        &self,
        owner_id: Uuid,
        original_name: String,
        stored_name: String,
        content_type: String,
        size: i64,
    ) -> Result<Document, AppError>;

    /// Register a document that arrives already signed, for example one
    /// signed by an external authority and uploaded for record keeping.
    /// The caller supplies the hash and timestamp recorded at signing time.
    #[allow(clippy::too_many_arguments)]
    async fn create_signed(
        &self,
        owner_id: Uuid,
        original_name: String,
        stored_name: String,
        content_type: String,
        size: i64,
        signed_name: String,
        signature_hash: String,
        signed_at: DateTime<Utc>,
    ) -> Result<Document, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, AppError>;

    /// Commit a signing attempt.
    ///
    /// The update only applies while `signed` is still false, so concurrent
    /// attempts cannot both win. Losing the race reports `AlreadySigned`;
    /// a record that disappeared underneath reports `NotFound`.
    async fn mark_signed(
        &self,
        id: Uuid,
        stored_name: &str,
        content_type: &str,
        signed_name: &str,
        signature_hash: &str,
    ) -> Result<Document, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Document repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DocumentRepository for PgDocumentRepository {
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "insert"))]
    async fn create(
        &self,
        owner_id: Uuid,
        original_name: String,
        stored_name: String,
        content_type: String,
        size: i64,
    ) -> Result<Document, AppError> {
        let id = Uuid::new_v4();
        let document = sqlx::query_as::<Postgres, Document>(
            r#"
            INSERT INTO documents (id, owner_id, original_name, stored_name, content_type, size, signed, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&original_name)
        .bind(&stored_name)
        .bind(&content_type)
        .bind(size)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "insert"))]
    async fn create_signed(
        &self,
        owner_id: Uuid,
        original_name: String,
        stored_name: String,
        content_type: String,
        size: i64,
        signed_name: String,
        signature_hash: String,
        signed_at: DateTime<Utc>,
    ) -> Result<Document, AppError> {
        let id = Uuid::new_v4();
        let document = sqlx::query_as::<Postgres, Document>(
            r#"
            INSERT INTO documents (id, owner_id, original_name, stored_name, content_type, size,
                                   signed, signed_name, signature_hash, signed_at, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8, $9, NOW())
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&original_name)
        .bind(&stored_name)
        .bind(&content_type)
        .bind(size)
        .bind(&signed_name)
        .bind(&signature_hash)
        .bind(signed_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select", db.record_id = %id))]
    async fn find(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let document =
            sqlx::query_as::<Postgres, Document>("SELECT * FROM documents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(document)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, AppError> {
        let documents = sqlx::query_as::<Postgres, Document>(
            "SELECT * FROM documents WHERE owner_id = $1 ORDER BY uploaded_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    #[tracing::instrument(skip(self, signature_hash), fields(db.table = "documents", db.operation = "update", db.record_id = %id))]
    async fn mark_signed(
        &self,
        id: Uuid,
        stored_name: &str,
        content_type: &str,
        signed_name: &str,
        signature_hash: &str,
    ) -> Result<Document, AppError> {
        let updated = sqlx::query_as::<Postgres, Document>(
            r#"
            UPDATE documents
            SET signed = TRUE,
                stored_name = $2,
                content_type = $3,
                signed_name = $4,
                signature_hash = $5,
                signed_at = NOW()
            WHERE id = $1 AND signed = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(stored_name)
        .bind(content_type)
        .bind(signed_name)
        .bind(signature_hash)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(document) => Ok(document),
            // No row matched: the document either lost a signing race or
            // never existed; re-fetch to tell the two apart
            None => match self.find(id).await? {
                Some(_) => Err(AppError::AlreadySigned(format!(
                    "Document {} is already signed",
                    id
                ))),
                None => Err(AppError::NotFound(format!("Document {} not found", id))),
            },
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
