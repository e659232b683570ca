use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use firmado_core::{AppError, Document};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::document::DocumentRepository;

/// Document repository backed by a process-local map
///
/// Used by tests and local tooling. The write lock gives `mark_signed` the
/// same at-most-once behavior as the conditional UPDATE in PostgreSQL.
#[derive(Clone, Default)]
pub struct InMemoryDocumentRepository {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(
        &self,
        owner_id: Uuid,
        original_name: String,
        stored_name: String,
        content_type: String,
        size: i64,
    ) -> Result<Document, AppError> {
        let document = Document {
            id: Uuid::new_v4(),
            owner_id,
            original_name,
            stored_name,
            content_type,
            size,
            signed: false,
            signed_name: None,
            signature_hash: None,
            signed_at: None,
            uploaded_at: Utc::now(),
        };
        self.documents
            .write()
            .await
            .insert(document.id, document.clone());
        Ok(document)
    }

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
        let document = Document {
            id: Uuid::new_v4(),
            owner_id,
            original_name,
            stored_name,
            content_type,
            size,
            signed: true,
            signed_name: Some(signed_name),
            signature_hash: Some(signature_hash),
            signed_at: Some(signed_at),
            uploaded_at: Utc::now(),
        };
        self.documents
            .write()
            .await
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, AppError> {
        let mut documents: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| doc.owner_id == owner_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(documents
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn mark_signed(
        &self,
        id: Uuid,
        stored_name: &str,
        content_type: &str,
        signed_name: &str,
        signature_hash: &str,
    ) -> Result<Document, AppError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&id) {
            Some(document) if document.signed => Err(AppError::AlreadySigned(format!(
                "Document {} is already signed",
                id
            ))),
            Some(document) => {
                document.signed = true;
                document.stored_name = stored_name.to_string();
                document.content_type = content_type.to_string();
                document.signed_name = Some(signed_name.to_string());
                document.signature_hash = Some(signature_hash.to_string());
                document.signed_at = Some(Utc::now());
                Ok(document.clone())
            }
            None => Err(AppError::NotFound(format!("Document {} not found", id))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.documents.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firmado_core::models::PDF_CONTENT_TYPE;

    async fn create_test_document(repo: &InMemoryDocumentRepository) -> Document {
        repo.create(
            Uuid::new_v4(),
            "contrato.pdf".to_string(),
            format!("{}_contrato.pdf", Uuid::new_v4()),
            PDF_CONTENT_TYPE.to_string(),
            2048,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryDocumentRepository::new();
        let created = create_test_document(&repo).await;

        let found = repo.find(created.id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(!found.signed);
        assert!(found.signed_name.is_none());
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let repo = InMemoryDocumentRepository::new();
        assert!(repo.find(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_signed_updates_record() {
        let repo = InMemoryDocumentRepository::new();
        let created = create_test_document(&repo).await;

        let signed = repo
            .mark_signed(
                created.id,
                &created.stored_name,
                &created.content_type,
                "abc_contrato_Firmado.pdf",
                &"a".repeat(64),
            )
            .await
            .unwrap();

        assert!(signed.signed);
        assert_eq!(
            signed.signed_name.as_deref(),
            Some("abc_contrato_Firmado.pdf")
        );
        assert!(signed.signed_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_signed_twice_is_rejected() {
        let repo = InMemoryDocumentRepository::new();
        let created = create_test_document(&repo).await;

        repo.mark_signed(
            created.id,
            &created.stored_name,
            &created.content_type,
            "first_Firmado.pdf",
            &"a".repeat(64),
        )
        .await
        .unwrap();

        let second = repo
            .mark_signed(
                created.id,
                &created.stored_name,
                &created.content_type,
                "second_Firmado.pdf",
                &"b".repeat(64),
            )
            .await;
        assert!(matches!(second, Err(AppError::AlreadySigned(_))));

        // The losing attempt must not overwrite the committed artifact
        let found = repo.find(created.id).await.unwrap().unwrap();
        assert_eq!(found.signed_name.as_deref(), Some("first_Firmado.pdf"));
    }

    #[tokio::test]
    async fn test_mark_signed_missing_reports_not_found() {
        let repo = InMemoryDocumentRepository::new();
        let result = repo
            .mark_signed(
                Uuid::new_v4(),
                "stored.pdf",
                PDF_CONTENT_TYPE,
                "stored_Firmado.pdf",
                &"a".repeat(64),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_signed_is_committed_immediately() {
        let repo = InMemoryDocumentRepository::new();
        let document = repo
            .create_signed(
                Uuid::new_v4(),
                "externo.pdf".to_string(),
                "abc_externo.pdf".to_string(),
                PDF_CONTENT_TYPE.to_string(),
                4096,
                "abc_externo_signed.pdf".to_string(),
                "c".repeat(64),
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(document.signed);
        assert!(document.signed_at.is_some());
        let attempt = repo
            .mark_signed(
                document.id,
                &document.stored_name,
                &document.content_type,
                "again.pdf",
                &"d".repeat(64),
            )
            .await;
        assert!(matches!(attempt, Err(AppError::AlreadySigned(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner_filters_and_paginates() {
        let repo = InMemoryDocumentRepository::new();
        let owner_id = Uuid::new_v4();
        for i in 0..3 {
            repo.create(
                owner_id,
                format!("doc{}.pdf", i),
                format!("{}_doc{}.pdf", Uuid::new_v4(), i),
                PDF_CONTENT_TYPE.to_string(),
                1024,
            )
            .await
            .unwrap();
        }
        create_test_document(&repo).await; // different owner

        let all = repo.list_by_owner(owner_id, 100, 0).await.unwrap();
        assert_eq!(all.len(), 3);

        let page = repo.list_by_owner(owner_id, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);

        let rest = repo.list_by_owner(owner_id, 100, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_prior_existence() {
        let repo = InMemoryDocumentRepository::new();
        let created = create_test_document(&repo).await;

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.find(created.id).await.unwrap().is_none());
    }
}
