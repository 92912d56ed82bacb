use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::backend::http::BackendHttpClient;
use crate::backend::DocumentService;
use crate::models::{Config, Document, DocumentList, Query};
use crate::Result;

/// REST client for the post collection.
///
/// Documents live under
/// `databases/{database}/collections/{collection}/documents`; the caller
/// supplies the document id on create so post slugs double as ids.
pub struct DocumentClient {
    http: BackendHttpClient,
    database_id: String,
    collection_id: String,
}

#[derive(Debug, Serialize)]
struct CreateDocumentRequest<'a> {
    #[serde(rename = "documentId")]
    document_id: &'a str,
    data: &'a serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct UpdateDocumentRequest<'a> {
    data: &'a serde_json::Map<String, Value>,
}

impl DocumentClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = BackendHttpClient::new(&config.endpoint, &config.project_id)?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: BackendHttpClient, config: &Config) -> Self {
        Self {
            http,
            database_id: config.database_id.clone(),
            collection_id: config.collection_id.clone(),
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "databases/{}/collections/{}/documents",
            self.database_id, self.collection_id
        )
    }

    fn document_path(&self, id: &str) -> String {
        format!("{}/{}", self.collection_path(), id)
    }
}

#[async_trait]
impl DocumentService for DocumentClient {
    async fn create(&self, id: &str, fields: serde_json::Map<String, Value>) -> Result<Document> {
        tracing::debug!("Creating document {}", id);
        let request = CreateDocumentRequest {
            document_id: id,
            data: &fields,
        };
        self.http.post_json(&self.collection_path(), &request).await
    }

    async fn get(&self, id: &str) -> Result<Document> {
        self.http.get_json(&self.document_path(id)).await
    }

    async fn update(&self, id: &str, fields: serde_json::Map<String, Value>) -> Result<Document> {
        tracing::debug!("Updating document {}", id);
        let request = UpdateDocumentRequest { data: &fields };
        self.http.patch_json(&self.document_path(id), &request).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        tracing::debug!("Deleting document {}", id);
        self.http.delete(&self.document_path(id)).await
    }

    async fn list(&self, queries: &[Query]) -> Result<Vec<Document>> {
        let mut params = Vec::with_capacity(queries.len());
        for query in queries {
            params.push(("queries[]", query.to_wire()?));
        }
        let list: DocumentList = self
            .http
            .get_json_query(&self.collection_path(), &params)
            .await?;
        Ok(list.documents)
    }
}
