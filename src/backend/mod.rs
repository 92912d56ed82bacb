//! Remote backend access
//!
//! Wraps the hosted service's REST API behind three seams: the post
//! document collection, the file bucket, and the account/session API.
//! Each seam has a reqwest-backed client and an in-memory mock so the
//! façades can be exercised without a live backend.

pub mod account;
pub mod documents;
pub mod files;
pub mod http;
pub mod mock;

pub use account::AccountClient;
pub use documents::DocumentClient;
pub use files::FileClient;
pub use http::BackendHttpClient;
pub use mock::{MockAccountClient, MockDocumentClient, MockFileClient};

use crate::models::{Account, Document, Query, Session, StoredFile};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn create(&self, id: &str, fields: serde_json::Map<String, Value>) -> Result<Document>;
    async fn get(&self, id: &str) -> Result<Document>;
    async fn update(&self, id: &str, fields: serde_json::Map<String, Value>) -> Result<Document>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn list(&self, queries: &[Query]) -> Result<Vec<Document>>;
}

#[async_trait]
pub trait FileService: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, filename: &str, content_type: &str)
        -> Result<StoredFile>;
    async fn delete(&self, file_id: &str) -> Result<()>;
    fn view_url(&self, file_id: &str) -> String;
    fn download_url(&self, file_id: &str) -> String;
    async fn url_is_reachable(&self, url: &str) -> bool;
}

#[async_trait]
pub trait AccountService: Send + Sync {
    async fn create(&self, email: &str, password: &str, name: &str) -> Result<Account>;
    async fn create_session(&self, email: &str, password: &str) -> Result<Session>;
    async fn current(&self) -> Result<Account>;
    async fn delete_sessions(&self) -> Result<()>;
}
