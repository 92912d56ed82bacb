use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{AccountService, DocumentService, FileService};
use crate::models::{Account, Document, Query, QueryMethod, Session, StoredFile};
use crate::{Error, Result};

fn unavailable(what: &str) -> Error {
    Error::Backend {
        status: 503,
        message: format!("{} unavailable", what),
    }
}

fn matches(document: &Document, query: &Query) -> bool {
    let actual = document
        .fields
        .get(&query.attribute)
        .cloned()
        .unwrap_or(Value::Null);
    match query.method {
        QueryMethod::Equal => query.values.contains(&actual),
        QueryMethod::NotEqual => !query.values.contains(&actual),
    }
}

/// In-memory document collection keyed by document id.
///
/// Updates merge into the stored fields the way the real collection does,
/// so partial patches leave unmentioned attributes alone.
#[derive(Clone)]
pub struct MockDocumentClient {
    documents: Arc<Mutex<BTreeMap<String, Document>>>,
    create_count: Arc<Mutex<usize>>,
    update_count: Arc<Mutex<usize>>,
    delete_count: Arc<Mutex<usize>>,
    fail_create: bool,
    fail_update: bool,
    fail_delete: bool,
}

impl MockDocumentClient {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(BTreeMap::new())),
            create_count: Arc::new(Mutex::new(0)),
            update_count: Arc::new(Mutex::new(0)),
            delete_count: Arc::new(Mutex::new(0)),
            fail_create: false,
            fail_update: false,
            fail_delete: false,
        }
    }

    pub fn with_document(self, id: &str, fields: serde_json::Map<String, Value>) -> Self {
        let now = Utc::now();
        self.documents.lock().unwrap().insert(
            id.to_string(),
            Document {
                id: id.to_string(),
                created_at: now,
                updated_at: now,
                fields,
            },
        );
        self
    }

    pub fn with_create_failure(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn with_update_failure(mut self) -> Self {
        self.fail_update = true;
        self
    }

    pub fn with_delete_failure(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn get_create_count(&self) -> usize {
        *self.create_count.lock().unwrap()
    }

    pub fn get_update_count(&self) -> usize {
        *self.update_count.lock().unwrap()
    }

    pub fn get_delete_count(&self) -> usize {
        *self.delete_count.lock().unwrap()
    }

    pub fn get_documents(&self) -> BTreeMap<String, Document> {
        self.documents.lock().unwrap().clone()
    }
}

impl Default for MockDocumentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentService for MockDocumentClient {
    async fn create(&self, id: &str, fields: serde_json::Map<String, Value>) -> Result<Document> {
        *self.create_count.lock().unwrap() += 1;

        if self.fail_create {
            return Err(unavailable("document collection"));
        }

        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(id) {
            return Err(Error::Conflict(format!("document {} already exists", id)));
        }
        let now = Utc::now();
        let document = Document {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
            fields,
        };
        documents.insert(id.to_string(), document.clone());
        Ok(document)
    }

    async fn get(&self, id: &str) -> Result<Document> {
        self.documents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("document {} not found", id)))
    }

    async fn update(&self, id: &str, fields: serde_json::Map<String, Value>) -> Result<Document> {
        *self.update_count.lock().unwrap() += 1;

        if self.fail_update {
            return Err(unavailable("document collection"));
        }

        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("document {} not found", id)))?;
        for (key, value) in fields {
            document.fields.insert(key, value);
        }
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        *self.delete_count.lock().unwrap() += 1;

        if self.fail_delete {
            return Err(unavailable("document collection"));
        }

        self.documents
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("document {} not found", id)))
    }

    async fn list(&self, queries: &[Query]) -> Result<Vec<Document>> {
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .values()
            .filter(|document| queries.iter().all(|query| matches(document, query)))
            .cloned()
            .collect())
    }
}

/// In-memory file bucket that mints ids on upload.
#[derive(Clone)]
pub struct MockFileClient {
    files: Arc<Mutex<BTreeMap<String, StoredFile>>>,
    deleted_ids: Arc<Mutex<Vec<String>>>,
    unreachable_urls: Arc<Mutex<HashSet<String>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    delete_count: Arc<Mutex<usize>>,
    fail_upload: bool,
    fail_delete: bool,
}

impl MockFileClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(BTreeMap::new())),
            deleted_ids: Arc::new(Mutex::new(Vec::new())),
            unreachable_urls: Arc::new(Mutex::new(HashSet::new())),
            base_url: "https://mock-bucket.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            delete_count: Arc::new(Mutex::new(0)),
            fail_upload: false,
            fail_delete: false,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_file(self, id: &str, name: &str, mime_type: &str, size: u64) -> Self {
        self.files.lock().unwrap().insert(
            id.to_string(),
            StoredFile {
                id: id.to_string(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                size,
            },
        );
        self
    }

    pub fn with_upload_failure(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn with_delete_failure(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn with_unreachable_url(self, url: &str) -> Self {
        self.unreachable_urls.lock().unwrap().insert(url.to_string());
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_delete_count(&self) -> usize {
        *self.delete_count.lock().unwrap()
    }

    pub fn get_files(&self) -> BTreeMap<String, StoredFile> {
        self.files.lock().unwrap().clone()
    }

    pub fn get_deleted_ids(&self) -> Vec<String> {
        self.deleted_ids.lock().unwrap().clone()
    }
}

impl Default for MockFileClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileService for MockFileClient {
    async fn upload(&self, bytes: Vec<u8>, filename: &str, content_type: &str) -> Result<StoredFile> {
        *self.upload_count.lock().unwrap() += 1;

        if self.fail_upload {
            return Err(unavailable("file bucket"));
        }

        let file = StoredFile {
            id: Uuid::new_v4().to_string(),
            name: filename.to_string(),
            mime_type: content_type.to_string(),
            size: bytes.len() as u64,
        };
        self.files
            .lock()
            .unwrap()
            .insert(file.id.clone(), file.clone());
        Ok(file)
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        *self.delete_count.lock().unwrap() += 1;

        if self.fail_delete {
            return Err(unavailable("file bucket"));
        }

        self.deleted_ids.lock().unwrap().push(file_id.to_string());
        self.files
            .lock()
            .unwrap()
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("file {} not found", file_id)))
    }

    fn view_url(&self, file_id: &str) -> String {
        format!("{}/files/{}/view", self.base_url, file_id)
    }

    fn download_url(&self, file_id: &str) -> String {
        format!("{}/files/{}/download", self.base_url, file_id)
    }

    async fn url_is_reachable(&self, url: &str) -> bool {
        !self.unreachable_urls.lock().unwrap().contains(url)
    }
}

struct RegisteredAccount {
    account: Account,
    password: String,
}

/// In-memory account directory with at most one live session.
#[derive(Clone)]
pub struct MockAccountClient {
    accounts: Arc<Mutex<Vec<RegisteredAccount>>>,
    session_user: Arc<Mutex<Option<String>>>,
    create_count: Arc<Mutex<usize>>,
    session_count: Arc<Mutex<usize>>,
    delete_sessions_count: Arc<Mutex<usize>>,
    fail_delete_sessions: bool,
}

impl MockAccountClient {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(Mutex::new(Vec::new())),
            session_user: Arc::new(Mutex::new(None)),
            create_count: Arc::new(Mutex::new(0)),
            session_count: Arc::new(Mutex::new(0)),
            delete_sessions_count: Arc::new(Mutex::new(0)),
            fail_delete_sessions: false,
        }
    }

    pub fn with_account(self, email: &str, password: &str, name: &str) -> Self {
        self.accounts.lock().unwrap().push(RegisteredAccount {
            account: Account {
                id: Uuid::new_v4().to_string(),
                email: email.to_string(),
                name: name.to_string(),
            },
            password: password.to_string(),
        });
        self
    }

    /// Opens a session for an already-seeded account, skipping the login call.
    pub fn with_session(self, email: &str) -> Self {
        let id = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|registered| registered.account.email == email)
            .map(|registered| registered.account.id.clone());
        *self.session_user.lock().unwrap() = id;
        self
    }

    pub fn with_delete_sessions_failure(mut self) -> Self {
        self.fail_delete_sessions = true;
        self
    }

    pub fn get_create_count(&self) -> usize {
        *self.create_count.lock().unwrap()
    }

    pub fn get_session_count(&self) -> usize {
        *self.session_count.lock().unwrap()
    }

    pub fn get_delete_sessions_count(&self) -> usize {
        *self.delete_sessions_count.lock().unwrap()
    }

    pub fn get_accounts(&self) -> Vec<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .map(|registered| registered.account.clone())
            .collect()
    }

    pub fn has_session(&self) -> bool {
        self.session_user.lock().unwrap().is_some()
    }
}

impl Default for MockAccountClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountService for MockAccountClient {
    async fn create(&self, email: &str, password: &str, name: &str) -> Result<Account> {
        *self.create_count.lock().unwrap() += 1;

        let mut accounts = self.accounts.lock().unwrap();
        if accounts
            .iter()
            .any(|registered| registered.account.email == email)
        {
            return Err(Error::Conflict(format!("account {} already exists", email)));
        }
        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        accounts.push(RegisteredAccount {
            account: account.clone(),
            password: password.to_string(),
        });
        Ok(account)
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<Session> {
        *self.session_count.lock().unwrap() += 1;

        let accounts = self.accounts.lock().unwrap();
        let registered = accounts
            .iter()
            .find(|registered| registered.account.email == email && registered.password == password)
            .ok_or_else(|| Error::Unauthorized("invalid credentials".to_string()))?;
        *self.session_user.lock().unwrap() = Some(registered.account.id.clone());
        Ok(Session {
            id: Uuid::new_v4().to_string(),
            user_id: registered.account.id.clone(),
        })
    }

    async fn current(&self) -> Result<Account> {
        let session_user = self.session_user.lock().unwrap();
        let user_id = session_user
            .as_ref()
            .ok_or_else(|| Error::Unauthorized("no active session".to_string()))?;
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|registered| &registered.account.id == user_id)
            .map(|registered| registered.account.clone())
            .ok_or_else(|| Error::Unauthorized("no active session".to_string()))
    }

    async fn delete_sessions(&self) -> Result<()> {
        *self.delete_sessions_count.lock().unwrap() += 1;

        if self.fail_delete_sessions {
            return Err(unavailable("account service"));
        }

        *self.session_user.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_fields(title: &str, status: &str) -> serde_json::Map<String, Value> {
        let mut fields = serde_json::Map::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("content".to_string(), json!("body"));
        fields.insert("status".to_string(), json!(status));
        fields.insert("userId".to_string(), json!("user-1"));
        fields
    }

    #[tokio::test]
    async fn test_mock_documents_create_get_round_trip() {
        let client = MockDocumentClient::new();

        let created = client
            .create("my-post", post_fields("My Post", "active"))
            .await
            .unwrap();
        assert_eq!(created.id, "my-post");

        let fetched = client.get("my-post").await.unwrap();
        assert_eq!(fetched.fields["title"], json!("My Post"));
        assert_eq!(client.get_create_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_documents_duplicate_create_conflicts() {
        let client = MockDocumentClient::new().with_document("my-post", post_fields("A", "active"));

        let result = client.create("my-post", post_fields("B", "active")).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_mock_documents_update_merges_fields() {
        let client =
            MockDocumentClient::new().with_document("my-post", post_fields("Old", "active"));

        let mut patch = serde_json::Map::new();
        patch.insert("title".to_string(), json!("New"));
        let updated = client.update("my-post", patch).await.unwrap();

        assert_eq!(updated.fields["title"], json!("New"));
        // Untouched attributes survive the patch.
        assert_eq!(updated.fields["content"], json!("body"));
        assert_eq!(updated.fields["userId"], json!("user-1"));
    }

    #[tokio::test]
    async fn test_mock_documents_list_applies_queries() {
        let client = MockDocumentClient::new()
            .with_document("a", post_fields("A", "active"))
            .with_document("b", post_fields("B", "inactive"))
            .with_document("c", post_fields("C", "active"));

        let active = client.list(&[Query::active_only()]).await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, "a");
        assert_eq!(active[1].id, "c");

        let drafts = client
            .list(&[Query::not_equal("status", "active")])
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, "b");

        let all = client.list(&[]).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_documents_injected_failures() {
        let client = MockDocumentClient::new().with_create_failure();
        let result = client.create("my-post", post_fields("A", "active")).await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(client.get_create_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_files_upload_mints_unique_ids() {
        let client = MockFileClient::new();

        let first = client
            .upload(vec![1, 2, 3], "a.png", "image/png")
            .await
            .unwrap();
        let second = client
            .upload(vec![4, 5], "b.png", "image/png")
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.size, 3);
        assert_eq!(client.get_upload_count(), 2);
        assert_eq!(client.get_files().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_files_delete_records_ids() {
        let client = MockFileClient::new().with_file("file-1", "a.png", "image/png", 3);

        client.delete("file-1").await.unwrap();
        assert_eq!(client.get_deleted_ids(), vec!["file-1".to_string()]);
        assert!(client.get_files().is_empty());

        let result = client.delete("file-1").await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_mock_files_reachability_overrides() {
        let client = MockFileClient::new().with_file("file-1", "a.png", "image/png", 3);
        let url = client.view_url("file-1");
        assert!(client.url_is_reachable(&url).await);

        let client = client.with_unreachable_url(&url);
        assert!(!client.url_is_reachable(&url).await);
    }

    #[tokio::test]
    async fn test_mock_account_login_round_trip() {
        let client = MockAccountClient::new().with_account("ada@example.com", "pw", "Ada");

        let session = client.create_session("ada@example.com", "pw").await.unwrap();
        let account = client.current().await.unwrap();
        assert_eq!(session.user_id, account.id);
        assert_eq!(account.name, "Ada");
        assert!(client.has_session());
    }

    #[tokio::test]
    async fn test_mock_account_rejects_bad_credentials() {
        let client = MockAccountClient::new().with_account("ada@example.com", "pw", "Ada");

        let result = client.create_session("ada@example.com", "nope").await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert!(!client.has_session());
    }

    #[tokio::test]
    async fn test_mock_account_current_without_session() {
        let client = MockAccountClient::new().with_account("ada@example.com", "pw", "Ada");

        let result = client.current().await;
        assert!(result.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_mock_account_delete_sessions() {
        let client = MockAccountClient::new()
            .with_account("ada@example.com", "pw", "Ada")
            .with_session("ada@example.com");

        assert!(client.has_session());
        client.delete_sessions().await.unwrap();
        assert!(!client.has_session());
        assert_eq!(client.get_delete_sessions_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_account_duplicate_email_conflicts() {
        let client = MockAccountClient::new().with_account("ada@example.com", "pw", "Ada");

        let result = client.create("ada@example.com", "other", "Imposter").await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }
}
