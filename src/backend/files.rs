use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::backend::http::BackendHttpClient;
use crate::backend::FileService;
use crate::models::{Config, StoredFile};
use crate::Result;

/// Sentinel id that asks the bucket to mint a unique file id server-side.
const UNIQUE_ID: &str = "unique()";

/// REST client for the media bucket.
pub struct FileClient {
    http: BackendHttpClient,
    bucket_id: String,
}

impl FileClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = BackendHttpClient::new(&config.endpoint, &config.project_id)?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: BackendHttpClient, config: &Config) -> Self {
        Self {
            http,
            bucket_id: config.bucket_id.clone(),
        }
    }

    fn files_path(&self) -> String {
        format!("storage/buckets/{}/files", self.bucket_id)
    }

    fn file_url(&self, file_id: &str, mode: &str) -> String {
        // View and download links are unauthenticated but still need the
        // project id as a query parameter.
        format!(
            "{}/{}/{}?project={}",
            self.http.url(&self.files_path()),
            file_id,
            mode,
            self.http.project_id()
        )
    }
}

#[async_trait]
impl FileService for FileClient {
    async fn upload(&self, bytes: Vec<u8>, filename: &str, content_type: &str) -> Result<StoredFile> {
        tracing::debug!("Uploading {} ({} bytes)", filename, bytes.len());
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new().text("fileId", UNIQUE_ID).part("file", part);
        self.http.post_multipart(&self.files_path(), form).await
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        tracing::debug!("Deleting file {}", file_id);
        self.http
            .delete(&format!("{}/{}", self.files_path(), file_id))
            .await
    }

    fn view_url(&self, file_id: &str) -> String {
        self.file_url(file_id, "view")
    }

    fn download_url(&self, file_id: &str) -> String {
        self.file_url(file_id, "download")
    }

    async fn url_is_reachable(&self, url: &str) -> bool {
        self.http.probe(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: &str) -> Config {
        Config {
            endpoint: endpoint.to_string(),
            project_id: "proj".to_string(),
            database_id: "db".to_string(),
            collection_id: "posts".to_string(),
            bucket_id: "media".to_string(),
            email: None,
            password: None,
        }
    }

    fn client_for(server: &MockServer) -> FileClient {
        let config = test_config(&server.uri());
        FileClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_and_returns_stored_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/buckets/media/files"))
            // Multipart body carries the mint-me sentinel and the file part.
            .and(body_string_contains("unique()"))
            .and(body_string_contains("cover.png"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "$id": "file-123",
                "name": "cover.png",
                "mimeType": "image/png",
                "sizeOriginal": 4,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let stored = client
            .upload(vec![1, 2, 3, 4], "cover.png", "image/png")
            .await
            .unwrap();
        assert_eq!(stored.id, "file-123");
        assert_eq!(stored.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/buckets/media/files"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "message": "Storage device is full.",
                "code": 500,
                "type": "general_server_error",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .upload(vec![0u8; 16], "cover.png", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend { status: 500, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_delete_hits_file_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/buckets/media/files/file-123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.delete("file-123").await.unwrap();
    }

    #[test]
    fn test_view_and_download_urls_carry_project() {
        let config = test_config("https://backend.example.com/v1");
        let client = FileClient::new(&config).unwrap();
        assert_eq!(
            client.view_url("file-123"),
            "https://backend.example.com/v1/storage/buckets/media/files/file-123/view?project=proj"
        );
        assert_eq!(
            client.download_url("file-123"),
            "https://backend.example.com/v1/storage/buckets/media/files/file-123/download?project=proj"
        );
    }

    #[tokio::test]
    async fn test_reachability_probe_follows_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.url_is_reachable(&format!("{}/ok", server.uri())).await);
        assert!(!client.url_is_reachable(&format!("{}/gone", server.uri())).await);
    }
}
