//! Data models and structures
//!
//! Defines the core data structures for posts, stored files, accounts, and
//! the wire shapes exchanged with the hosted document/file backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Publication state of a post. Inactive posts are hidden from the default
/// listing but stay addressable by slug.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Inactive,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "active" => Ok(PostStatus::Active),
            "inactive" => Ok(PostStatus::Inactive),
            other => Err(crate::Error::Validation(format!(
                "Unknown status '{}'. Expected 'active' or 'inactive'",
                other
            ))),
        }
    }
}

/// A blog post read back from the remote collection. The slug doubles as the
/// document id; timestamps are server-assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new post. The asset id must already exist in
/// the bucket; creating the document never uploads anything.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub owner_id: String,
}

/// Partial update for an existing post. Title, content, and status are
/// always sent (the backend overwrites whatever it receives); the image
/// reference is only sent when a replacement asset id is supplied.
#[derive(Debug, Clone)]
pub struct PostPatch {
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub featured_image: Option<String>,
}

/// Post attributes as they appear inside a document's data fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostFields {
    title: String,
    content: String,
    #[serde(default)]
    featured_image: Option<String>,
    status: PostStatus,
    user_id: String,
}

/// Data payload for a document create. Carries the owner; the image key is
/// omitted when the post has no featured image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFields<'a> {
    title: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    featured_image: Option<&'a str>,
    status: PostStatus,
    user_id: &'a str,
}

/// Data payload for a document update. The owner is never resent; the image
/// key is only present when the reference is being replaced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateFields<'a> {
    title: &'a str,
    content: &'a str,
    status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    featured_image: Option<&'a str>,
}

impl Post {
    /// Interpret a raw document as a post. Fails with a serialization error
    /// when the document lacks the expected attributes.
    pub fn from_document(doc: Document) -> crate::Result<Self> {
        let fields: PostFields = serde_json::from_value(Value::Object(doc.fields))?;
        Ok(Post {
            slug: doc.id,
            title: fields.title,
            content: fields.content,
            featured_image: fields.featured_image,
            status: fields.status,
            owner_id: fields.user_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

fn fields_to_map(fields: impl Serialize) -> serde_json::Map<String, Value> {
    match serde_json::to_value(fields) {
        Ok(Value::Object(map)) => map,
        // The wire field structs serialize to objects by construction.
        _ => serde_json::Map::new(),
    }
}

impl NewPost {
    /// Document data fields for the create call.
    pub fn to_fields(&self) -> serde_json::Map<String, Value> {
        fields_to_map(CreateFields {
            title: &self.title,
            content: &self.content,
            featured_image: self.featured_image.as_deref(),
            status: self.status,
            user_id: &self.owner_id,
        })
    }
}

impl PostPatch {
    /// Document data fields for the update call. `featured_image: None`
    /// means "leave the stored reference untouched", so the key is omitted.
    pub fn to_fields(&self) -> serde_json::Map<String, Value> {
        fields_to_map(UpdateFields {
            title: &self.title,
            content: &self.content,
            status: self.status,
            featured_image: self.featured_image.as_deref(),
        })
    }
}

/// Raw document envelope as the collection API returns it. Attributes other
/// than the server-managed `$`-fields are kept as-is in `fields`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

/// Paged listing reply from the collection API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

/// Metadata for an uploaded binary in the file bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "sizeOriginal", default)]
    pub size: u64,
}

/// The account bound to the active session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Server-side session record created by login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum QueryMethod {
    Equal,
    NotEqual,
}

/// Typed listing predicate, serialized to the wire's JSON query objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub method: QueryMethod,
    pub attribute: String,
    pub values: Vec<Value>,
}

impl Query {
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self {
            method: QueryMethod::Equal,
            attribute: attribute.to_string(),
            values: vec![value.into()],
        }
    }

    pub fn not_equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self {
            method: QueryMethod::NotEqual,
            attribute: attribute.to_string(),
            values: vec![value.into()],
        }
    }

    /// Default listing filter: only active posts.
    pub fn active_only() -> Query {
        Query::equal("status", "active")
    }

    pub fn to_wire(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub bucket_id: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn required_var(name: &str) -> crate::Result<String> {
    std::env::var(name).map_err(|_| crate::Error::Config(format!("{} not set", name)))
}

impl Config {
    /// Load configuration from the environment (`.env` honored). Presence is
    /// the only validation applied here; the backend rejects bad values.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            endpoint: required_var("INKPRESS_ENDPOINT")?
                .trim_end_matches('/')
                .to_string(),
            project_id: required_var("INKPRESS_PROJECT_ID")?,
            database_id: required_var("INKPRESS_DATABASE_ID")?,
            collection_id: required_var("INKPRESS_COLLECTION_ID")?,
            bucket_id: required_var("INKPRESS_BUCKET_ID")?,
            email: std::env::var("INKPRESS_EMAIL").ok(),
            password: std::env::var("INKPRESS_PASSWORD").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(fields: Value) -> Document {
        let Value::Object(fields) = fields else {
            panic!("sample fields must be an object");
        };
        Document {
            id: "my-first-post".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields,
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PostStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");

        let parsed: PostStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(parsed, PostStatus::Inactive);
    }

    #[test]
    fn test_document_envelope_keeps_attribute_fields() {
        let json = serde_json::json!({
            "$id": "my-first-post",
            "$createdAt": "2024-08-30T11:46:48.665+00:00",
            "$updatedAt": "2024-08-30T11:46:48.665+00:00",
            "$permissions": [],
            "title": "My First Post",
            "content": "<p>hello</p>",
            "status": "active",
            "userId": "user-1"
        });

        let doc: Document = serde_json::from_value(json).unwrap();
        assert_eq!(doc.id, "my-first-post");
        assert_eq!(doc.fields["title"], "My First Post");
        assert!(doc.fields.contains_key("$permissions"));
    }

    #[test]
    fn test_post_from_document_without_image() {
        let doc = sample_document(serde_json::json!({
            "title": "My First Post",
            "content": "<p>hello</p>",
            "status": "active",
            "userId": "user-1"
        }));

        let post = Post::from_document(doc).unwrap();
        assert_eq!(post.slug, "my-first-post");
        assert_eq!(post.featured_image, None);
        assert_eq!(post.status, PostStatus::Active);
        assert_eq!(post.owner_id, "user-1");
    }

    #[test]
    fn test_post_from_document_missing_title_fails() {
        let doc = sample_document(serde_json::json!({
            "content": "<p>hello</p>",
            "status": "active",
            "userId": "user-1"
        }));

        assert!(Post::from_document(doc).is_err());
    }

    #[test]
    fn test_create_fields_carry_owner() {
        let new_post = NewPost {
            slug: "my-first-post".to_string(),
            title: "My First Post".to_string(),
            content: "<p>hello</p>".to_string(),
            featured_image: Some("file-1".to_string()),
            status: PostStatus::Active,
            owner_id: "user-1".to_string(),
        };

        let fields = new_post.to_fields();
        assert_eq!(fields["title"], "My First Post");
        assert_eq!(fields["featuredImage"], "file-1");
        assert_eq!(fields["userId"], "user-1");
    }

    #[test]
    fn test_patch_fields_omit_absent_image_reference() {
        let patch = PostPatch {
            title: "Title".to_string(),
            content: "Body".to_string(),
            status: PostStatus::Inactive,
            featured_image: None,
        };

        let fields = patch.to_fields();
        assert!(!fields.contains_key("featuredImage"));
        assert!(!fields.contains_key("userId"));
        assert_eq!(fields["status"], "inactive");

        let patch = PostPatch {
            featured_image: Some("file-2".to_string()),
            ..patch
        };
        let fields = patch.to_fields();
        assert_eq!(fields["featuredImage"], "file-2");
    }

    #[test]
    fn test_query_wire_format() {
        let wire = Query::equal("status", "active").to_wire().unwrap();
        assert_eq!(
            wire,
            "{\"method\":\"equal\",\"attribute\":\"status\",\"values\":[\"active\"]}"
        );
    }

    #[test]
    fn test_active_only_filter() {
        let query = Query::active_only();
        assert_eq!(query.method, QueryMethod::Equal);
        assert_eq!(query.attribute, "status");
        assert_eq!(query.values, vec![Value::from("active")]);
    }
}
