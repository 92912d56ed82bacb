//! Application orchestration for the publishing workflows.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::auth::AuthService;
use crate::backend::{
    AccountClient, AccountService, BackendHttpClient, DocumentClient, DocumentService, FileClient,
    FileService,
};
use crate::content::{ContentService, ImageSource};
use crate::form::{ImageUpload, PostForm};
use crate::models::{Account, Config, Post, PostStatus};
use crate::slug::slugify;
use crate::{Error, Result};

/// Login credentials carried for on-demand session establishment.
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Coordinates content and auth services for one backend project.
pub struct App {
    content: ContentService,
    auth: AuthService,
    credentials: Option<Credentials>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub documents: Box<dyn DocumentService>,
    pub files: Box<dyn FileService>,
    pub account: Box<dyn AccountService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses
    /// that need to inject mocks.
    pub fn with_services(services: AppServices, credentials: Option<Credentials>) -> Self {
        Self {
            content: ContentService::new(services.documents, services.files),
            auth: AuthService::new(services.account),
            credentials,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn from_env() -> Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        // One shared connection pool and cookie jar: a session opened by the
        // account client also authorizes document and file calls.
        let http = BackendHttpClient::new(&config.endpoint, &config.project_id)?;
        let documents = DocumentClient::with_http(http.clone(), config);
        let files = FileClient::with_http(http.clone(), config);
        let account = AccountClient::with_http(http);

        let credentials = match (&config.email, &config.password) {
            (Some(email), Some(password)) => Some(Credentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        Ok(Self::with_services(
            AppServices {
                documents: Box::new(documents),
                files: Box::new(files),
                account: Box::new(account),
            },
            credentials,
        ))
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// The logged-in account, logging in with configured credentials first
    /// when no session exists yet.
    async fn require_account(&self) -> Result<Account> {
        if let Some(account) = self.auth.current_user().await? {
            return Ok(account);
        }
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            Error::Unauthorized("no active session and no credentials configured".to_string())
        })?;
        info!("Logging in as {}", credentials.email);
        self.auth
            .login(&credentials.email, &credentials.password)
            .await
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<Account> {
        let account = self.auth.register(email, password, name).await?;
        info!("Registered {} ({})", account.name, account.email);
        Ok(account)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Account> {
        let account = self.auth.login(email, password).await?;
        info!("Logged in as {}", account.email);
        Ok(account)
    }

    pub async fn logout(&self) {
        self.auth.logout().await;
        info!("Logged out");
    }

    pub async fn whoami(&self) -> Result<Option<Account>> {
        self.auth.current_user().await
    }

    /// Publish a new post: the slug is derived from the title and the image
    /// is read from disk.
    pub async fn publish_post(
        &self,
        title: &str,
        content: &str,
        status: PostStatus,
        image_path: &Path,
    ) -> Result<Post> {
        let owner = self.require_account().await?;
        let image = Self::read_image(image_path)?;
        let form = PostForm {
            title: title.to_string(),
            slug: slugify(title),
            content: content.to_string(),
            status,
            image: Some(image),
        };
        let post = self.content.publish(form, &owner).await?;
        info!("Published '{}' as {}", post.title, post.slug);
        Ok(post)
    }

    /// Edit an existing post. Omitted fields keep their stored values; a
    /// supplied image path replaces the current asset.
    pub async fn edit_post(
        &self,
        slug: &str,
        title: Option<&str>,
        content: Option<&str>,
        status: Option<PostStatus>,
        image_path: Option<&Path>,
    ) -> Result<Post> {
        let account = self.require_account().await?;
        let current = self
            .content
            .get(slug)
            .await?
            .ok_or_else(|| Error::NotFound(format!("post {} not found", slug)))?;
        Self::check_author(&current, &account)?;
        let image = match image_path {
            Some(path) => Some(Self::read_image(path)?),
            None => None,
        };
        let form = PostForm {
            title: title.unwrap_or(&current.title).to_string(),
            slug: slug.to_string(),
            content: content.unwrap_or(&current.content).to_string(),
            status: status.unwrap_or(current.status),
            image,
        };
        let post = self.content.revise(slug, form).await?;
        info!("Updated {}", post.slug);
        Ok(post)
    }

    /// Fetch a post together with its resolved image presentation.
    pub async fn show_post(&self, slug: &str) -> Result<Option<(Post, ImageSource)>> {
        let post = match self.content.get(slug).await? {
            Some(post) => post,
            None => return Ok(None),
        };
        let image = self.content.resolve_image(&post).await;
        Ok(Some((post, image)))
    }

    /// List posts, published only by default.
    pub async fn list_posts(&self, include_unpublished: bool) -> Result<Vec<Post>> {
        if include_unpublished {
            self.content.list(&[]).await
        } else {
            self.content.list_active().await
        }
    }

    pub async fn delete_post(&self, slug: &str) -> Result<()> {
        let account = self.require_account().await?;
        if let Some(post) = self.content.get(slug).await? {
            Self::check_author(&post, &account)?;
        }
        self.content.retire(slug).await?;
        info!("Deleted {}", slug);
        Ok(())
    }

    /// The backend's access rules stay the authority; this only gives a
    /// clearer error before any write is attempted.
    fn check_author(post: &Post, account: &Account) -> Result<()> {
        if post.owner_id != account.id {
            return Err(Error::Unauthorized(format!(
                "post {} belongs to another account",
                post.slug
            )));
        }
        Ok(())
    }

    fn read_image(path: &Path) -> Result<ImageUpload> {
        let bytes = fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Validation(format!("Invalid image path: {}", path.display())))?
            .to_string();
        Ok(ImageUpload { filename, bytes })
    }
}
