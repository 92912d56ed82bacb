//! Post operations and the asset lifecycle around them.
//!
//! `ContentService` owns the two backend seams posts touch: the document
//! collection and the file bucket. Single-step operations map one-to-one
//! onto backend calls; `publish`, `revise` and `retire` compose them in the
//! order that keeps documents from ever referencing an asset that is not
//! durably stored.

use crate::backend::{DocumentService, FileService};
use crate::form::{ImageUpload, PostForm};
use crate::lifecycle::ImageSwap;
use crate::models::{Account, NewPost, Post, PostPatch, Query, StoredFile};
use crate::{Error, Result};

/// How a post's featured image should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Direct view URL, confirmed reachable.
    View(String),
    /// View form not served; show a placeholder and offer this download link.
    Download(String),
    /// Neither retrieval mode answered; show the placeholder alone.
    Unavailable,
    /// The post has no featured image.
    Missing,
}

pub struct ContentService {
    documents: Box<dyn DocumentService>,
    files: Box<dyn FileService>,
}

impl ContentService {
    pub fn new(documents: Box<dyn DocumentService>, files: Box<dyn FileService>) -> Self {
        Self { documents, files }
    }

    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let document = self
            .documents
            .create(&new_post.slug, new_post.to_fields())
            .await?;
        Post::from_document(document)
    }

    /// Looks a post up by slug. `Ok(None)` means the post does not exist;
    /// transport and backend failures stay errors.
    pub async fn get(&self, slug: &str) -> Result<Option<Post>> {
        match self.documents.get(slug).await {
            Ok(document) => Ok(Some(Post::from_document(document)?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Applies a partial update. Sent fields overwrite stored values; the
    /// image reference only changes when the patch carries one.
    pub async fn update(&self, slug: &str, patch: &PostPatch) -> Result<Post> {
        let document = self.documents.update(slug, patch.to_fields()).await?;
        Post::from_document(document)
    }

    pub async fn delete(&self, slug: &str) -> Result<()> {
        self.documents.delete(slug).await
    }

    pub async fn list(&self, queries: &[Query]) -> Result<Vec<Post>> {
        let documents = self.documents.list(queries).await?;
        documents.into_iter().map(Post::from_document).collect()
    }

    /// Default listing: published posts only.
    pub async fn list_active(&self) -> Result<Vec<Post>> {
        self.list(&[Query::active_only()]).await
    }

    /// Stores image bytes under a freshly minted id. Unlike the other asset
    /// operations this propagates every failure: callers must not go on to
    /// reference an asset that was never stored.
    pub async fn upload_asset(&self, image: ImageUpload) -> Result<StoredFile> {
        let content_type = image
            .content_type()
            .ok_or_else(|| Error::Validation("unrecognized image format".to_string()))?;
        self.files
            .upload(image.bytes, &image.filename, content_type)
            .await
    }

    /// Deletes an asset. An empty id is a no-op rather than an error.
    pub async fn delete_asset(&self, asset_id: &str) -> Result<()> {
        if asset_id.is_empty() {
            return Ok(());
        }
        self.files.delete(asset_id).await
    }

    pub fn asset_view_url(&self, asset_id: &str) -> Option<String> {
        if asset_id.is_empty() {
            None
        } else {
            Some(self.files.view_url(asset_id))
        }
    }

    pub fn asset_download_url(&self, asset_id: &str) -> Option<String> {
        if asset_id.is_empty() {
            None
        } else {
            Some(self.files.download_url(asset_id))
        }
    }

    /// Decides how to present a post's featured image. Tried in order:
    /// inline view, then download fallback, then the bare placeholder.
    pub async fn resolve_image(&self, post: &Post) -> ImageSource {
        let asset_id = match post.featured_image.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return ImageSource::Missing,
        };
        let view = self.files.view_url(asset_id);
        if self.files.url_is_reachable(&view).await {
            return ImageSource::View(view);
        }
        let download = self.files.download_url(asset_id);
        if self.files.url_is_reachable(&download).await {
            return ImageSource::Download(download);
        }
        ImageSource::Unavailable
    }

    /// Full create flow: validate, upload the image, then create the
    /// document referencing it. When document creation fails the fresh
    /// upload is deleted again so the failed publish leaves nothing behind.
    pub async fn publish(&self, form: PostForm, owner: &Account) -> Result<Post> {
        form.validate(true)?;
        let PostForm {
            title,
            slug,
            content,
            status,
            image,
        } = form;
        let image = image.ok_or_else(|| {
            Error::Invariant("publish validation passed without an image".to_string())
        })?;

        let swap = ImageSwap::start();
        let stored = self.upload_asset(image).await?;
        let swap = swap.uploaded(stored.id.clone())?;

        let new_post = NewPost {
            slug,
            title,
            content,
            featured_image: Some(stored.id),
            status,
            owner_id: owner.id.clone(),
        };
        let post = match self.create(&new_post).await {
            Ok(post) => post,
            Err(err) => {
                if let Some(asset) = swap.new_asset() {
                    if let Err(cleanup) = self.files.delete(asset).await {
                        tracing::warn!(
                            "Asset {} is orphaned: create failed and cleanup failed too: {}",
                            asset,
                            cleanup
                        );
                    }
                }
                return Err(err);
            }
        };
        swap.committed(None)?;
        Ok(post)
    }

    /// Full update flow. With a new image the order is: upload, re-point the
    /// document, and only then delete the superseded asset. Without one the
    /// stored image reference stays as it is.
    pub async fn revise(&self, slug: &str, form: PostForm) -> Result<Post> {
        form.validate(false)?;
        let PostForm {
            title,
            slug: _,
            content,
            status,
            image,
        } = form;
        let current = self
            .get(slug)
            .await?
            .ok_or_else(|| Error::NotFound(format!("post {} not found", slug)))?;

        let mut patch = PostPatch {
            title,
            content,
            status,
            featured_image: None,
        };

        let image = match image {
            Some(image) => image,
            None => return self.update(slug, &patch).await,
        };

        let old_asset = current.featured_image.clone();
        let swap = ImageSwap::start();
        let stored = self.upload_asset(image).await?;
        let swap = swap.uploaded(stored.id.clone())?;
        patch.featured_image = Some(stored.id);

        let post = match self.update(slug, &patch).await {
            Ok(post) => post,
            Err(err) => {
                // The document still references the old asset, so the old
                // asset must stay. The new upload is the orphan here.
                if let Some(asset) = swap.new_asset() {
                    tracing::warn!(
                        "Post {} kept its previous image; uploaded asset {} is orphaned",
                        slug,
                        asset
                    );
                }
                return Err(err);
            }
        };

        let swap = swap.committed(old_asset)?;
        if let Some(old) = swap.old_asset().map(str::to_string) {
            match self.files.delete(&old).await {
                Ok(()) => {
                    swap.reclaimed()?;
                }
                Err(err) => {
                    tracing::warn!("Superseded asset {} was not deleted: {}", old, err);
                }
            }
        }
        Ok(post)
    }

    /// Full delete flow: remove the document first, then best-effort delete
    /// its asset. A failed asset delete leaves an orphan but never brings
    /// the post back.
    pub async fn retire(&self, slug: &str) -> Result<()> {
        let post = self
            .get(slug)
            .await?
            .ok_or_else(|| Error::NotFound(format!("post {} not found", slug)))?;
        self.delete(slug).await?;
        if let Some(asset) = post.featured_image {
            if !asset.is_empty() {
                if let Err(err) = self.files.delete(&asset).await {
                    tracing::warn!("Post {} deleted but asset {} was not: {}", slug, asset, err);
                }
            }
        }
        Ok(())
    }
}
