//! Post-form input validation.
//!
//! Mirrors the checks a submission passes before any backend call is made:
//! title length, slug presence, and featured-image size/type. Image types
//! are sniffed from magic bytes rather than trusted from file extensions.

use crate::models::PostStatus;

/// Hard cap on featured-image uploads.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Minimum length for a post title.
pub const MIN_TITLE_CHARS: usize = 5;

/// Image types accepted for featured images.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/gif"];

/// Sniff an image content type from its leading bytes.
///
/// Returns `None` for formats this crate does not recognize at all; known
/// formats outside the allow-list (WebP) still sniff so validation can name
/// them in its report.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, 0x37 | 0x39, 0x61, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

/// A featured-image file picked for upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Sniffed content type for the upload request.
    pub fn content_type(&self) -> Option<&'static str> {
        detect_image_mime(&self.bytes)
    }
}

/// Input collected for a create or edit, validated before any backend call.
#[derive(Debug, Clone)]
pub struct PostForm {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub image: Option<ImageUpload>,
}

impl PostForm {
    /// Collect every rule violation. An image is mandatory on create
    /// (`require_image`) and optional on edit.
    pub fn violations(&self, require_image: bool) -> Vec<String> {
        let mut problems = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            problems.push("Title is required".to_string());
        } else if title.chars().count() < MIN_TITLE_CHARS {
            problems.push(format!(
                "Title must be at least {} characters",
                MIN_TITLE_CHARS
            ));
        }

        if self.slug.trim().is_empty() {
            problems.push("Slug is required".to_string());
        }

        match &self.image {
            None if require_image => {
                problems.push("Please select an image for your post".to_string());
            }
            None => {}
            Some(image) => {
                if image.bytes.len() > MAX_IMAGE_BYTES {
                    problems.push("File too large. Please select a file smaller than 5MB".to_string());
                }
                match image.content_type() {
                    Some(mime) if ALLOWED_IMAGE_TYPES.contains(&mime) => {}
                    Some(mime) => problems.push(format!(
                        "Invalid file type '{}'. Please select PNG, JPG, JPEG, or GIF",
                        mime
                    )),
                    None => problems.push(
                        "Unrecognized image data. Please select PNG, JPG, JPEG, or GIF".to_string(),
                    ),
                }
            }
        }

        problems
    }

    /// Validate, folding all violations into one error.
    pub fn validate(&self, require_image: bool) -> crate::Result<()> {
        let problems = self.violations(require_image);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Validation(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn valid_form(image: Option<ImageUpload>) -> PostForm {
        PostForm {
            title: "A valid title".to_string(),
            slug: "a-valid-title".to_string(),
            content: "<p>hello</p>".to_string(),
            status: PostStatus::Active,
            image,
        }
    }

    fn png_upload(len: usize) -> ImageUpload {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(len, 0);
        ImageUpload {
            filename: "cover.png".to_string(),
            bytes,
        }
    }

    #[test]
    fn test_detect_png() {
        assert_eq!(detect_image_mime(&PNG_HEADER), Some("image/png"));
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(
            detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some("image/jpeg")
        );
    }

    #[test]
    fn test_detect_gif_both_versions() {
        assert_eq!(detect_image_mime(b"GIF87a..."), Some("image/gif"));
        assert_eq!(detect_image_mime(b"GIF89a..."), Some("image/gif"));
    }

    #[test]
    fn test_detect_webp() {
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
    }

    #[test]
    fn test_detect_unknown_bytes() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_valid_create_form_passes() {
        let form = valid_form(Some(png_upload(64)));
        assert!(form.validate(true).is_ok());
    }

    #[test]
    fn test_create_requires_image_edit_does_not() {
        let form = valid_form(None);
        assert!(form.validate(true).is_err());
        assert!(form.validate(false).is_ok());
    }

    #[test]
    fn test_short_title_rejected() {
        let mut form = valid_form(Some(png_upload(64)));
        form.title = "Hey".to_string();
        let problems = form.violations(true);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("at least 5 characters"));
    }

    #[test]
    fn test_missing_slug_rejected() {
        let mut form = valid_form(Some(png_upload(64)));
        form.slug = "  ".to_string();
        assert!(form
            .violations(true)
            .iter()
            .any(|p| p.contains("Slug is required")));
    }

    #[test]
    fn test_image_size_boundary() {
        let form = valid_form(Some(png_upload(MAX_IMAGE_BYTES)));
        assert!(form.validate(true).is_ok());

        let form = valid_form(Some(png_upload(MAX_IMAGE_BYTES + 1)));
        let problems = form.violations(true);
        assert!(problems.iter().any(|p| p.contains("File too large")));
    }

    #[test]
    fn test_webp_sniffs_but_is_rejected() {
        let upload = ImageUpload {
            filename: "cover.webp".to_string(),
            bytes: vec![
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50,
            ],
        };
        let form = valid_form(Some(upload));
        let problems = form.violations(true);
        assert!(problems.iter().any(|p| p.contains("image/webp")));
    }

    #[test]
    fn test_multiple_violations_reported_together() {
        let form = PostForm {
            title: String::new(),
            slug: String::new(),
            content: String::new(),
            status: PostStatus::Active,
            image: None,
        };

        let problems = form.violations(true);
        assert_eq!(problems.len(), 3);
    }
}
