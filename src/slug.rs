//! Slug derivation for post URLs.

/// Derive a URL-safe slug from a title.
///
/// Trims, lowercases, and collapses every run of characters that are not
/// ASCII alphanumerics into a single hyphen. Runs at the edges still produce
/// a hyphen, so `" My Title! "` becomes `"my-title-"`.
///
/// The transform is idempotent: its output alphabet is `[a-z0-9-]` and a
/// lone hyphen maps back to itself.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_run = false;

    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            in_run = false;
        } else if !in_run {
            slug.push('-');
            in_run = true;
        }
    }

    slug
}
