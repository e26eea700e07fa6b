//! Project slug generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Maximum length of the readable part of a slug
pub const MAX_SLUG_BASE_LENGTH: usize = 48;
/// Number of random characters appended to every slug
pub const SLUG_SUFFIX_LENGTH: usize = 6;

const FALLBACK_SLUG_BASE: &str = "project";

/// Reduce a project name to lowercase ASCII words joined by dashes
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_end_matches('-');
    let slug = if slug.len() > MAX_SLUG_BASE_LENGTH {
        slug[..MAX_SLUG_BASE_LENGTH].trim_end_matches('-')
    } else {
        slug
    };

    if slug.is_empty() {
        FALLBACK_SLUG_BASE.to_string()
    } else {
        slug.to_string()
    }
}

/// Generate a unique slug for a project name
pub fn generate_slug(name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("{}-{}", slugify(name), suffix)
}
