//! URL handling for work items
//!
//! This module provides work-item URL normalization, resolution of links found
//! in catalog pages and upstream-key extraction for rate limiting.

mod normalize;
mod resolve;

use url::Url;

// Re-export main functions
pub use normalize::normalize_url;
pub use resolve::{add_domain_if_missing, resolve_href};

/// Extracts the lowercase host from a URL string
///
/// Used as the default upstream key when an adapter does not declare one.
/// Returns None for unparsable URLs or URLs without a host.
///
/// # Examples
///
/// ```
/// use mediacrawl::url::extract_domain;
///
/// assert_eq!(extract_domain("https://WWW.Example.com/a"), Some("www.example.com".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}
