use url::Url;

/// Resolves an href found in a catalog page to an absolute URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - hrefs that do not resolve to an HTTP(S) URL
pub fn resolve_href(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}

/// Prefixes a site-relative URL with the site's base
///
/// Absolute URLs and protocol-relative URLs are returned unchanged (the
/// latter with an `https:` scheme).
pub fn add_domain_if_missing(url: &str, base: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else if url.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), url)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), url)
    }
}
