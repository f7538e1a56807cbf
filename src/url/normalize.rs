use crate::UrlError;
use url::Url;

/// Query parameters that never change the served document
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// Normalizes a work-item URL so that re-discovered links compare equal
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS
/// 3. Lowercase the host
/// 4. Remove the fragment
/// 5. Remove tracking query parameters, keeping the order of the rest
///
/// Paths and the remaining query are left untouched: catalog APIs are often
/// sensitive to both.
///
/// # Examples
///
/// ```
/// use mediacrawl::url::normalize_url;
///
/// let url = normalize_url("https://WWW.SR.DE/sendungen?page=2#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.sr.de/sendungen?page=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or(UrlError::MissingDomain)?;
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_url("https://EXAMPLE.COM/Sendung/A").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Sendung/A");
    }

    #[test]
    fn test_keeps_http_for_local_upstreams() {
        let result = normalize_url("http://127.0.0.1:9000/day").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:9000/day");
    }

    #[test]
    fn test_remove_tracking_params_keeps_order() {
        let result =
            normalize_url("https://example.com/api?b=2&utm_source=x&a=1&fbclid=3").unwrap();
        assert_eq!(result.as_str(), "https://example.com/api?b=2&a=1");
    }

    #[test]
    fn test_all_tracking_params_removed() {
        let result = normalize_url("https://example.com/page?utm_source=a&gclid=c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }
}
