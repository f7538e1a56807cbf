use crate::config::types::{Config, CrawlerConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use chrono::format::{Item, StrftimeItems};
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_subpages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_subpages must be >= 1, got {}",
            config.max_subpages
        )));
    }

    if let Some(parallelism) = config.parallelism {
        if !(1..=256).contains(&parallelism) {
            return Err(ConfigError::Validation(format!(
                "parallelism must be between 1 and 256, got {}",
                parallelism
            )));
        }
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    if config.retry_budget > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_budget must be <= 10, got {}",
            config.retry_budget
        )));
    }

    if config.split_threshold < 1 {
        return Err(ConfigError::Validation(
            "split_threshold must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates site entries
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name cannot be empty".to_string(),
            ));
        }
        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name '{}'",
                site.name
            )));
        }

        if site.seeds.is_empty() && site.day_url_template.is_none() {
            return Err(ConfigError::Validation(format!(
                "site '{}' needs seeds or a day-url-template",
                site.name
            )));
        }

        for seed in &site.seeds {
            validate_http_url(seed)?;
        }

        if let Some(template) = &site.day_url_template {
            if !template.contains("{date}") {
                return Err(ConfigError::Validation(format!(
                    "day-url-template of site '{}' must contain {{date}}",
                    site.name
                )));
            }
            validate_http_url(&template.replace("{date}", "2024-01-01"))?;

            if StrftimeItems::new(&site.date_format).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::Validation(format!(
                    "date-format '{}' of site '{}' is not a valid strftime format",
                    site.date_format, site.name
                )));
            }
        }

        validate_selector(&site.entry_selector)?;
        for selector in [
            &site.next_page_selector,
            &site.topic_selector,
            &site.skip_marker_selector,
        ]
        .into_iter()
        .flatten()
        {
            validate_selector(selector)?;
        }
    }

    Ok(())
}

fn validate_http_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "URL '{}' has unsupported scheme '{}'",
            raw, other
        ))),
    }
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str) -> SiteConfig {
        SiteConfig {
            name: name.to_string(),
            seeds: vec!["https://example.com/overview".to_string()],
            topic: None,
            day_url_template: None,
            date_format: "%Y-%m-%d".to_string(),
            max_days_past: 0,
            max_days_future: 0,
            entry_selector: "a.entry".to_string(),
            next_page_selector: None,
            topic_selector: None,
            skip_marker_selector: None,
            skip_marker_text: None,
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_valid_site() {
        assert!(validate_sites(&[site("A"), site("B")]).is_ok());
    }

    #[test]
    fn test_duplicate_site_names() {
        let result = validate_sites(&[site("A"), site("A")]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_site_without_entry_points() {
        let mut s = site("A");
        s.seeds.clear();
        assert!(validate_sites(&[s.clone()]).is_err());

        s.day_url_template = Some("https://example.com/day/{date}".to_string());
        assert!(validate_sites(&[s]).is_ok());
    }

    #[test]
    fn test_template_without_placeholder() {
        let mut s = site("A");
        s.day_url_template = Some("https://example.com/day".to_string());
        assert!(matches!(
            validate_sites(&[s]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_date_format() {
        let mut s = site("A");
        s.day_url_template = Some("https://example.com/day/{date}".to_string());
        s.date_format = "%Q".to_string();
        assert!(matches!(
            validate_sites(&[s]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_seed_scheme() {
        let mut s = site("A");
        s.seeds = vec!["ftp://example.com/".to_string()];
        assert!(matches!(
            validate_sites(&[s]),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_bad_selector() {
        let mut s = site("A");
        s.next_page_selector = Some("a[[".to_string());
        assert!(matches!(
            validate_sites(&[s]),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_crawler_bounds() {
        let mut crawler = CrawlerConfig {
            max_subpages: 3,
            parallelism: Some(8),
            per_upstream_min_interval_ms: 100,
            fetch_timeout_ms: 5000,
            retry_budget: 2,
            retry_backoff_ms: 100,
            split_threshold: 4,
        };
        assert!(validate_crawler_config(&crawler).is_ok());

        crawler.max_subpages = 0;
        assert!(validate_crawler_config(&crawler).is_err());
        crawler.max_subpages = 3;

        crawler.parallelism = Some(0);
        assert!(validate_crawler_config(&crawler).is_err());
        crawler.parallelism = None;
        assert!(validate_crawler_config(&crawler).is_ok());

        crawler.fetch_timeout_ms = 50;
        assert!(validate_crawler_config(&crawler).is_err());
    }
}
