//! Seeds for "missed broadcasts" day pages

use crate::config::SiteConfig;
use crate::model::{PageKind, WorkItem};
use chrono::{Duration, NaiveDate};
use std::fmt::Write;
use tracing::warn;

/// Placeholder replaced by the formatted date in day URL templates
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Generates one URL per day from `today + future` back to `today - past`
///
/// Always yields `past + future + 1` URLs, newest first, unless the date
/// format is unusable, in which case it yields none.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use mediacrawl::adapter::day_urls;
///
/// let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
/// let urls = day_urls("https://example.com/tag/{date}", "%d.%m.%Y", today, 1, 1);
/// assert_eq!(urls, vec![
///     "https://example.com/tag/11.05.2024",
///     "https://example.com/tag/10.05.2024",
///     "https://example.com/tag/09.05.2024",
/// ]);
/// ```
pub fn day_urls(template: &str, date_format: &str, today: NaiveDate, past: u32, future: u32) -> Vec<String> {
    let Some(newest) = today.checked_add_signed(Duration::days(i64::from(future))) else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    for offset in 0..=(i64::from(past) + i64::from(future)) {
        let Some(date) = newest.checked_sub_signed(Duration::days(offset)) else {
            break;
        };

        let mut formatted = String::new();
        if write!(formatted, "{}", date.format(date_format)).is_err() {
            warn!("Unusable date format '{}'", date_format);
            return Vec::new();
        }
        urls.push(template.replace(DATE_PLACEHOLDER, &formatted));
    }
    urls
}

/// All overview items a site's crawl starts from
///
/// Configured seeds come first, followed by the day pages when a day URL
/// template is set. Every item carries the site's topic label.
pub fn site_seeds(site: &SiteConfig, today: NaiveDate) -> Vec<WorkItem> {
    let days = site
        .day_url_template
        .as_deref()
        .map(|template| {
            day_urls(
                template,
                &site.date_format,
                today,
                site.max_days_past,
                site.max_days_future,
            )
        })
        .unwrap_or_default();

    site.seeds
        .iter()
        .chain(days.iter())
        .filter_map(|url| match WorkItem::parse(url, PageKind::Overview) {
            Ok(item) => Some(item.with_topic(site.topic.clone())),
            Err(e) => {
                warn!(site = %site.name, "Skipping seed {}: {}", url, e);
                None
            }
        })
        .collect()
}
