//! JSON film detail documents
//!
//! A detail document describes one broadcast: title, topic, airtime,
//! duration and a list of streams. Streams are labelled with a coarse
//! quality name, or a single HLS master playlist is given whose variants
//! are classified by resolution.

use crate::adapter::{Adapter, Processed};
use crate::fetch::Fetch;
use crate::manifest::{parse_master_playlist, resolve_variants, QualityTier};
use crate::model::{Document, GeoLocation, MediaRecord, WorkItem};
use crate::url::add_domain_if_missing;
use crate::ParseError;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const SUBTITLE_EXTENSION: &str = ".xml";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilmDetailJson {
    title: Option<String>,
    subtitle: Option<String>,
    topic: Option<String>,
    brand: Option<Titled>,
    category: Option<Titled>,
    lead_paragraph: Option<String>,
    #[serde(alias = "teasertext")]
    teaser_text: Option<String>,
    airtime: Option<String>,
    editorial_date: Option<String>,
    duration: Option<u64>,
    sharing_url: Option<String>,
    #[serde(default)]
    captions: Vec<CaptionJson>,
    #[serde(default)]
    streams: Vec<StreamJson>,
    attributes: Option<AttributesJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributesJson {
    geo_location: Option<ValueJson>,
}

#[derive(Debug, Deserialize)]
struct ValueJson {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Titled {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionJson {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamJson {
    quality: Option<String>,
    #[serde(default)]
    hd: bool,
    uri: Option<String>,
    mime_type: Option<String>,
}

impl StreamJson {
    fn tier(&self) -> QualityTier {
        if self.hd {
            return QualityTier::Hd;
        }
        match self.quality.as_deref() {
            Some("veryhigh") => QualityTier::Normal,
            Some("high") | Some("med") | Some("low") => QualityTier::Small,
            _ => QualityTier::VerySmall,
        }
    }

    fn is_manifest(&self) -> bool {
        let by_type = self
            .mime_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case("application/x-mpegurl") || t.eq_ignore_ascii_case("application/vnd.apple.mpegurl"))
            .unwrap_or(false);
        let by_path = self
            .uri
            .as_deref()
            .map(|uri| uri.split(['?', '#']).next().unwrap_or(uri).ends_with(".m3u8"))
            .unwrap_or(false);
        by_type || by_path
    }
}

/// Turns JSON detail documents into `MediaRecord`s
pub struct FilmDetailAdapter {
    sender: String,
    manifests: Option<Arc<dyn Fetch>>,
    manifest_timeout: Duration,
}

impl FilmDetailAdapter {
    /// Creates an adapter that keeps HLS master playlists unresolved
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            manifests: None,
            manifest_timeout: Duration::from_secs(30),
        }
    }

    /// Resolves single-manifest streams through `fetcher`
    ///
    /// Manifest requests are accounted against the sender's upstream key.
    pub fn with_manifest_fetcher(mut self, fetcher: Arc<dyn Fetch>, timeout: Duration) -> Self {
        self.manifests = Some(fetcher);
        self.manifest_timeout = timeout;
        self
    }

    /// Parses one detail document
    pub fn parse_detail(&self, item: &WorkItem, document: &Document) -> Result<MediaRecord, ParseError> {
        let detail: FilmDetailJson = document.json()?;

        let title = match detail.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                return Err(ParseError::MissingExpectedStructure(format!(
                    "no title in {}",
                    document.url
                )))
            }
        };
        let title = match detail.subtitle.as_deref().map(str::trim) {
            Some(subtitle) if !subtitle.is_empty() => format!("{} - {}", title, subtitle),
            _ => title,
        };

        let topic = non_empty(detail.topic.clone())
            .or_else(|| non_empty(detail.brand.as_ref().and_then(|b| b.title.clone())))
            .or_else(|| non_empty(detail.category.as_ref().and_then(|c| c.title.clone())))
            .or_else(|| item.topic().map(str::to_string))
            .unwrap_or_else(|| title.clone());

        let base = document.base_url()?;
        let variants = self.parse_variants(&detail.streams, &base);
        if variants.is_empty() {
            return Err(ParseError::MissingExpectedStructure(format!(
                "no playable stream in {}",
                document.url
            )));
        }

        let mut record = MediaRecord::new(&self.sender, topic, title);
        record.description = non_empty(detail.lead_paragraph.clone())
            .or_else(|| non_empty(detail.teaser_text.clone()));
        record.airtime = detail
            .airtime
            .as_deref()
            .and_then(parse_datetime)
            .or_else(|| detail.editorial_date.as_deref().and_then(parse_datetime));
        record.duration_secs = detail.duration.unwrap_or(0);
        record.website = detail.sharing_url.clone();
        record.subtitle_url = pick_subtitle(&detail.captions, &base);
        record.geo = detail
            .attributes
            .as_ref()
            .and_then(|a| a.geo_location.as_ref())
            .and_then(|g| g.value.as_deref())
            .and_then(parse_geo);
        record.variants = variants;

        Ok(record)
    }

    fn parse_variants(&self, streams: &[StreamJson], base: &Url) -> BTreeMap<QualityTier, String> {
        if let [stream] = streams {
            if let Some(fetcher) = self.manifests.as_ref().filter(|_| stream.is_manifest()) {
                return self.resolve_manifest(fetcher.as_ref(), stream, base);
            }
        }

        let mut variants = BTreeMap::new();
        for stream in streams {
            if let Some(uri) = stream.uri.as_deref().filter(|u| !u.trim().is_empty()) {
                variants.insert(stream.tier(), absolute(uri, base));
            }
        }
        variants
    }

    /// Fetches and classifies an HLS master playlist
    ///
    /// The playlist URL itself is never a download variant: a failed fetch
    /// or a playlist without classifiable entries yields no variants.
    fn resolve_manifest(&self, fetcher: &dyn Fetch, stream: &StreamJson, base: &Url) -> BTreeMap<QualityTier, String> {
        let Some(uri) = stream.uri.as_deref().filter(|u| !u.trim().is_empty()) else {
            return BTreeMap::new();
        };
        let url = absolute(uri, base);

        let manifest = match fetcher.fetch(&url, &self.sender, self.manifest_timeout) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(url = %url, "Failed to fetch manifest: {}", e);
                return BTreeMap::new();
            }
        };

        let manifest_base = match manifest.base_url() {
            Ok(manifest_base) => manifest_base,
            Err(e) => {
                warn!(url = %url, "Unusable manifest URL: {}", e);
                return BTreeMap::new();
            }
        };
        let entries = parse_master_playlist(manifest.text());
        let variants = resolve_variants(&entries, &manifest_base);
        debug!(
            entries = entries.len(),
            classified = variants.len(),
            "Resolved manifest {}",
            url
        );

        variants
    }
}

impl Adapter for FilmDetailAdapter {
    type Output = MediaRecord;

    fn process(&self, item: &WorkItem, document: &Document) -> Result<Processed<MediaRecord>, ParseError> {
        Ok(Processed::results(vec![self.parse_detail(item, document)?]))
    }

    fn upstream_key(&self, _item: &WorkItem) -> String {
        self.sender.clone()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn absolute(uri: &str, base: &Url) -> String {
    add_domain_if_missing(uri.trim(), base.origin().ascii_serialization().as_str())
}

/// Prefers XML captions, otherwise takes the first one
fn pick_subtitle(captions: &[CaptionJson], base: &Url) -> Option<String> {
    let uris: Vec<&str> = captions
        .iter()
        .filter_map(|c| c.uri.as_deref())
        .filter(|u| !u.trim().is_empty())
        .collect();

    uris.iter()
        .find(|u| u.ends_with(SUBTITLE_EXTENSION))
        .or_else(|| uris.first())
        .map(|u| absolute(u, base))
}

fn parse_geo(value: &str) -> Option<GeoLocation> {
    match value.parse() {
        Ok(geo) => Some(geo),
        Err(e) => {
            debug!("Ignoring geo location: {}", e);
            None
        }
    }
}

/// Parses RFC 3339 timestamps (broadcaster local time kept) or bare
/// ISO local date-times
fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            debug!("Unparsable date '{}'", value);
            None
        })
}
