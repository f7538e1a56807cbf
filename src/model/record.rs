use crate::manifest::QualityTier;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::str::FromStr;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// A terminal result with an application-defined deduplication key
///
/// The key is ordered so that merged result sets have a stable iteration
/// order independent of which worker produced which result.
pub trait DedupKey {
    type Key: Ord + Clone + Debug + Send;

    fn dedup_key(&self) -> Self::Key;
}

/// Region a broadcast may be streamed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeoLocation {
    De,
    At,
    Ch,
    /// Germany, Austria and Switzerland
    DeAtCh,
    Eu,
    /// No restriction
    World,
}

impl FromStr for GeoLocation {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "at" => Ok(Self::At),
            "ch" => Ok(Self::Ch),
            "dach" => Ok(Self::DeAtCh),
            "eu" | "ebu" => Ok(Self::Eu),
            "welt" | "world" | "none" => Ok(Self::World),
            other => Err(format!("unknown geo location '{}'", other)),
        }
    }
}

/// One broadcast with its download variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    /// Broadcaster (site) name
    pub sender: String,

    pub topic: String,

    pub title: String,

    pub description: Option<String>,

    /// Broadcast time in the broadcaster's local time
    pub airtime: Option<NaiveDateTime>,

    /// Length in seconds
    pub duration_secs: u64,

    /// Public page of the broadcast
    pub website: Option<String>,

    pub subtitle_url: Option<String>,

    /// Streaming restriction, if the broadcaster states one
    pub geo: Option<GeoLocation>,

    /// Download URL per quality tier
    pub variants: BTreeMap<QualityTier, String>,
}

impl MediaRecord {
    pub fn new(sender: impl Into<String>, topic: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            topic: topic.into(),
            title: title.into(),
            description: None,
            airtime: None,
            duration_secs: 0,
            website: None,
            subtitle_url: None,
            geo: None,
            variants: BTreeMap::new(),
        }
    }
}

impl DedupKey for MediaRecord {
    type Key = (String, String, String, Option<NaiveDateTime>);

    fn dedup_key(&self) -> Self::Key {
        (
            self.sender.clone(),
            self.topic.clone(),
            self.title.clone(),
            self.airtime,
        )
    }
}
