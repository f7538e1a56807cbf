use crate::manifest::{classify, QualityTier};
use crate::url::resolve_href;
use std::collections::BTreeMap;
use url::Url;

const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF:";

/// One stream variant of a master playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Variant playlist URI as written in the manifest
    pub uri: String,

    /// Value of the `CODECS` attribute
    pub codecs: Option<String>,

    /// Value of the `RESOLUTION` attribute
    pub resolution: Option<String>,

    /// Value of the `BANDWIDTH` attribute
    pub bandwidth: Option<u64>,

    /// Whether the variant carries audio
    pub has_audio: bool,
}

impl ManifestEntry {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            codecs: None,
            resolution: None,
            bandwidth: None,
            has_audio: false,
        }
    }

    pub fn with_codecs(mut self, codecs: impl Into<String>) -> Self {
        let codecs = codecs.into();
        self.has_audio |= codecs_have_audio(&codecs);
        self.codecs = Some(codecs);
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }
}

/// Parses the variant entries of an HLS master playlist
///
/// Each `#EXT-X-STREAM-INF` tag is paired with the next non-comment line.
/// Tags without a URI line are dropped. Media playlists (no stream-inf tags)
/// yield no entries.
pub fn parse_master_playlist(content: &str) -> Vec<ManifestEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<Vec<(String, String)>> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        if let Some(attributes) = line.strip_prefix(STREAM_INF_TAG) {
            if pending.is_some() {
                tracing::debug!("Stream-inf tag without URI line, dropping it");
            }
            pending = Some(parse_attribute_list(attributes));
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some(attributes) = pending.take() {
            entries.push(entry_from_attributes(line, attributes));
        }
    }

    entries
}

/// Maps classified entries to their absolute URLs, one URL per tier
///
/// When several entries share a tier the later one in manifest order wins.
pub fn resolve_variants(entries: &[ManifestEntry], base: &Url) -> BTreeMap<QualityTier, String> {
    let mut variants = BTreeMap::new();

    for entry in entries {
        let Some(tier) = classify(entry) else {
            continue;
        };
        match resolve_href(&entry.uri, base) {
            Some(url) => {
                variants.insert(tier, url);
            }
            None => tracing::debug!("Cannot resolve variant URI {}", entry.uri),
        }
    }

    variants
}

fn entry_from_attributes(uri: &str, attributes: Vec<(String, String)>) -> ManifestEntry {
    let mut entry = ManifestEntry::new(uri);

    for (name, value) in attributes {
        match name.as_str() {
            "CODECS" => entry = entry.with_codecs(value),
            "RESOLUTION" => entry.resolution = Some(value),
            "BANDWIDTH" => entry.bandwidth = value.parse().ok(),
            "AUDIO" => entry.has_audio = true,
            _ => {}
        }
    }

    entry
}

/// Splits an attribute list on commas outside quoted strings
fn parse_attribute_list(list: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in list.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                push_attribute(&mut attributes, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_attribute(&mut attributes, &current);

    attributes
}

fn push_attribute(attributes: &mut Vec<(String, String)>, raw: &str) {
    if let Some((name, value)) = raw.split_once('=') {
        attributes.push((name.trim().to_uppercase(), value.trim().to_string()));
    }
}

fn codecs_have_audio(codecs: &str) -> bool {
    codecs.split(',').map(str::trim).any(|codec| {
        codec.starts_with("mp4a") || codec.starts_with("ac-3") || codec.starts_with("ec-3")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = r#"#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=1396000,CODECS="avc1.77.30, mp4a.40.2",RESOLUTION=640x360
index_1_av.m3u8?null=0
#EXT-X-STREAM-INF:BANDWIDTH=3776000,CODECS="avc1.64001f, mp4a.40.2",RESOLUTION=1280x720
https://cdn.example.de/hls/index_3_av.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=64000,CODECS="mp4a.40.2"
index_0_a.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=596000,CODECS="avc1.66.30, mp4a.40.2",RESOLUTION=512x288
index_2_av.m3u8
"#;

    #[test]
    fn test_parse_master_playlist() {
        let entries = parse_master_playlist(MASTER);
        assert_eq!(entries.len(), 4);

        let first = &entries[0];
        assert_eq!(first.uri, "index_1_av.m3u8?null=0");
        assert_eq!(first.codecs.as_deref(), Some("avc1.77.30, mp4a.40.2"));
        assert_eq!(first.resolution.as_deref(), Some("640x360"));
        assert_eq!(first.bandwidth, Some(1_396_000));
        assert!(first.has_audio);

        let audio_only = &entries[2];
        assert!(audio_only.resolution.is_none());
        assert!(audio_only.has_audio);
    }

    #[test]
    fn test_quoted_commas_do_not_split_attributes() {
        let attributes = parse_attribute_list(r#"CODECS="a,b,c",RESOLUTION=1x1"#);
        assert_eq!(
            attributes,
            vec![
                ("CODECS".to_string(), "a,b,c".to_string()),
                ("RESOLUTION".to_string(), "1x1".to_string())
            ]
        );
    }

    #[test]
    fn test_tag_without_uri_is_dropped() {
        let content = "#EXTM3U\n#EXT-X-STREAM-INF:RESOLUTION=640x360,CODECS=\"avc1\"\n";
        assert!(parse_master_playlist(content).is_empty());
    }

    #[test]
    fn test_media_playlist_has_no_entries() {
        let content = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:10,\nsegment0.ts\n";
        assert!(parse_master_playlist(content).is_empty());
    }

    #[test]
    fn test_resolve_variants() {
        let base = Url::parse("https://media.example.de/hls/master.m3u8").unwrap();
        let variants = resolve_variants(&parse_master_playlist(MASTER), &base);

        assert_eq!(variants.len(), 3);
        assert_eq!(
            variants.get(&QualityTier::Normal).map(String::as_str),
            Some("https://media.example.de/hls/index_1_av.m3u8?null=0")
        );
        assert_eq!(
            variants.get(&QualityTier::Hd).map(String::as_str),
            Some("https://cdn.example.de/hls/index_3_av.m3u8")
        );
        assert_eq!(
            variants.get(&QualityTier::Small).map(String::as_str),
            Some("https://media.example.de/hls/index_2_av.m3u8")
        );
    }

    #[test]
    fn test_resolve_variants_last_entry_wins_per_tier() {
        let base = Url::parse("https://m.example.de/master.m3u8").unwrap();
        let entries = vec![
            ManifestEntry::new("a.m3u8").with_codecs("avc1").with_resolution("640x360"),
            ManifestEntry::new("b.m3u8").with_codecs("avc1").with_resolution("960x544"),
        ];

        let variants = resolve_variants(&entries, &base);
        assert_eq!(
            variants.get(&QualityTier::Normal).map(String::as_str),
            Some("https://m.example.de/b.m3u8")
        );
    }
}
