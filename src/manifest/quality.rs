use crate::manifest::ManifestEntry;
use crate::ManifestError;
use serde::Serialize;
use std::fmt;

/// Codec family a variant must carry to be offered as a download
pub const ACCEPTED_VIDEO_CODEC: &str = "avc1";

/// Closed, ordered quality ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    VerySmall,
    Small,
    Normal,
    Hd,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VerySmall => "VERY_SMALL",
            Self::Small => "SMALL",
            Self::Normal => "NORMAL",
            Self::Hd => "HD",
        };
        f.write_str(name)
    }
}

/// Known variant resolutions. Matching is on the exact string: a resolution
/// missing from this table is unclassifiable even if it is one pixel off.
const RESOLUTION_TIERS: &[(&str, QualityTier)] = &[
    ("512x288", QualityTier::Small),
    ("640x360", QualityTier::Normal),
    ("960x544", QualityTier::Normal),
    ("1280x720", QualityTier::Hd),
];

/// Classifies a manifest entry into a quality tier
///
/// Returns None for audio-only or non-H.264 variants, for missing or
/// unparsable resolutions and for resolutions not in the lookup table.
///
/// # Examples
///
/// ```
/// use mediacrawl::manifest::{classify, ManifestEntry, QualityTier};
///
/// let entry = ManifestEntry::new("hd.m3u8")
///     .with_codecs("avc1.64001f,mp4a.40.2")
///     .with_resolution("1280x720");
/// assert_eq!(classify(&entry), Some(QualityTier::Hd));
/// ```
pub fn classify(entry: &ManifestEntry) -> Option<QualityTier> {
    if !has_accepted_codec(entry.codecs.as_deref()?) {
        return None;
    }

    let resolution = entry.resolution.as_deref()?.trim();
    if let Err(e) = parse_resolution(resolution) {
        tracing::trace!("Skipping manifest entry {}: {}", entry.uri, e);
        return None;
    }

    RESOLUTION_TIERS
        .iter()
        .find(|(known, _)| *known == resolution)
        .map(|(_, tier)| *tier)
}

/// Parses a `<width>x<height>` resolution string
pub fn parse_resolution(resolution: &str) -> Result<(u32, u32), ManifestError> {
    let unparsable = || ManifestError::UnparsableEntry(format!("resolution '{}'", resolution));

    let (width, height) = resolution.trim().split_once('x').ok_or_else(unparsable)?;
    let width = width.parse::<u32>().map_err(|_| unparsable())?;
    let height = height.parse::<u32>().map_err(|_| unparsable())?;

    Ok((width, height))
}

fn has_accepted_codec(codecs: &str) -> bool {
    codecs
        .split(',')
        .any(|codec| codec.trim().starts_with(ACCEPTED_VIDEO_CODEC))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(codec: &str, resolution: &str) -> ManifestEntry {
        ManifestEntry::new("variant.m3u8")
            .with_codecs(codec)
            .with_resolution(resolution)
    }

    #[test]
    fn test_quality_table() {
        let cases = [
            ("other codec", "1280x720", None),
            ("avc1", "512x288", Some(QualityTier::Small)),
            ("avc1", "640x360", Some(QualityTier::Normal)),
            ("avc1", "960x544", Some(QualityTier::Normal)),
            ("avc1", "1280x720", Some(QualityTier::Hd)),
            ("avc1", "1280x719", None),
        ];

        for (codec, resolution, expected) in cases {
            assert_eq!(
                classify(&entry(codec, resolution)),
                expected,
                "({}, {})",
                codec,
                resolution
            );
        }
    }

    #[test]
    fn test_codec_list_with_profile_suffix() {
        assert_eq!(
            classify(&entry("mp4a.40.2,avc1.4d401f", "640x360")),
            Some(QualityTier::Normal)
        );
    }

    #[test]
    fn test_audio_only_variant() {
        assert_eq!(classify(&entry("mp4a.40.2", "640x360")), None);
    }

    #[test]
    fn test_missing_attributes() {
        assert_eq!(classify(&ManifestEntry::new("a.m3u8")), None);
        assert_eq!(
            classify(&ManifestEntry::new("a.m3u8").with_codecs("avc1")),
            None
        );
        assert_eq!(
            classify(&ManifestEntry::new("a.m3u8").with_resolution("1280x720")),
            None
        );
    }

    #[test]
    fn test_unparsable_resolution() {
        assert_eq!(classify(&entry("avc1", "hd")), None);
        assert_eq!(classify(&entry("avc1", "1280*720")), None);
        assert_eq!(classify(&entry("avc1", "x720")), None);
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("1280x720").unwrap(), (1280, 720));
        assert!(matches!(
            parse_resolution("1280x"),
            Err(ManifestError::UnparsableEntry(_))
        ));
    }

    #[test]
    fn test_tier_ordering() {
        assert!(QualityTier::VerySmall < QualityTier::Small);
        assert!(QualityTier::Small < QualityTier::Normal);
        assert!(QualityTier::Normal < QualityTier::Hd);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(QualityTier::VerySmall.to_string(), "VERY_SMALL");
        assert_eq!(QualityTier::Hd.to_string(), "HD");
    }
}
