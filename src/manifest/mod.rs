//! Stream manifest handling
//!
//! This module reads HLS master playlists into [`ManifestEntry`] values and
//! classifies each entry into the fixed [`QualityTier`] ladder:
//! - `playlist`: `#EXT-X-STREAM-INF` parsing and per-tier URL selection
//! - `quality`: the codec filter and the resolution lookup table

mod playlist;
mod quality;

pub use playlist::{parse_master_playlist, resolve_variants, ManifestEntry};
pub use quality::{classify, parse_resolution, QualityTier, ACCEPTED_VIDEO_CODEC};
