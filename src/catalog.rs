//! Video records and best-effort resolution from ranking filenames.
//!
//! Rankings reference videos by a filename-like key derived from the record's
//! source URL or path. Resolution tries an exact key match first and falls
//! back to a bidirectional substring comparison with the container extension
//! stripped. The fallback can mis-match when filenames are substrings of one
//! another; ties are resolved by insertion order and not disambiguated
//! further.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable identifier for a video within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Wrap an upstream identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One candidate video, immutable once loaded for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub title: String,
    /// URL or path the matching key is derived from.
    pub source_ref: String,
    /// Ranking confidence in `0..=1`, when the upstream scorer produced one.
    pub confidence_score: Option<f64>,
}

/// Display classification for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl ScoreBand {
    /// Classify a confidence score into its display band.
    pub fn for_score(score: f64) -> Self {
        if score >= 0.8 {
            ScoreBand::Excellent
        } else if score >= 0.6 {
            ScoreBand::Good
        } else if score >= 0.4 {
            ScoreBand::Fair
        } else if score >= 0.2 {
            ScoreBand::Poor
        } else {
            ScoreBand::VeryPoor
        }
    }

    /// Short label suitable for presentation hooks.
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "excellent",
            ScoreBand::Good => "good",
            ScoreBand::Fair => "fair",
            ScoreBand::Poor => "poor",
            ScoreBand::VeryPoor => "very-poor",
        }
    }
}

/// Extract the filename-like matching key from a URL or path.
pub fn matching_key(source_ref: &str) -> &str {
    source_ref.rsplit('/').next().unwrap_or(source_ref)
}

/// Human-readable title derived from a filename.
pub fn format_title(filename: &str) -> String {
    let stem = strip_extension(filename).replace('_', " ");
    let mut out = String::with_capacity(stem.len());
    let mut at_word_start = true;
    for ch in stem.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    out
}

fn strip_extension(filename: &str) -> &str {
    filename.strip_suffix(".mp4").unwrap_or(filename)
}

/// Session-immutable set of video records with filename-key lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<VideoRecord>,
    by_key: HashMap<String, usize>,
    by_id: HashMap<VideoId, usize>,
}

impl Catalog {
    /// Build a catalog, indexing each record by its derived matching key.
    pub fn new(records: Vec<VideoRecord>) -> Self {
        let mut by_key = HashMap::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            // First record wins on duplicate keys, matching insertion order.
            by_key
                .entry(matching_key(&record.source_ref).to_string())
                .or_insert(idx);
            by_id.entry(record.id.clone()).or_insert(idx);
        }
        Self {
            records,
            by_key,
            by_id,
        }
    }

    /// All records in load order.
    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by its identifier.
    pub fn get(&self, id: &VideoId) -> Option<&VideoRecord> {
        self.by_id.get(id).map(|&idx| &self.records[idx])
    }

    /// Resolve a ranking filename to a record.
    ///
    /// Exact key match first, then a bidirectional substring fallback with
    /// the extension stripped. Returns the first candidate in load order.
    pub fn resolve(&self, filename: &str) -> Option<&VideoRecord> {
        if filename.is_empty() {
            return None;
        }
        if let Some(&idx) = self.by_key.get(filename) {
            return Some(&self.records[idx]);
        }
        let wanted = strip_extension(filename);
        if wanted.is_empty() {
            return None;
        }
        self.records.iter().find(|record| {
            let key = strip_extension(matching_key(&record.source_ref));
            !key.is_empty() && (key.contains(wanted) || wanted.contains(key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, source_ref: &str) -> VideoRecord {
        VideoRecord {
            id: VideoId::new(id),
            title: format_title(matching_key(source_ref)),
            source_ref: source_ref.to_string(),
            confidence_score: None,
        }
    }

    #[test]
    fn matching_key_takes_last_url_segment() {
        assert_eq!(
            matching_key("https://example.com/data/resolve/main/1000564187.mp4"),
            "1000564187.mp4"
        );
        assert_eq!(matching_key("plain_name.mp4"), "plain_name.mp4");
        assert_eq!(matching_key(""), "");
    }

    #[test]
    fn resolve_prefers_exact_key() {
        let catalog = Catalog::new(vec![
            record("a", "https://cdn/x/clip_10.mp4"),
            record("b", "https://cdn/x/clip_1.mp4"),
        ]);
        let hit = catalog.resolve("clip_1.mp4").unwrap();
        assert_eq!(hit.id.as_str(), "b");
    }

    #[test]
    fn resolve_falls_back_to_substring_in_both_directions() {
        let catalog = Catalog::new(vec![record("a", "https://cdn/x/beach_sunset.mp4")]);
        // Record key is a substring of the ranking key.
        assert_eq!(
            catalog.resolve("beach_sunset_long.mp4").unwrap().id.as_str(),
            "a"
        );
        // And the other direction.
        let catalog = Catalog::new(vec![record("b", "https://cdn/x/beach_sunset_long.mp4")]);
        assert_eq!(catalog.resolve("sunset_long.mp4").unwrap().id.as_str(), "b");
    }

    #[test]
    fn resolve_misses_report_none() {
        let catalog = Catalog::new(vec![record("a", "https://cdn/x/clip.mp4")]);
        assert!(catalog.resolve("unrelated.mp4").is_none());
        assert!(catalog.resolve("").is_none());
    }

    #[test]
    fn titles_are_humanized() {
        assert_eq!(format_title("level_angle_shot.mp4"), "Level Angle Shot");
        assert_eq!(format_title("already titled"), "Already Titled");
    }

    #[test]
    fn score_bands_cover_the_unit_interval() {
        assert_eq!(ScoreBand::for_score(0.95), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(0.8), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(0.65), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(0.5), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_score(0.25), ScoreBand::Poor);
        assert_eq!(ScoreBand::for_score(0.0), ScoreBand::VeryPoor);
    }
}
