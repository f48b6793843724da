//! Deterministic sub-sampling of a ranked range.
//!
//! Samples must be reproducible across sessions so TPR estimates stay stable
//! while a reviewer works through the same pool over several sittings: the
//! shuffle seed derives only from the pool identity string.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::ranking::{RangeDefinition, RankingEntry};

/// Outcome of sampling one rank range.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    pub range: RangeDefinition,
    /// Sampled subset, at most the requested sample size.
    pub sample: Vec<RankingEntry>,
    pub total_in_range: usize,
    pub has_videos: bool,
}

/// Derive a stable integer seed from a pool identity string.
///
/// Uses a 32-bit string hash (not cryptographic) so the same identity maps to
/// the same seed across processes and platforms.
pub fn pool_seed(pool_identity: &str) -> u64 {
    let mut hash: i32 = 0;
    for unit in pool_identity.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    u64::from(hash.unsigned_abs())
}

/// Draw a reproducible sample from the entries of one range.
///
/// Inputs are never mutated. With at most `sample_size` entries the input is
/// returned unshuffled; otherwise a Fisher-Yates shuffle seeded from the pool
/// identity picks the subset.
pub fn sample(
    range: &RangeDefinition,
    range_entries: &[RankingEntry],
    pool_identity: &str,
    sample_size: usize,
) -> SampleResult {
    if range_entries.is_empty() {
        return SampleResult {
            range: range.clone(),
            sample: Vec::new(),
            total_in_range: 0,
            has_videos: false,
        };
    }
    let total_in_range = range_entries.len();
    let sample = if total_in_range <= sample_size {
        range_entries.to_vec()
    } else {
        let mut shuffled = range_entries.to_vec();
        let mut rng = StdRng::seed_from_u64(pool_seed(pool_identity));
        shuffled.shuffle(&mut rng);
        shuffled.truncate(sample_size);
        shuffled
    };
    SampleResult {
        range: range.clone(),
        sample,
        total_in_range,
        has_videos: true,
    }
}

/// Canonical pool identity for a clamped range.
pub fn range_pool_identity(range: &RangeDefinition) -> String {
    format!("range_{}_{}", range.start, range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(count: u32) -> Vec<RankingEntry> {
        (1..=count)
            .map(|rank| RankingEntry {
                rank,
                score: 1.0 - rank as f64 / count as f64,
                filename: format!("{rank}.mp4"),
            })
            .collect()
    }

    fn band(start: u32, end: u32) -> RangeDefinition {
        RangeDefinition::new("band", start, end)
    }

    #[test]
    fn seed_is_stable_for_identity_strings() {
        assert_eq!(pool_seed("range_1_1000"), pool_seed("range_1_1000"));
        assert_ne!(pool_seed("range_1_1000"), pool_seed("range_1001_5000"));
        assert_eq!(pool_seed(""), 0);
    }

    #[test]
    fn repeated_sampling_is_identical() {
        let all = entries(1000);
        let range = band(1, 1000);
        let first = sample(&range, &all, "range_1_1000", 100);
        let second = sample(&range, &all, "range_1_1000", 100);
        let third = sample(&range, &all, "range_1_1000", 100);
        assert_eq!(first.sample.len(), 100);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn different_pools_draw_different_samples() {
        let all = entries(1000);
        let range = band(1, 1000);
        let a = sample(&range, &all, "pool-a", 100);
        let b = sample(&range, &all, "pool-b", 100);
        assert_ne!(a.sample, b.sample);
    }

    #[test]
    fn sample_size_caps_at_available_entries() {
        let all = entries(40);
        let result = sample(&band(1, 40), &all, "small", 100);
        assert_eq!(result.sample, all);
        assert_eq!(result.total_in_range, 40);
        assert!(result.has_videos);
    }

    #[test]
    fn empty_range_reports_no_videos() {
        let result = sample(&band(5001, 10000), &[], "range_5001_10000", 100);
        assert!(result.sample.is_empty());
        assert_eq!(result.total_in_range, 0);
        assert!(!result.has_videos);
    }

    #[test]
    fn sampling_leaves_input_untouched() {
        let all = entries(500);
        let before = all.clone();
        let _ = sample(&band(1, 500), &all, "pool", 50);
        assert_eq!(all, before);
    }

    #[test]
    fn sampled_entries_come_from_the_input() {
        let all = entries(300);
        let result = sample(&band(1, 300), &all, "pool", 25);
        assert_eq!(result.sample.len(), 25);
        for entry in &result.sample {
            assert!(all.contains(entry));
        }
    }
}
