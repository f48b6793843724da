//! Ranking entries and the fixed rank ranges used for sampling.

use serde::{Deserialize, Serialize};

use crate::catalog::{VideoRecord, matching_key};

/// One position in a query's full ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based dense rank, strictly increasing by descending score.
    pub rank: u32,
    pub score: f64,
    /// Filename-like key used to resolve the backing [`VideoRecord`].
    pub filename: String,
}

/// Build the ranking for a set of records.
///
/// Records without a confidence score are skipped. Sorting is stable so ties
/// keep their load order, and ranks are assigned densely from 1.
pub fn build_ranking(records: &[VideoRecord]) -> Vec<RankingEntry> {
    let mut scored: Vec<(&VideoRecord, f64)> = records
        .iter()
        .filter_map(|record| record.confidence_score.map(|score| (record, score)))
        .collect();
    scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (record, score))| RankingEntry {
            rank: idx as u32 + 1,
            score,
            filename: matching_key(&record.source_ref).to_string(),
        })
        .collect()
}

/// Inclusive band of ranking positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDefinition {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl RangeDefinition {
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// True when the rank falls inside the band.
    pub fn contains(&self, rank: u32) -> bool {
        rank >= self.start && rank <= self.end
    }

    /// Copy of this range with the end clamped to the available total.
    pub fn clamped(&self, total: usize) -> Self {
        Self {
            name: self.name.clone(),
            start: self.start,
            end: self.end.min(total as u32),
        }
    }

    /// True when clamping left nothing inside the band.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// The fixed, non-overlapping ranges that partition a full ranking.
pub fn standard_ranges() -> Vec<RangeDefinition> {
    vec![
        RangeDefinition::new("Top 1-1k", 1, 1000),
        RangeDefinition::new("1k-5k", 1001, 5000),
        RangeDefinition::new("5k-10k", 5001, 10000),
    ]
}

/// Entries of the ranking that fall inside the given range.
pub fn entries_in_range(entries: &[RankingEntry], range: &RangeDefinition) -> Vec<RankingEntry> {
    entries
        .iter()
        .filter(|entry| range.contains(entry.rank))
        .cloned()
        .collect()
}
