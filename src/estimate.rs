//! True-positive-rate estimation and top-N projection.
//!
//! A labeled sample turns into a rate and an extrapolated count for its full
//! range. The top-N projection stays usable before any labels exist and
//! converges to ground truth as labeling accumulates, via a three-tier
//! fallback: observed label rate, then confidence-score proxy, then a flat
//! prior.

use crate::catalog::Catalog;
use crate::labels::{Label, LabelMap};
use crate::ranking::{RangeDefinition, RankingEntry, entries_in_range, standard_ranges};
use crate::sampler::{SampleResult, range_pool_identity, sample};

/// Flat prior rate used when neither labels nor scores are available.
const PRIOR_RATE: f64 = 0.5;

/// Rate observed over one labeled sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TprEstimate {
    /// True-positive fraction in `0..=1`; zero when nothing was counted.
    pub rate: f64,
    pub true_positives: usize,
    pub total_counted: usize,
}

/// Estimate the true-positive rate of a sample against the merged labels.
///
/// Every sampled entry is counted. Entries that cannot be resolved to a
/// record, and resolved entries without an explicit label, both count as
/// `no`, deliberately biasing the rate downward.
pub fn estimate_tpr(sampled: &[RankingEntry], catalog: &Catalog, labels: &LabelMap) -> TprEstimate {
    let total_counted = sampled.len();
    let mut true_positives = 0;
    for entry in sampled {
        let Some(record) = catalog.resolve(&entry.filename) else {
            continue;
        };
        if labels
            .get(&record.id)
            .copied()
            .unwrap_or(Label::No)
            .is_yes()
        {
            true_positives += 1;
        }
    }
    let rate = if total_counted == 0 {
        0.0
    } else {
        true_positives as f64 / total_counted as f64
    };
    TprEstimate {
        rate,
        true_positives,
        total_counted,
    }
}

/// Project a sample rate onto the full range it was drawn from.
pub fn extrapolate(total_in_range: usize, rate: f64) -> usize {
    (total_in_range as f64 * rate).round() as usize
}

/// Estimate true positives among the top `n` ranked entries.
pub fn estimate_top_n(
    ordered: &[RankingEntry],
    catalog: &Catalog,
    labels: &LabelMap,
    n: usize,
) -> usize {
    if n == 0 || ordered.is_empty() {
        return 0;
    }
    let top = &ordered[..n.min(ordered.len())];

    let mut yes = 0usize;
    let mut labeled = 0usize;
    for entry in top {
        if let Some(record) = catalog.resolve(&entry.filename)
            && let Some(label) = labels.get(&record.id)
        {
            labeled += 1;
            if label.is_yes() {
                yes += 1;
            }
        }
    }
    let threshold = 20.0_f64.min(n as f64 * 0.2);
    if labeled > 0 && labeled as f64 >= threshold {
        let observed = yes as f64 / labeled as f64;
        return (n as f64 * observed).round() as usize;
    }

    let mut score_sum = 0.0;
    let mut scored = 0usize;
    for entry in top {
        if let Some(score) = catalog
            .resolve(&entry.filename)
            .and_then(|record| record.confidence_score)
        {
            score_sum += score;
            scored += 1;
        }
    }
    if scored > 0 {
        return (n as f64 * (score_sum / scored as f64)).round() as usize;
    }

    (n as f64 * PRIOR_RATE).round() as usize
}

/// Yes-rate over explicitly labeled records only; zero when none are labeled.
pub fn observed_rate(labels: &LabelMap) -> f64 {
    let labeled = labels.len();
    if labeled == 0 {
        return 0.0;
    }
    let yes = labels.values().filter(|label| label.is_yes()).count();
    yes as f64 / labeled as f64
}

/// How many top results to display to reach a true-positive goal.
///
/// Without an observed rate this falls back to a conservative doubling.
pub fn videos_for_goal(goal: usize, rate: f64) -> usize {
    if rate > 0.0 {
        (goal as f64 / rate).ceil() as usize
    } else {
        goal * 2
    }
}

/// Sampling analysis of one rank range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReport {
    /// Range with its end clamped to the available ranking.
    pub range: RangeDefinition,
    /// Range name annotated with the actually-available span.
    pub display_name: String,
    pub result: SampleResult,
    pub estimate: TprEstimate,
    pub estimated_true_positives: usize,
    /// Display classification against the top-N goal target.
    pub meets_goal: bool,
}

/// Run the sampling analysis over every standard range of the ranking.
pub fn analyze_ranges(
    ordered: &[RankingEntry],
    catalog: &Catalog,
    labels: &LabelMap,
    goal_target: usize,
    sample_size: usize,
) -> Vec<RangeReport> {
    let total = ordered.len();
    standard_ranges()
        .into_iter()
        .map(|nominal| {
            let clamped = nominal.clamped(total);
            let in_range = if clamped.is_empty() {
                Vec::new()
            } else {
                entries_in_range(ordered, &clamped)
            };
            let result = sample(
                &clamped,
                &in_range,
                &range_pool_identity(&clamped),
                sample_size,
            );
            let estimate = estimate_tpr(&result.sample, catalog, labels);
            let estimated_true_positives = extrapolate(result.total_in_range, estimate.rate);
            RangeReport {
                display_name: display_name(&nominal, &clamped, result.has_videos),
                range: clamped,
                meets_goal: estimated_true_positives >= goal_target,
                result,
                estimate,
                estimated_true_positives,
            }
        })
        .collect()
}

fn display_name(nominal: &RangeDefinition, clamped: &RangeDefinition, has_videos: bool) -> String {
    if !has_videos {
        format!("{} (no videos available)", nominal.name)
    } else if clamped.end < nominal.end {
        format!(
            "{} (ranks {}-{} available)",
            nominal.name, clamped.start, clamped.end
        )
    } else {
        nominal.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{VideoId, VideoRecord};
    use crate::ranking::build_ranking;

    fn catalog_of(count: usize, score_of: impl Fn(usize) -> f64) -> Catalog {
        let records = (0..count)
            .map(|idx| VideoRecord {
                id: VideoId::new(format!("v{idx}")),
                title: format!("v{idx}"),
                source_ref: format!("https://cdn/q/v{idx}.mp4"),
                confidence_score: Some(score_of(idx)),
            })
            .collect();
        Catalog::new(records)
    }

    fn yes_labels(ids: impl IntoIterator<Item = usize>) -> LabelMap {
        ids.into_iter()
            .map(|idx| (VideoId::new(format!("v{idx}")), Label::Yes))
            .collect()
    }

    #[test]
    fn sample_rate_extrapolates_over_the_range() {
        // Scenario: 100 sampled, 20 labeled yes, 5000 in range.
        let catalog = catalog_of(100, |_| 0.9);
        let ranking = build_ranking(catalog.records());
        let labels = yes_labels(0..20);
        let estimate = estimate_tpr(&ranking, &catalog, &labels);
        assert_eq!(estimate.total_counted, 100);
        assert_eq!(estimate.true_positives, 20);
        assert!((estimate.rate - 0.20).abs() < 1e-9);
        assert_eq!(extrapolate(5000, estimate.rate), 1000);
    }

    #[test]
    fn unresolvable_entries_count_as_no() {
        let catalog = catalog_of(5, |_| 0.9);
        let mut ranking = build_ranking(catalog.records());
        for entry in &mut ranking {
            entry.filename = format!("missing_{}", entry.rank);
        }
        let labels = yes_labels(0..5);
        let estimate = estimate_tpr(&ranking, &catalog, &labels);
        assert_eq!(estimate.total_counted, 5);
        assert_eq!(estimate.true_positives, 0);
        assert_eq!(estimate.rate, 0.0);
    }

    #[test]
    fn rate_stays_within_unit_interval() {
        let catalog = catalog_of(50, |_| 0.5);
        let ranking = build_ranking(catalog.records());
        for labeled in [0usize, 10, 50] {
            let labels = yes_labels(0..labeled);
            let estimate = estimate_tpr(&ranking, &catalog, &labels);
            assert!((0.0..=1.0).contains(&estimate.rate));
        }
        let empty = estimate_tpr(&[], &catalog, &LabelMap::new());
        assert_eq!(empty.rate, 0.0);
        assert_eq!(empty.total_counted, 0);
    }

    #[test]
    fn extrapolation_is_monotone_in_rate() {
        let mut last = 0;
        for step in 0..=10 {
            let rate = step as f64 / 10.0;
            let estimated = extrapolate(5000, rate);
            assert!(estimated >= last);
            last = estimated;
        }
    }

    #[test]
    fn top_n_uses_observed_rate_once_enough_labels_exist() {
        let catalog = catalog_of(200, |_| 0.9);
        let ranking = build_ranking(catalog.records());
        // 25 labeled among top 100, 10 of them yes: tier 1 applies.
        let mut labels = yes_labels(0..10);
        for idx in 10..25 {
            labels.insert(VideoId::new(format!("v{idx}")), Label::No);
        }
        assert_eq!(estimate_top_n(&ranking, &catalog, &labels, 100), 40);
    }

    #[test]
    fn top_n_falls_back_to_confidence_scores() {
        let catalog = catalog_of(100, |_| 0.3);
        let ranking = build_ranking(catalog.records());
        // Too few labels for tier 1, scores available for tier 2.
        let labels = yes_labels(0..3);
        assert_eq!(estimate_top_n(&ranking, &catalog, &labels, 100), 30);
    }

    #[test]
    fn top_n_uses_flat_prior_without_labels_or_scores() {
        let records = (0..10)
            .map(|idx| VideoRecord {
                id: VideoId::new(format!("v{idx}")),
                title: format!("v{idx}"),
                source_ref: format!("https://cdn/q/v{idx}.mp4"),
                confidence_score: None,
            })
            .collect::<Vec<_>>();
        let catalog = Catalog::new(records);
        let ranking: Vec<RankingEntry> = (1..=10)
            .map(|rank| RankingEntry {
                rank,
                score: 0.0,
                filename: format!("v{}.mp4", rank - 1),
            })
            .collect();
        // Records resolve but carry no scores, so the prior applies.
        assert_eq!(
            estimate_top_n(&ranking, &catalog, &LabelMap::new(), 10),
            5
        );
        assert_eq!(estimate_top_n(&ranking, &catalog, &LabelMap::new(), 0), 0);
    }

    #[test]
    fn range_analysis_covers_missing_tail_ranges() {
        // Scenario: 3000 ranked items; the 5k-10k range has no videos.
        let catalog = catalog_of(3000, |idx| 1.0 - idx as f64 / 3000.0);
        let ranking = build_ranking(catalog.records());
        let labels = LabelMap::new();
        let reports = analyze_ranges(&ranking, &catalog, &labels, 100, 100);
        assert_eq!(reports.len(), 3);

        let top = &reports[0];
        assert_eq!(top.result.sample.len(), 100);
        assert_eq!(top.result.total_in_range, 1000);
        assert!(top.result.has_videos);
        assert_eq!(top.display_name, "Top 1-1k");

        let mid = &reports[1];
        assert_eq!(mid.result.total_in_range, 2000);
        assert_eq!(mid.display_name, "1k-5k (ranks 1001-3000 available)");

        let tail = &reports[2];
        assert!(!tail.result.has_videos);
        assert_eq!(tail.result.total_in_range, 0);
        assert!(tail.result.sample.is_empty());
        assert_eq!(tail.display_name, "5k-10k (no videos available)");
        assert_eq!(tail.estimated_true_positives, 0);
    }

    #[test]
    fn goal_translation_doubles_without_a_rate() {
        assert_eq!(videos_for_goal(100, 0.25), 400);
        assert_eq!(videos_for_goal(100, 0.0), 200);
        assert_eq!(videos_for_goal(100, 0.3), 334);
    }

    #[test]
    fn observed_rate_counts_explicit_labels_only() {
        let mut labels = yes_labels(0..3);
        labels.insert(VideoId::new("v9"), Label::No);
        assert!((observed_rate(&labels) - 0.75).abs() < 1e-9);
        assert_eq!(observed_rate(&LabelMap::new()), 0.0);
    }
}
