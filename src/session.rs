//! Review session glue over the core components.
//!
//! A session owns the state for one selected query: its catalog and ranking,
//! the ordered list being paged through, the preview buffer, and the active
//! label scope. Pool selection swaps the ordered list for a sampled subset
//! and retargets writes at that pool's ephemeral scope.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::bookmark::Bookmark;
use crate::catalog::{Catalog, VideoId, VideoRecord};
use crate::config::Settings;
use crate::estimate::{self, RangeReport, TprEstimate};
use crate::labels::{Label, LabelMap, LabelScope, LabelStore, LabelStoreError, RemoteLabelStore};
use crate::navigation::{Direction, NavOutcome, NavigationState};
use crate::preview::PreviewState;
use crate::ranking::{RankingEntry, build_ranking};

/// The three presentation contexts a query can be reviewed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Videos,
    Rankings,
    Labeling,
}

/// Ordering of the labeling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    /// Confidence score high to low; unscored records sink.
    #[serde(rename = "confidence")]
    ConfidenceDesc,
    /// Confidence score low to high; unscored records sink.
    #[serde(rename = "confidence_asc")]
    ConfidenceAsc,
    /// Yes-labeled records first, unlabeled counting as no.
    #[serde(rename = "labels")]
    LabelsFirst,
    #[serde(rename = "title")]
    Title,
    /// Yes-labeled first, then alphabetical.
    #[serde(rename = "default")]
    Default,
}

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Labels(#[from] LabelStoreError),
}

/// Header statistics for the labeling view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelingStats {
    pub yes: usize,
    pub labeled: usize,
    pub total: usize,
}

/// Artifact payload handed to the export collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPayload {
    pub query: String,
    /// Folder identity the query's artifacts are grouped under.
    pub folder: String,
    pub timestamp: String,
    pub exported_videos: Vec<ExportedVideo>,
}

/// One yes-labeled video in the export payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedVideo {
    pub id: VideoId,
    pub title: String,
    pub source_ref: String,
}

/// State for one selected query under review.
pub struct ReviewSession {
    query: String,
    catalog: Catalog,
    ranking: Vec<RankingEntry>,
    ordered: Vec<VideoId>,
    nav: NavigationState,
    preview: PreviewState,
    labels: LabelStore,
    scope: LabelScope,
    view_mode: ViewMode,
    starred: HashSet<VideoId>,
    settings: Settings,
}

impl ReviewSession {
    /// Start a session for a freshly selected query.
    pub fn new(
        query: impl Into<String>,
        catalog: Catalog,
        labels: LabelStore,
        settings: Settings,
    ) -> Self {
        let query = query.into();
        let ranking = build_ranking(catalog.records());
        let ordered: Vec<VideoId> = catalog
            .records()
            .iter()
            .map(|record| record.id.clone())
            .collect();
        let nav = NavigationState::new(ordered.len(), settings.page_size);
        Self {
            scope: LabelScope::query(query.clone()),
            query,
            catalog,
            ranking,
            ordered,
            nav,
            preview: PreviewState::new(),
            labels,
            view_mode: ViewMode::Videos,
            starred: HashSet::new(),
            settings,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn scope(&self) -> &LabelScope {
        &self.scope
    }

    pub fn ranking(&self) -> &[RankingEntry] {
        &self.ranking
    }

    /// Ids in the order currently being paged through.
    pub fn ordered(&self) -> &[VideoId] {
        &self.ordered
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn label_store(&self) -> &LabelStore {
        &self.labels
    }

    pub fn label_store_mut(&mut self) -> &mut LabelStore {
        &mut self.labels
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Labels the estimators should see in the current context.
    ///
    /// Ranking-context reads on the canonical scope merge in every pool of
    /// this query; inside a pool only that pool's scope applies.
    pub fn effective_labels(&self) -> Result<LabelMap, SessionError> {
        if !self.scope.is_pool() && self.view_mode == ViewMode::Rankings {
            Ok(self.labels.merged_for_ranking(&self.query)?)
        } else {
            Ok(self.labels.scope_labels(&self.scope)?)
        }
    }

    /// Switch presentation context, rebuilding the ordered list.
    pub fn switch_view(&mut self, mode: ViewMode) -> Result<(), SessionError> {
        self.view_mode = mode;
        self.rebuild_ordered()
    }

    /// Change the labeling sort and re-sort when in the labeling view.
    pub fn set_sort_mode(&mut self, mode: SortMode) -> Result<(), SessionError> {
        self.settings.sort_mode = mode;
        if self.view_mode == ViewMode::Labeling {
            self.rebuild_ordered()?;
        }
        Ok(())
    }

    fn rebuild_ordered(&mut self) -> Result<(), SessionError> {
        self.ordered = match self.view_mode {
            ViewMode::Videos => self
                .catalog
                .records()
                .iter()
                .map(|record| record.id.clone())
                .collect(),
            ViewMode::Rankings => self.ranking_order(),
            ViewMode::Labeling => {
                let labels = self.labels.scope_labels(&self.scope)?;
                self.labeling_order(&labels)
            }
        };
        self.nav.reset(self.ordered.len());
        self.preview.close();
        Ok(())
    }

    /// Ranking order with starred videos floated to the front.
    fn ranking_order(&self) -> Vec<VideoId> {
        let mut ids: Vec<VideoId> = self
            .ranking
            .iter()
            .filter_map(|entry| self.catalog.resolve(&entry.filename))
            .map(|record| record.id.clone())
            .collect();
        ids.sort_by_key(|id| !self.starred.contains(id));
        ids
    }

    fn labeling_order(&self, labels: &LabelMap) -> Vec<VideoId> {
        let mut records: Vec<&VideoRecord> = self.catalog.records().iter().collect();
        let label_of =
            |record: &VideoRecord| labels.get(&record.id).copied().unwrap_or(Label::No);
        match self.settings.sort_mode {
            SortMode::ConfidenceDesc => records.sort_by(|a, b| {
                let a = a.confidence_score.unwrap_or(-1.0);
                let b = b.confidence_score.unwrap_or(-1.0);
                b.total_cmp(&a)
            }),
            SortMode::ConfidenceAsc => records.sort_by(|a, b| {
                let a = a.confidence_score.unwrap_or(1.0);
                let b = b.confidence_score.unwrap_or(1.0);
                a.total_cmp(&b)
            }),
            SortMode::LabelsFirst => {
                records.sort_by_key(|record| !label_of(record).is_yes());
            }
            SortMode::Title => records.sort_by(|a, b| a.title.cmp(&b.title)),
            SortMode::Default => records.sort_by(|a, b| {
                let yes_a = label_of(a).is_yes();
                let yes_b = label_of(b).is_yes();
                yes_b.cmp(&yes_a).then_with(|| a.title.cmp(&b.title))
            }),
        }
        records.into_iter().map(|record| record.id.clone()).collect()
    }

    /// Run the sampling analysis over the standard ranges.
    pub fn analysis(&self) -> Result<Vec<RangeReport>, SessionError> {
        let labels = self.labels.merged_for_ranking(&self.query)?;
        let goal_target = estimate::estimate_top_n(
            &self.ranking,
            &self.catalog,
            &labels,
            self.settings.top_n_displayed,
        );
        Ok(estimate::analyze_ranges(
            &self.ranking,
            &self.catalog,
            &labels,
            goal_target,
            self.settings.sample_size,
        ))
    }

    /// Projected true positives in the current top-N window.
    pub fn top_n_estimate(&self) -> Result<usize, SessionError> {
        let labels = self.labels.merged_for_ranking(&self.query)?;
        Ok(estimate::estimate_top_n(
            &self.ranking,
            &self.catalog,
            &labels,
            self.settings.top_n_displayed,
        ))
    }

    /// Update the true-positive goal, retranslating it into a top-N window
    /// from the observed label rate. Returns the new window size.
    pub fn set_goal(&mut self, goal: usize) -> Result<usize, SessionError> {
        let goal = if goal == 0 {
            Settings::default().true_positive_goal
        } else {
            goal
        };
        self.settings.true_positive_goal = goal;
        let labels = self.labels.scope_labels(&LabelScope::query(&self.query))?;
        let rate = estimate::observed_rate(&labels);
        self.settings.top_n_displayed = estimate::videos_for_goal(goal, rate);
        Ok(self.settings.top_n_displayed)
    }

    /// Hand a sampled range over for focused annotation.
    ///
    /// Swaps the ordered list for the pool's resolvable sample and retargets
    /// labeling at the pool scope. Returns false when the pool has nothing
    /// to review, leaving the session unchanged.
    pub fn enter_pool(&mut self, report: &RangeReport) -> Result<bool, SessionError> {
        if !report.result.has_videos {
            return Ok(false);
        }
        let ids: Vec<VideoId> = report
            .result
            .sample
            .iter()
            .filter_map(|entry| self.catalog.resolve(&entry.filename))
            .map(|record| record.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(false);
        }
        tracing::info!(
            pool = %report.range.name,
            size = ids.len(),
            "Entering sampling pool"
        );
        self.scope = LabelScope::pool(self.query.clone(), pool_slug(&report.range.name));
        self.view_mode = ViewMode::Labeling;
        self.ordered = ids;
        self.nav.reset(self.ordered.len());
        self.preview.close();
        Ok(true)
    }

    /// Return to the canonical query scope and the previous view's order.
    pub fn leave_pool(&mut self) -> Result<(), SessionError> {
        self.scope = LabelScope::query(self.query.clone());
        self.rebuild_ordered()
    }

    /// TPR over the whole current list, counting unlabeled items as no.
    pub fn current_list_tpr(&self) -> Result<TprEstimate, SessionError> {
        let labels = self.labels.scope_labels(&self.scope)?;
        let total_counted = self.ordered.len();
        let true_positives = self
            .ordered
            .iter()
            .filter(|id| labels.get(id).copied().unwrap_or(Label::No).is_yes())
            .count();
        let rate = if total_counted == 0 {
            0.0
        } else {
            true_positives as f64 / total_counted as f64
        };
        Ok(TprEstimate {
            rate,
            true_positives,
            total_counted,
        })
    }

    /// Record currently under the cursor.
    pub fn current_video(&self) -> Option<&VideoRecord> {
        self.ordered
            .get(self.nav.current_index())
            .and_then(|id| self.catalog.get(id))
    }

    /// Open the item under the cursor for review.
    pub fn open_current(&mut self) -> Result<Option<&VideoRecord>, SessionError> {
        self.open_index(self.nav.current_index())
    }

    fn open_index(&mut self, index: usize) -> Result<Option<&VideoRecord>, SessionError> {
        let Some(id) = self.ordered.get(index).cloned() else {
            return Ok(None);
        };
        let committed = self.labels.get(&self.scope, &id)?;
        self.preview.open(id.clone(), committed);
        Ok(self.catalog.get(&id))
    }

    /// Step to the next or previous item, discarding any open preview.
    ///
    /// Same-page moves open the new item immediately. Page-crossing moves
    /// return [`NavOutcome::PageChange`]; the host materializes the page and
    /// then calls [`ReviewSession::page_ready`] to open the target item.
    pub fn navigate(&mut self, direction: Direction) -> Result<NavOutcome, SessionError> {
        self.preview.close();
        let outcome = self.nav.step(direction);
        if let NavOutcome::Moved { index } = outcome {
            self.open_index(index)?;
        }
        Ok(outcome)
    }

    /// Second phase of a page-crossing move: open the pending target item.
    pub fn page_ready(&mut self) -> Result<Option<&VideoRecord>, SessionError> {
        match self.nav.page_materialized() {
            Some(index) => self.open_index(index),
            None => Ok(None),
        }
    }

    /// Jump to a page without opening an item.
    pub fn goto_page(&mut self, page: usize) -> bool {
        self.preview.close();
        self.nav.goto_page(page)
    }

    /// Preview label of the currently open item.
    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    /// Flip the preview label of the open item.
    pub fn toggle_preview(&mut self) -> Option<Label> {
        let id = self.ordered.get(self.nav.current_index())?.clone();
        self.preview.toggle(&id)
    }

    /// Confirm the open item's preview into the active scope.
    ///
    /// Without a pending change this is a rejected no-op.
    pub fn commit_preview(&mut self) -> Result<bool, SessionError> {
        let Some(id) = self.ordered.get(self.nav.current_index()).cloned() else {
            return Ok(false);
        };
        match self.preview.commit(&id) {
            Some(label) => {
                self.labels.set(&self.scope, &id, label)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close the open item, discarding any uncommitted preview.
    pub fn close_item(&mut self) {
        self.preview.close();
    }

    /// Toggle the starred marker; returns the new state.
    pub fn toggle_star(&mut self, id: &VideoId) -> bool {
        if self.starred.remove(id) {
            false
        } else {
            self.starred.insert(id.clone());
            true
        }
    }

    pub fn is_starred(&self, id: &VideoId) -> bool {
        self.starred.contains(id)
    }

    /// Label counts for the labeling header.
    pub fn labeling_stats(&self) -> Result<LabelingStats, SessionError> {
        let labels = self.effective_labels()?;
        let yes = self
            .catalog
            .records()
            .iter()
            .filter(|record| labels.get(&record.id).is_some_and(|label| label.is_yes()))
            .count();
        let labeled = self
            .catalog
            .records()
            .iter()
            .filter(|record| labels.contains_key(&record.id))
            .count();
        Ok(LabelingStats {
            yes,
            labeled,
            total: self.catalog.len(),
        })
    }

    /// Drop every label in the active scope.
    pub fn clear_labels(&mut self) -> Result<(), SessionError> {
        tracing::info!(scope = %self.scope.storage_key(), "Clearing labels");
        self.labels.clear_scope(&self.scope.clone())?;
        Ok(())
    }

    /// Payload of yes-labeled canonical videos for the export collaborator.
    pub fn export_payload(&self) -> Result<ExportPayload, SessionError> {
        let exported_videos = self
            .labels
            .yes_labeled(&self.query)?
            .into_iter()
            .filter_map(|id| self.catalog.get(&id))
            .map(|record| ExportedVideo {
                id: record.id.clone(),
                title: record.title.clone(),
                source_ref: record.source_ref.clone(),
            })
            .collect();
        Ok(ExportPayload {
            query: self.query.clone(),
            folder: self.query.clone(),
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            exported_videos,
        })
    }

    /// Bookmark the item under the cursor.
    pub fn bookmark_current(
        &self,
        category: impl Into<String>,
        subconcept: impl Into<String>,
    ) -> Option<Bookmark> {
        let record = self.current_video()?;
        Some(
            Bookmark {
                category: category.into(),
                subconcept: subconcept.into(),
                query: self.query.clone(),
                video_id: record.id.clone(),
                video_title: record.title.clone(),
                video_index: self.nav.current_index(),
                current_page: self.nav.current_page(),
                view_mode: self.view_mode,
                saved_at: String::new(),
            }
            .saved_now(),
        )
    }

    /// Replay a bookmark's page/item target through the navigation machine.
    pub fn show_page_item(&mut self, page: usize, index: usize) -> NavOutcome {
        self.preview.close();
        self.nav.show_at(page, index)
    }

    /// Flush queued canonical writes when the outbox debounce has elapsed.
    pub fn sync_if_ready(&mut self, remote: &dyn RemoteLabelStore) -> Result<(), SessionError> {
        if self.labels.sync_ready() {
            self.labels.flush(remote, &self.query)?;
        }
        Ok(())
    }
}

/// Storage slug for a pool derived from its range name.
fn pool_slug(range_name: &str) -> String {
    range_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
