//! Dual-scope label persistence with merge-on-read and batched remote sync.
//!
//! Labels live in two namespaces: the canonical `query` scope, eligible for
//! remote sync, and per-pool scopes holding ephemeral sampling annotations
//! that never leave the local store. Ranking-context reads merge the two with
//! pool values winning, so sampling work sharpens rate estimates immediately
//! without polluting exported ground truth.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::VideoId;

pub mod remote;
pub mod sqlite;

pub use remote::{HttpLabelRemote, RemoteLabelStore, SyncError};
pub use sqlite::SqliteStore;

/// Reviewer judgement for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Yes,
    No,
}

impl Label {
    pub fn is_yes(self) -> bool {
        matches!(self, Label::Yes)
    }

    /// The opposite judgement.
    pub fn toggled(self) -> Self {
        match self {
            Label::Yes => Label::No,
            Label::No => Label::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Yes => "yes",
            Label::No => "no",
        }
    }

    /// Parse a persisted value; anything unrecognized reads as unlabeled.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Label::Yes),
            "no" => Some(Label::No),
            _ => None,
        }
    }
}

/// Labels keyed by video id. Absence means unlabeled; counting paths default
/// missing entries to [`Label::No`].
pub type LabelMap = HashMap<VideoId, Label>;

const QUERY_KEY_PREFIX: &str = "labels_";
const POOL_KEY_PREFIX: &str = "tpr_labels_";

/// Namespace partition of the label store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelScope {
    /// Canonical per-query labels, synced upstream.
    Query { query: String },
    /// Ephemeral annotations for one sampling pool of a query, local-only.
    Pool { query: String, pool: String },
}

impl LabelScope {
    pub fn query(query: impl Into<String>) -> Self {
        LabelScope::Query {
            query: query.into(),
        }
    }

    pub fn pool(query: impl Into<String>, pool: impl Into<String>) -> Self {
        LabelScope::Pool {
            query: query.into(),
            pool: pool.into(),
        }
    }

    /// Query this scope belongs to.
    pub fn query_name(&self) -> &str {
        match self {
            LabelScope::Query { query } | LabelScope::Pool { query, .. } => query,
        }
    }

    pub fn is_pool(&self) -> bool {
        matches!(self, LabelScope::Pool { .. })
    }

    /// Stable key the backend stores this scope under.
    pub fn storage_key(&self) -> String {
        match self {
            LabelScope::Query { query } => format!("{QUERY_KEY_PREFIX}{query}"),
            LabelScope::Pool { query, pool } => {
                format!("{POOL_KEY_PREFIX}{query}_pool_{pool}")
            }
        }
    }
}

/// Errors raised by the local label backend.
#[derive(Debug, Error)]
pub enum LabelStoreError {
    /// Label database query failed.
    #[error("Label database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Synchronous local persistence contract, scoped by string key.
pub trait LabelBackend {
    /// All labels stored under a scope key; malformed rows are skipped.
    fn scope_labels(&self, key: &str) -> Result<LabelMap, LabelStoreError>;
    /// Single label lookup.
    fn get_label(&self, key: &str, id: &VideoId) -> Result<Option<Label>, LabelStoreError>;
    /// Upsert one label.
    fn set_label(&self, key: &str, id: &VideoId, label: Label) -> Result<(), LabelStoreError>;
    /// Replace the whole scope with the given map.
    fn replace_scope(&self, key: &str, labels: &LabelMap) -> Result<(), LabelStoreError>;
    /// Drop every label under a scope key.
    fn clear_scope(&self, key: &str) -> Result<(), LabelStoreError>;
    /// Every scope key currently present.
    fn scope_keys(&self) -> Result<Vec<String>, LabelStoreError>;
}

/// Debounced, bounded queue of query-scope ids awaiting remote sync.
#[derive(Debug)]
struct SyncOutbox {
    pending: HashSet<VideoId>,
    last_change: Option<Instant>,
    debounce: Duration,
    capacity: usize,
}

impl SyncOutbox {
    fn new(debounce: Duration, capacity: usize) -> Self {
        Self {
            pending: HashSet::new(),
            last_change: None,
            debounce,
            capacity: capacity.max(1),
        }
    }

    fn note(&mut self, id: VideoId) {
        self.pending.insert(id);
        self.last_change = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        if self.pending.len() >= self.capacity {
            return true;
        }
        self.last_change
            .is_some_and(|changed| changed.elapsed() >= self.debounce)
    }

    fn drain(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        self.last_change = None;
        count
    }
}

/// Write-through label store over a local backend plus a sync outbox.
pub struct LabelStore {
    backend: Box<dyn LabelBackend>,
    outbox: SyncOutbox,
}

impl LabelStore {
    /// Default sync policy: flush after a 2s quiet period or 256 pending ids.
    pub fn new(backend: Box<dyn LabelBackend>) -> Self {
        Self::with_sync_policy(backend, Duration::from_secs(2), 256)
    }

    pub fn with_sync_policy(
        backend: Box<dyn LabelBackend>,
        debounce: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            backend,
            outbox: SyncOutbox::new(debounce, capacity),
        }
    }

    /// Committed label for one video in one scope.
    pub fn get(&self, scope: &LabelScope, id: &VideoId) -> Result<Option<Label>, LabelStoreError> {
        self.backend.get_label(&scope.storage_key(), id)
    }

    /// All labels of a single scope.
    pub fn scope_labels(&self, scope: &LabelScope) -> Result<LabelMap, LabelStoreError> {
        self.backend.scope_labels(&scope.storage_key())
    }

    /// Merged view for ranking-context reads: query-scope labels overlaid by
    /// every pool scope of the same query, pool values winning on conflict.
    pub fn merged_for_ranking(&self, query: &str) -> Result<LabelMap, LabelStoreError> {
        let mut merged = self
            .backend
            .scope_labels(&LabelScope::query(query).storage_key())?;
        let pool_prefix = format!("{POOL_KEY_PREFIX}{query}_pool_");
        for key in self.backend.scope_keys()? {
            if key.starts_with(&pool_prefix) {
                merged.extend(self.backend.scope_labels(&key)?);
            }
        }
        Ok(merged)
    }

    /// Write a label synchronously; query-scope writes also queue remote sync.
    pub fn set(
        &mut self,
        scope: &LabelScope,
        id: &VideoId,
        label: Label,
    ) -> Result<(), LabelStoreError> {
        self.backend.set_label(&scope.storage_key(), id, label)?;
        if !scope.is_pool() {
            self.outbox.note(id.clone());
        }
        Ok(())
    }

    /// Drop all labels in one scope.
    pub fn clear_scope(&mut self, scope: &LabelScope) -> Result<(), LabelStoreError> {
        self.backend.clear_scope(&scope.storage_key())
    }

    /// Replace the canonical query scope from the remote store.
    ///
    /// Awaited once at startup. A remote failure keeps the local copy and is
    /// never surfaced as a hard error.
    pub fn load_canonical(
        &mut self,
        remote: &dyn RemoteLabelStore,
        query: &str,
    ) -> Result<(), LabelStoreError> {
        match remote.load() {
            Ok(labels) => {
                tracing::info!(count = labels.len(), "Loaded canonical labels");
                self.backend
                    .replace_scope(&LabelScope::query(query).storage_key(), &labels)
            }
            Err(err) => {
                tracing::warn!("Canonical label load failed, using local copy: {err}");
                Ok(())
            }
        }
    }

    /// True when the outbox wants a flush.
    pub fn sync_ready(&self) -> bool {
        self.outbox.ready()
    }

    /// Number of ids queued for the next flush.
    pub fn pending_sync(&self) -> usize {
        self.outbox.pending.len()
    }

    /// Push the full query-scope map to the remote store.
    ///
    /// Fire-and-forget semantics: a failure is logged and the outbox drains
    /// anyway, degrading to local-only persistence without rollback.
    pub fn flush(
        &mut self,
        remote: &dyn RemoteLabelStore,
        query: &str,
    ) -> Result<(), LabelStoreError> {
        if self.outbox.pending.is_empty() {
            return Ok(());
        }
        let labels = self
            .backend
            .scope_labels(&LabelScope::query(query).storage_key())?;
        let queued = self.outbox.drain();
        match remote.store(&labels) {
            Ok(()) => tracing::debug!(queued, total = labels.len(), "Synced labels upstream"),
            Err(err) => tracing::warn!("Label sync failed, keeping local copy only: {err}"),
        }
        Ok(())
    }

    /// Ids labeled yes in the canonical scope, for the export collaborator.
    pub fn yes_labeled(&self, query: &str) -> Result<Vec<VideoId>, LabelStoreError> {
        let labels = self.scope_labels(&LabelScope::query(query))?;
        let mut ids: Vec<VideoId> = labels
            .into_iter()
            .filter_map(|(id, label)| label.is_yes().then_some(id))
            .collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}
