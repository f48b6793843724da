//! Core engine for reviewing ranked video candidates against a search query.
//!
//! The crate keeps the statistical and stateful pieces pure and testable so a
//! host UI can stay thin: deterministic range sampling, true-positive-rate
//! estimation, pagination-aware navigation, preview/commit labeling, and a
//! dual-scope label store with merge-on-read semantics.
/// Application directory helpers.
pub mod app_dirs;
/// Single restorable bookmark slot.
pub mod bookmark;
/// Video records and filename-based resolution.
pub mod catalog;
/// Persisted review settings.
pub mod config;
/// TPR and top-N true-positive estimation.
pub mod estimate;
pub(crate) mod http_client;
/// Dual-scope label persistence and remote sync.
pub mod labels;
/// Tracing setup.
pub mod logging;
/// Pagination-aware navigation state machine.
pub mod navigation;
/// Preview/commit labeling protocol.
pub mod preview;
/// Ranking entries and rank ranges.
pub mod ranking;
/// Deterministic range sampling.
pub mod sampler;
/// Review session glue over the core components.
pub mod session;
