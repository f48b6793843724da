//! Single restorable bookmark into the navigation/selection state.
//!
//! One process-wide slot, overwritten by each new bookmark. Restoring never
//! injects state directly; it yields the ordered selection steps the host
//! replays through its normal transitions, so pagination totals and the
//! ordered list are rebuilt consistently before the target item is located.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::catalog::VideoId;
use crate::labels::LabelStoreError;
use crate::session::ViewMode;

/// Errors from the bookmark persistence backend.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error(transparent)]
    Store(#[from] LabelStoreError),
    /// The bookmark could not be encoded for storage.
    #[error("Failed to encode bookmark: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Saved pointer to a prior navigational position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub category: String,
    pub subconcept: String,
    pub query: String,
    pub video_id: VideoId,
    pub video_title: String,
    /// 0-based index into the ordered list at save time.
    pub video_index: usize,
    /// 1-based page at save time.
    pub current_page: usize,
    pub view_mode: ViewMode,
    /// RFC 3339 save timestamp.
    pub saved_at: String,
}

impl Bookmark {
    /// Stamp the bookmark with the current UTC time.
    pub fn saved_now(mut self) -> Self {
        self.saved_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        self
    }
}

/// Persistence contract for the single bookmark slot.
pub trait BookmarkBackend {
    fn read(&self) -> Result<Option<Bookmark>, BookmarkError>;
    fn write(&self, bookmark: &Bookmark) -> Result<(), BookmarkError>;
    fn clear(&self) -> Result<(), BookmarkError>;
}

/// One step of a bookmark restore, replayed by the host in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionStep {
    SelectSubconcept { category: String, subconcept: String },
    SelectQuery { query: String },
    SwitchViewMode(ViewMode),
    /// Navigate to the page and target the saved item on it.
    ShowPageItem { page: usize, index: usize },
    /// Highlight-and-scroll presentation hook for the located item.
    HighlightVideo(VideoId),
}

/// The overwritable bookmark slot.
pub struct BookmarkSlot {
    backend: Box<dyn BookmarkBackend>,
}

impl BookmarkSlot {
    pub fn new(backend: Box<dyn BookmarkBackend>) -> Self {
        Self { backend }
    }

    /// Current bookmark, if one is saved.
    pub fn current(&self) -> Result<Option<Bookmark>, BookmarkError> {
        self.backend.read()
    }

    /// Replace any prior bookmark with this one.
    pub fn set(&self, bookmark: &Bookmark) -> Result<(), BookmarkError> {
        self.backend.write(bookmark)?;
        tracing::debug!(video = %bookmark.video_id, page = bookmark.current_page, "Bookmark saved");
        Ok(())
    }

    /// Remove the saved bookmark.
    pub fn clear(&self) -> Result<(), BookmarkError> {
        self.backend.clear()
    }

    /// True when the given video is the bookmarked one.
    pub fn is_bookmarked(&self, id: &VideoId) -> Result<bool, BookmarkError> {
        Ok(self
            .current()?
            .is_some_and(|bookmark| bookmark.video_id == *id))
    }
}

/// Ordered selection steps that re-drive the host to a bookmark's position.
pub fn resolve(bookmark: &Bookmark) -> Vec<SelectionStep> {
    vec![
        SelectionStep::SelectSubconcept {
            category: bookmark.category.clone(),
            subconcept: bookmark.subconcept.clone(),
        },
        SelectionStep::SelectQuery {
            query: bookmark.query.clone(),
        },
        SelectionStep::SwitchViewMode(bookmark.view_mode),
        SelectionStep::ShowPageItem {
            page: bookmark.current_page,
            index: bookmark.video_index,
        },
        SelectionStep::HighlightVideo(bookmark.video_id.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::SqliteStore;
    use tempfile::tempdir;

    fn sample_bookmark() -> Bookmark {
        Bookmark {
            category: "Camera Angle".into(),
            subconcept: "Level Angle".into(),
            query: "level_angle".into(),
            video_id: VideoId::new("v42"),
            video_title: "Level Angle Shot".into(),
            video_index: 107,
            current_page: 2,
            view_mode: ViewMode::Labeling,
            saved_at: String::new(),
        }
        .saved_now()
    }

    #[test]
    fn slot_overwrites_instead_of_appending() {
        let dir = tempdir().unwrap();
        let slot = BookmarkSlot::new(Box::new(SqliteStore::open(dir.path()).unwrap()));
        assert!(slot.current().unwrap().is_none());

        let first = sample_bookmark();
        slot.set(&first).unwrap();
        let mut second = sample_bookmark();
        second.video_id = VideoId::new("v99");
        slot.set(&second).unwrap();

        let stored = slot.current().unwrap().unwrap();
        assert_eq!(stored.video_id, VideoId::new("v99"));
        assert!(slot.is_bookmarked(&VideoId::new("v99")).unwrap());
        assert!(!slot.is_bookmarked(&VideoId::new("v42")).unwrap());
    }

    #[test]
    fn clear_empties_the_slot() {
        let dir = tempdir().unwrap();
        let slot = BookmarkSlot::new(Box::new(SqliteStore::open(dir.path()).unwrap()));
        slot.set(&sample_bookmark()).unwrap();
        slot.clear().unwrap();
        assert!(slot.current().unwrap().is_none());
    }

    #[test]
    fn resolve_replays_selection_in_order() {
        let bookmark = sample_bookmark();
        let steps = resolve(&bookmark);
        assert_eq!(steps.len(), 5);
        assert!(matches!(steps[0], SelectionStep::SelectSubconcept { .. }));
        assert!(matches!(steps[1], SelectionStep::SelectQuery { .. }));
        assert_eq!(
            steps[2],
            SelectionStep::SwitchViewMode(ViewMode::Labeling)
        );
        assert_eq!(
            steps[3],
            SelectionStep::ShowPageItem {
                page: 2,
                index: 107
            }
        );
        assert_eq!(
            steps[4],
            SelectionStep::HighlightVideo(VideoId::new("v42"))
        );
    }

    #[test]
    fn saved_timestamp_is_rfc3339() {
        let bookmark = sample_bookmark();
        assert!(OffsetDateTime::parse(&bookmark.saved_at, &Rfc3339).is_ok());
    }
}
