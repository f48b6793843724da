//! Preview/commit labeling protocol.
//!
//! While an item is open for review its label is only tentative: one action
//! flips the preview, a separate action confirms it. Closing or navigating
//! away discards the preview, so a stray toggle can never overwrite prior
//! ground truth.

use crate::catalog::VideoId;
use crate::labels::Label;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenItem {
    id: VideoId,
    preview: Label,
    has_pending_change: bool,
}

/// Ephemeral labeling buffer for the item currently open for review.
///
/// At most one item is open at a time; opening another item replaces the
/// buffer without persisting anything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreviewState {
    open: Option<OpenItem>,
}

impl PreviewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an item for review, discarding any prior preview.
    ///
    /// The preview always starts at `no`. When the item has no committed
    /// label yet, even that default counts as a change needing confirmation.
    pub fn open(&mut self, id: VideoId, committed: Option<Label>) {
        self.open = Some(OpenItem {
            id,
            preview: Label::No,
            has_pending_change: committed.is_none(),
        });
    }

    /// Id of the currently open item, if any.
    pub fn open_item(&self) -> Option<&VideoId> {
        self.open.as_ref().map(|item| &item.id)
    }

    /// Tentative label shown for the open item.
    pub fn preview_label(&self, id: &VideoId) -> Option<Label> {
        self.item(id).map(|item| item.preview)
    }

    /// True when the open item carries an unconfirmed change.
    pub fn has_pending_change(&self, id: &VideoId) -> bool {
        self.item(id).is_some_and(|item| item.has_pending_change)
    }

    /// Flip the preview label of the open item.
    pub fn toggle(&mut self, id: &VideoId) -> Option<Label> {
        let item = self.item_mut(id)?;
        item.preview = item.preview.toggled();
        item.has_pending_change = true;
        Some(item.preview)
    }

    /// Confirm the preview, returning the label the caller must persist.
    ///
    /// Rejected as a no-op unless the item is open with a pending change.
    /// On success the buffer is cleared.
    pub fn commit(&mut self, id: &VideoId) -> Option<Label> {
        let pending = self.item(id)?.has_pending_change;
        if !pending {
            return None;
        }
        let item = self.open.take()?;
        Some(item.preview)
    }

    /// Discard the preview without persisting.
    pub fn close(&mut self) {
        self.open = None;
    }

    fn item(&self, id: &VideoId) -> Option<&OpenItem> {
        self.open.as_ref().filter(|item| item.id == *id)
    }

    fn item_mut(&mut self, id: &VideoId) -> Option<&mut OpenItem> {
        self.open.as_mut().filter(|item| item.id == *id)
    }
}
