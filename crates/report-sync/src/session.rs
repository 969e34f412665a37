//! Editing session for one open report.
//!
//! An [`EditorSession`] owns the in-memory document, routes edits on
//! read-only reports into [`ShadowEdits`], debounces autosave and applies
//! realtime updates pushed by other writers.
//!
//! Lifecycle: [`EditorSession::open`] loads the report and subscribes
//! (Idle to Subscribed); [`EditorSession::close`] or opening another report
//! unsubscribes and drops any pending save.
//!
//! Autosave compares a [`Fingerprint`] of the live document with the one
//! taken at the last save or remote update. Every local edit restarts the
//! delay window; when it expires and the fingerprints differ, the document
//! is saved. Remote updates replace the fingerprint, so they never echo
//! back as a save.

use std::future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use report_core::convert::ViewType;
use report_core::{
    Block, BlockId, BlockKind, DEFAULT_TIME_PERIOD, Document, Filters, Intent, ReportId,
    ShadowEdits, document, intent, metrics,
};
use report_store::{PgReportStore, PrimaryStore, ReportStore, ReportSubscription};

use crate::error::{SyncError, SyncResult};
use crate::fingerprint::Fingerprint;

/// Quiet period after the last edit before autosave runs.
pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(2);

/// Realtime state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No report open, or no realtime feed.
    Idle,
    /// Receiving updates for the open report.
    Subscribed,
}

/// What [`EditorSession::next_event`] handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A remote update replaced the open document.
    RemoteApplied,
    /// The autosave window expired. `persisted` is false if the save failed
    /// on every tier; the changes stay pending for the next save.
    Saved { persisted: bool },
    /// The realtime feed ended.
    SubscriptionClosed,
}

enum Wake {
    Remote(Option<Document>),
    Deadline,
}

/// One user's view of one report.
#[derive(Debug)]
pub struct EditorSession<P: PrimaryStore = PgReportStore> {
    store: ReportStore<P>,
    document: Option<Document>,
    shadow: ShadowEdits,
    subscription: Option<ReportSubscription>,
    saved: Option<Fingerprint>,
    save_deadline: Option<Instant>,
    autosave_delay: Duration,
}

impl<P: PrimaryStore> EditorSession<P> {
    pub fn new(store: ReportStore<P>) -> Self {
        Self::with_autosave_delay(store, AUTOSAVE_DELAY)
    }

    pub fn with_autosave_delay(store: ReportStore<P>, autosave_delay: Duration) -> Self {
        Self {
            store,
            document: None,
            shadow: ShadowEdits::new(),
            subscription: None,
            saved: None,
            save_deadline: None,
            autosave_delay,
        }
    }

    pub fn store(&self) -> &ReportStore<P> {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        if self.subscription.is_some() {
            SessionState::Subscribed
        } else {
            SessionState::Idle
        }
    }

    /// The open document, as edited so far.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn shadow(&self) -> &ShadowEdits {
        &self.shadow
    }

    /// True when the document differs from what was last saved or received.
    pub fn is_dirty(&self) -> bool {
        match &self.document {
            Some(doc) => self.saved != Some(Fingerprint::of(doc)),
            None => false,
        }
    }

    pub fn has_pending_save(&self) -> bool {
        self.save_deadline.is_some()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Opens report `id`, closing any report opened before.
    ///
    /// Reloading the same id starts a fresh viewing session: shadow edits
    /// are dropped.
    pub async fn open(&mut self, id: &ReportId) -> SyncResult<&Document> {
        self.close();

        let doc = self
            .store
            .load(id)
            .await
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;

        self.saved = Some(Fingerprint::of(&doc));
        self.subscription = self.store.subscribe(id);
        tracing::info!(
            report_id = %id,
            read_only = doc.is_read_only(),
            realtime = self.subscription.is_some(),
            "Opened report"
        );
        Ok(&*self.document.insert(doc))
    }

    /// Closes the open report. Pending saves are dropped, not flushed.
    pub fn close(&mut self) {
        self.store.unsubscribe(self.subscription.take());
        self.save_deadline = None;
        self.shadow.reset();
        self.saved = None;
        if let Some(doc) = self.document.take() {
            tracing::debug!(report_id = %doc.id, "Closed report");
        }
    }

    // ------------------------------------------------------------------------
    // Block edits
    // ------------------------------------------------------------------------

    fn doc_mut(&mut self) -> SyncResult<&mut Document> {
        self.document.as_mut().ok_or(SyncError::NoDocument)
    }

    fn doc(&self) -> SyncResult<&Document> {
        self.document.as_ref().ok_or(SyncError::NoDocument)
    }

    /// Replaces a block by full value.
    ///
    /// On a read-only report the edit is shadowed and never saved. On an
    /// editable report a text block whose content gains a `---` line is
    /// split around a new separator.
    pub fn update_block(&mut self, block: Block) -> SyncResult<bool> {
        let doc = self.document.as_mut().ok_or(SyncError::NoDocument)?;
        if doc.is_read_only() {
            return Ok(self.shadow.apply_edit(doc, block));
        }

        let id = block.id().clone();
        if !document::update(doc, block) {
            return Ok(false);
        }
        if let Some((separator, _)) = document::apply_separator_marker(doc, &id) {
            tracing::debug!(block_id = %id, separator = %separator, "Split text block at separator marker");
        }
        self.schedule_autosave();
        Ok(true)
    }

    /// Restores a shadow-edited block to its original value.
    pub fn revert_block(&mut self, id: &BlockId) -> SyncResult<bool> {
        let doc = self.document.as_mut().ok_or(SyncError::NoDocument)?;
        Ok(self.shadow.revert(doc, id))
    }

    /// Inserts a placeholder block of `kind` at `index`.
    pub fn insert_block<R: Rng + ?Sized>(
        &mut self,
        kind: BlockKind,
        index: usize,
        rng: &mut R,
    ) -> SyncResult<Option<BlockId>> {
        let inserted = document::insert(self.doc_mut()?, kind, index, rng);
        if inserted.is_some() {
            self.schedule_autosave();
        }
        Ok(inserted)
    }

    pub fn delete_block(&mut self, id: &BlockId) -> SyncResult<bool> {
        let deleted = document::delete(self.doc_mut()?, id);
        if deleted {
            self.schedule_autosave();
        }
        Ok(deleted)
    }

    /// Moves the block at `from` to `to`. `None` is a cancelled drag.
    pub fn move_block(&mut self, from: usize, to: Option<usize>) -> SyncResult<bool> {
        let moved = document::reorder(self.doc_mut()?, from, to);
        if moved {
            self.schedule_autosave();
        }
        Ok(moved)
    }

    /// Inserts a separator and an empty text block after block `id`.
    pub fn split_block(&mut self, id: &BlockId) -> SyncResult<Option<(BlockId, BlockId)>> {
        let ids = document::insert_separator_and_split(self.doc_mut()?, id);
        if ids.is_some() {
            self.schedule_autosave();
        }
        Ok(ids)
    }

    pub fn convert_block(&mut self, id: &BlockId, to: ViewType) -> SyncResult<bool> {
        let converted = document::convert(self.doc_mut()?, id, to)?;
        if converted {
            self.schedule_autosave();
        }
        Ok(converted)
    }

    /// Rewrites one data block through `edit` and routes the result through
    /// [`Self::update_block`], so read-only reports shadow it.
    fn edit_block(
        &mut self,
        id: &BlockId,
        edit: impl FnOnce(&Block) -> Option<Block>,
    ) -> SyncResult<bool> {
        let block = document::find(self.doc()?, id)
            .ok_or_else(|| report_core::CoreError::BlockNotFound(id.clone()))?;
        match edit(block) {
            Some(edited) => self.update_block(edited),
            None => Ok(false),
        }
    }

    pub fn add_metric(&mut self, id: &BlockId) -> SyncResult<bool> {
        self.edit_block(id, metrics::add_metric)
    }

    pub fn remove_metric(&mut self, id: &BlockId, index: usize) -> SyncResult<bool> {
        self.edit_block(id, |block| metrics::remove_metric(block, index))
    }

    pub fn add_dimension(&mut self, id: &BlockId) -> SyncResult<bool> {
        self.edit_block(id, metrics::add_dimension)
    }

    pub fn remove_dimension(&mut self, id: &BlockId, index: usize) -> SyncResult<bool> {
        self.edit_block(id, |block| metrics::remove_dimension(block, index))
    }

    /// Applies an extracted intent to a data block.
    pub fn apply_intent(&mut self, id: &BlockId, wanted: &Intent) -> SyncResult<bool> {
        self.edit_block(id, |block| intent::apply_intent(block, wanted))
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    fn edit_metadata(&mut self, edit: impl FnOnce(&mut Document)) -> SyncResult<()> {
        edit(self.doc_mut()?);
        self.schedule_autosave();
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> SyncResult<()> {
        let title = title.into();
        self.edit_metadata(|doc| doc.title = title)
    }

    /// Stores the time period. It does not change what blocks display.
    pub fn set_time_period(&mut self, period: impl Into<String>) -> SyncResult<()> {
        let period = period.into();
        self.edit_metadata(|doc| doc.filters.time_period = period)
    }

    pub fn set_selected_dimensions(&mut self, dimensions: Vec<String>) -> SyncResult<()> {
        self.edit_metadata(|doc| doc.filters.selected_dimensions = dimensions)
    }

    /// Back to "Last 4 weeks" with no dimension filter.
    pub fn reset_filters(&mut self) -> SyncResult<()> {
        self.edit_metadata(|doc| {
            doc.filters = Filters {
                time_period: DEFAULT_TIME_PERIOD.to_string(),
                selected_dimensions: Vec::new(),
            };
        })
    }

    /// Flips the favorite flag. Editable reports are saved right away.
    ///
    /// Returns the new flag.
    pub async fn toggle_favorite(&mut self) -> SyncResult<bool> {
        let doc = self.doc_mut()?;
        doc.favorite = !doc.favorite;
        let favorite = doc.favorite;
        if !doc.is_read_only() {
            self.flush().await;
        }
        Ok(favorite)
    }

    // ------------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------------

    fn schedule_autosave(&mut self) {
        let editable = self.document.as_ref().is_some_and(|doc| !doc.is_read_only());
        self.save_deadline = if editable && self.is_dirty() {
            Some(Instant::now() + self.autosave_delay)
        } else {
            None
        };
    }

    /// Saves now if there are unsaved changes. Cancels any pending autosave.
    ///
    /// Returns false only when a save was needed and failed everywhere.
    /// Read-only reports are never saved.
    pub async fn flush(&mut self) -> bool {
        self.save_deadline = None;
        let Some(doc) = self.document.as_ref() else {
            return true;
        };
        if doc.is_read_only() {
            return true;
        }
        let current = Fingerprint::of(doc);
        if self.saved == Some(current) {
            return true;
        }

        if self.store.save(doc).await {
            self.saved = Some(current);
            tracing::debug!(report_id = %doc.id, "Autosaved report");
            true
        } else {
            tracing::warn!(report_id = %doc.id, "Autosave failed; changes remain unsaved");
            false
        }
    }

    // ------------------------------------------------------------------------
    // Realtime
    // ------------------------------------------------------------------------

    /// Applies a remote update of the open report.
    ///
    /// Updates for another report are ignored. Otherwise blocks, title,
    /// filters and the favorite flag are overwritten, shadow edits are
    /// dropped and the pending save is cancelled: the remote state is the
    /// saved state now.
    pub fn apply_remote(&mut self, update: Document) -> bool {
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        if doc.id != update.id {
            tracing::debug!(open = %doc.id, update = %update.id, "Ignoring update for another report");
            return false;
        }

        let update = update.migrated();
        doc.blocks = update.blocks;
        doc.title = update.title;
        doc.filters = update.filters;
        doc.favorite = update.favorite;
        doc.updated_at = update.updated_at;

        self.shadow.reset();
        self.saved = Some(Fingerprint::of(doc));
        self.save_deadline = None;
        tracing::info!(report_id = %doc.id, "Applied remote update");
        true
    }

    /// Waits for the next autosave deadline or remote update and handles it.
    ///
    /// Never resolves while there is neither a pending save nor a realtime
    /// feed, so drive it from a `select!` alongside other inputs.
    pub async fn next_event(&mut self) -> SessionEvent {
        loop {
            let wake = tokio::select! {
                update = next_update(self.subscription.as_mut()) => Wake::Remote(update),
                () = wait_until(self.save_deadline) => Wake::Deadline,
            };

            match wake {
                Wake::Remote(Some(update)) => {
                    if self.apply_remote(update) {
                        return SessionEvent::RemoteApplied;
                    }
                }
                Wake::Remote(None) => {
                    if let Some(subscription) = self.subscription.take() {
                        tracing::warn!(report_id = %subscription.report_id(), "Realtime feed closed");
                    }
                    return SessionEvent::SubscriptionClosed;
                }
                Wake::Deadline => {
                    let persisted = self.flush().await;
                    return SessionEvent::Saved { persisted };
                }
            }
        }
    }
}

async fn next_update(subscription: Option<&mut ReportSubscription>) -> Option<Document> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
