//! The category manager.
//!
//! A [`Dashboard`] owns the four categories of the taxonomy and routes uploads
//! and edits to them. Uploads go through a guard: [`Dashboard::begin_upload`]
//! hands out a ticket for a category, and no second upload into that category
//! can start until the ticket is committed or aborted.

use std::collections::{BTreeMap, BTreeSet};

use dash_ingest::{SkippedFile, SourceFile, parse_batch};
use dash_model::{CategoryKey, RowId, SortDirection};
use serde::{Deserialize, Serialize};

use crate::aggregate::AverageRule;
use crate::category::{Category, CategorySnapshot};
use crate::config::DashConfig;
use crate::error::{EngineError, Result};
use crate::view::CategoryView;

/// How an upload combines with the rows already in a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Drop the current dataset and start over from the upload.
    #[default]
    Replace,
    /// Add rows under the existing header.
    Append,
}

impl std::fmt::Display for IngestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Append => f.write_str("append"),
        }
    }
}

/// Permission to commit one upload into one category.
///
/// Not `Clone`: a ticket is consumed by [`Dashboard::commit_upload`] or
/// [`Dashboard::abort_upload`].
#[derive(Debug, PartialEq, Eq)]
pub struct UploadTicket {
    category: CategoryKey,
}

impl UploadTicket {
    pub fn category(&self) -> CategoryKey {
        self.category
    }
}

/// What happened to an upload.
#[derive(Debug)]
pub struct IngestReport {
    pub category: CategoryKey,
    pub mode: IngestMode,
    /// Files whose rows were part of the batch, in upload order.
    pub accepted: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub rows_added: usize,
    /// Set when the whole batch was refused by the category.
    pub rejection: Option<EngineError>,
}

impl IngestReport {
    /// True when the batch changed the category.
    pub fn committed(&self) -> bool {
        self.rejection.is_none() && !self.accepted.is_empty()
    }
}

/// Persisted shape of the whole dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub categories: BTreeMap<CategoryKey, CategorySnapshot>,
}

/// All categories plus the configuration that shapes their derived views.
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashConfig,
    average_rule: AverageRule,
    categories: BTreeMap<CategoryKey, Category>,
    pending_uploads: BTreeSet<CategoryKey>,
    revision: u64,
    saved_revision: u64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DashConfig::default())
    }
}

impl Dashboard {
    /// Creates a dashboard with four empty categories.
    pub fn new(config: DashConfig) -> Self {
        let categories = CategoryKey::ALL
            .into_iter()
            .map(|key| (key, Category::new(key, config.classify)))
            .collect();
        Self {
            average_rule: config.average_rule(),
            config,
            categories,
            pending_uploads: BTreeSet::new(),
            revision: 0,
            saved_revision: 0,
        }
    }

    /// Creates a dashboard and overlays the categories present in `snapshot`.
    pub fn from_snapshot(config: DashConfig, snapshot: DashboardSnapshot) -> Self {
        let mut dashboard = Self::new(config);
        for (key, category) in snapshot.categories {
            dashboard.restore_category(key, category);
        }
        dashboard.mark_saved();
        dashboard
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            categories: self
                .categories
                .iter()
                .map(|(key, category)| (*key, category.snapshot()))
                .collect(),
        }
    }

    pub fn config(&self) -> &DashConfig {
        &self.config
    }

    pub fn category(&self, key: CategoryKey) -> &Category {
        &self.categories[&key]
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Derived view of one category, computed now.
    pub fn view(&self, key: CategoryKey) -> CategoryView {
        CategoryView::build(
            self.category(key),
            &self.average_rule,
            &self.config.total_label,
        )
    }

    pub fn views(&self) -> Vec<CategoryView> {
        CategoryKey::ALL.into_iter().map(|key| self.view(key)).collect()
    }

    /// True when there are changes not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_saved(&mut self) {
        self.saved_revision = self.revision;
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn category_mut(&mut self, key: CategoryKey) -> &mut Category {
        // Every key is inserted by `new` and never removed.
        self.categories
            .entry(key)
            .or_insert_with(|| Category::new(key, self.config.classify))
    }

    /// Replaces one category wholesale from a persisted or imported snapshot.
    pub(crate) fn restore_category(&mut self, key: CategoryKey, snapshot: CategorySnapshot) {
        let category = Category::from_snapshot(key, snapshot, self.config.classify);
        self.categories.insert(key, category);
        self.touch();
    }

    /// Swaps in a freshly read snapshot. Pending uploads carry over and the
    /// revision keeps counting up.
    pub(crate) fn reload(&mut self, snapshot: DashboardSnapshot) {
        let mut fresh = Self::from_snapshot(self.config.clone(), snapshot);
        fresh.pending_uploads = std::mem::take(&mut self.pending_uploads);
        fresh.revision = self.revision;
        fresh.saved_revision = self.revision;
        *self = fresh;
    }

    // === Uploads ===

    /// Reserves `key` for one upload.
    pub fn begin_upload(&mut self, key: CategoryKey) -> Result<UploadTicket> {
        if !self.pending_uploads.insert(key) {
            return Err(EngineError::UploadInFlight { category: key });
        }
        tracing::debug!(category = %key, "upload started");
        Ok(UploadTicket { category: key })
    }

    /// Releases a reservation without touching the category.
    pub fn abort_upload(&mut self, ticket: UploadTicket) {
        self.pending_uploads.remove(&ticket.category);
        tracing::debug!(category = %ticket.category, "upload aborted");
    }

    pub fn upload_pending(&self, key: CategoryKey) -> bool {
        self.pending_uploads.contains(&key)
    }

    /// Parses `files` and commits the batch to the ticket's category.
    ///
    /// The batch is merged completely before the category is touched, so a bad
    /// file never leaves the category half-updated. When no file yields a
    /// header the category is left alone, even in replace mode.
    pub fn commit_upload(
        &mut self,
        ticket: UploadTicket,
        files: &[SourceFile],
        mode: IngestMode,
    ) -> IngestReport {
        let key = ticket.category;
        self.pending_uploads.remove(&key);

        let batch = parse_batch(files);
        let title = batch.first_title(files).map(str::to_string);
        let mut report = IngestReport {
            category: key,
            mode,
            accepted: Vec::new(),
            skipped: Vec::new(),
            rows_added: 0,
            rejection: None,
        };
        if !batch.has_content() {
            tracing::warn!(category = %key, files = files.len(), "upload contained no usable CSV");
            report.skipped = batch.skipped;
            return report;
        }

        let category = self.category_mut(key);
        let outcome = match mode {
            IngestMode::Replace => {
                Ok(category.replace_rows(batch.header, batch.records, title.as_deref()))
            }
            IngestMode::Append => {
                category.append_rows(&batch.header, batch.records, title.as_deref())
            }
        };
        report.skipped = batch.skipped;
        match outcome {
            Ok(added) => {
                report.accepted = batch.accepted;
                report.rows_added = added;
                tracing::info!(
                    category = %key,
                    %mode,
                    files = report.accepted.len(),
                    rows = added,
                    "committed upload"
                );
                self.touch();
            }
            Err(err) => {
                tracing::warn!(category = %key, %mode, error = %err, "rejected upload");
                report.rejection = Some(err);
            }
        }
        report
    }

    /// Begins and commits an upload in one step.
    pub fn ingest(
        &mut self,
        key: CategoryKey,
        files: &[SourceFile],
        mode: IngestMode,
    ) -> Result<IngestReport> {
        let ticket = self.begin_upload(key)?;
        Ok(self.commit_upload(ticket, files, mode))
    }

    // === Edits ===

    /// Sorts a category by `column`; see [`crate::sort`] for the ordering.
    pub fn sort(&mut self, key: CategoryKey, column: &str) -> Result<SortDirection> {
        let direction = self.category_mut(key).sort_by(column)?;
        self.touch();
        Ok(direction)
    }

    /// Returns false when the row does not exist.
    pub fn set_row_selected(&mut self, key: CategoryKey, id: RowId, selected: bool) -> bool {
        let changed = self.category_mut(key).set_row_selected(id, selected);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn set_all_selected(&mut self, key: CategoryKey, selected: bool) {
        self.category_mut(key).set_all_selected(selected);
        self.touch();
    }

    /// Returns false when the row does not exist.
    pub fn remove_row(&mut self, key: CategoryKey, id: RowId) -> bool {
        let removed = self.category_mut(key).remove_row(id);
        if removed {
            tracing::debug!(category = %key, row = %id, "removed row");
            self.touch();
        }
        removed
    }

    pub fn clear(&mut self, key: CategoryKey) {
        self.category_mut(key).clear();
        tracing::info!(category = %key, "cleared category");
        self.touch();
    }

    pub fn set_metric_column(&mut self, key: CategoryKey, column: Option<&str>) -> Result<()> {
        self.category_mut(key).set_metric_column(column)?;
        self.touch();
        Ok(())
    }

    pub fn set_column_visibility(
        &mut self,
        key: CategoryKey,
        column: &str,
        visible: bool,
    ) -> Result<()> {
        self.category_mut(key).set_column_visible(column, visible)?;
        self.touch();
        Ok(())
    }

    pub fn set_title(&mut self, key: CategoryKey, title: &str) {
        self.category_mut(key).set_dataset_title(title);
        self.touch();
    }

    pub fn set_notes(&mut self, key: CategoryKey, notes: &str) {
        self.category_mut(key).set_notes(notes);
        self.touch();
    }

    pub fn set_include_in_pdf(&mut self, key: CategoryKey, include: bool) {
        self.category_mut(key).set_include_in_pdf(include);
        self.touch();
    }
}
