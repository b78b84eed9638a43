//! Bounded report log.

use std::path::PathBuf;

use tracing::debug;

use veracity_protocols::error::StoreError;
use veracity_protocols::report::SavedReport;

/// Newest-first report log persisted as a single JSON file, capped at a
/// fixed number of entries (oldest evicted).
///
/// Saves are read-modify-write and not atomic: concurrent writers could
/// race. Acceptable under the single-active-panel assumption; this is a
/// constraint, not a guarantee to rely on.
pub struct ReportStore {
    path: PathBuf,
    max_reports: usize,
}

impl ReportStore {
    pub fn new(path: PathBuf, max_reports: usize) -> Self {
        Self { path, max_reports }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Prepend a report, evicting beyond the cap.
    pub async fn save(&self, report: SavedReport) -> Result<(), StoreError> {
        let mut reports = self.list().await?;
        reports.insert(0, report);
        reports.truncate(self.max_reports);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&reports)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("saved report log ({} entries) to {:?}", reports.len(), self.path);
        Ok(())
    }

    /// All reports, newest first. A missing file is an empty log.
    pub async fn list(&self) -> Result<Vec<SavedReport>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = tokio::fs::read_to_string(&self.path).await?;
        let reports: Vec<SavedReport> = serde_json::from_str(&json)?;
        Ok(reports)
    }

    /// Drop the whole log.
    pub async fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await?;
            debug!("cleared report log at {:?}", self.path);
        }
        Ok(())
    }
}
