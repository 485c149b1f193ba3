// Import runner
//
// Drives a multi-file import: hpdb.cfg plus the sorted s_*.hpd system
// files for the HPDB schema, f_list.cfg plus one f_*.hpd per list for
// favorites. Runs as a long foreground loop suitable for a background
// task: progress is reported through a file-granularity callback and
// cancellation is cooperative, checked between files only. A cancelled
// run returns its summary with already-upserted entities intact; re-running
// afterwards is safe because every entity write is an upsert.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ImportError;
use crate::favorites::builder::FavoritesParser;
use crate::favorites::model::FavoritesList;
use crate::hpdb::builder::HpdbParser;
use crate::hpdb::model::HpdbDatabase;
use crate::record::report::FileReport;
use crate::record::store::StructuredRecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStage {
    Config,
    Systems,
    FavoritesIndex,
    FavoritesFiles,
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Config => "config",
            ImportStage::Systems => "systems",
            ImportStage::FavoritesIndex => "favorites_index",
            ImportStage::FavoritesFiles => "favorites_files",
        }
    }
}

/// One progress tick, emitted per file (not per line, to keep the hook
/// cheap for poll-based progress stores).
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub stage: ImportStage,
    pub current_file: String,
    pub processed_files: usize,
    pub total_files: usize,
}

pub type ProgressCallback = Box<dyn FnMut(&ProgressUpdate)>;

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse at most this many system files (diagnostic runs).
    pub limit: Option<usize>,
}

/// Result of a full import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub files_processed: usize,
    pub files: Vec<FileReport>,
}

impl ImportSummary {
    /// Aggregate created-entity counts across all file reports.
    pub fn created_counts(&self) -> std::collections::BTreeMap<String, u64> {
        let mut totals = std::collections::BTreeMap::new();
        for file in &self.files {
            for (kind, count) in &file.created_counts {
                *totals.entry(kind.clone()).or_insert(0) += count;
            }
        }
        totals
    }
}

pub struct ImportRunner {
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl Default for ImportRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportRunner {
    pub fn new() -> Self {
        Self { cancel: Arc::new(AtomicBool::new(false)), progress: None }
    }

    /// Shared flag a controlling thread can set to stop the run at the
    /// next file boundary.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn set_progress(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn report_progress(&mut self, stage: ImportStage, file: &str, processed: usize, total: usize) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&ProgressUpdate {
                stage,
                current_file: file.to_string(),
                processed_files: processed,
                total_files: total,
            });
        }
    }

    /// Import an HPDB directory: hpdb.cfg, then every s_*.hpd in sorted
    /// order. Only I/O failures abort; content problems end up in the
    /// per-file reports.
    pub fn run_hpdb_directory(
        &mut self,
        directory: &Path,
        db: &mut HpdbDatabase,
        store: &mut StructuredRecordStore,
        options: &ImportOptions,
    ) -> Result<ImportSummary, ImportError> {
        let started_at = Utc::now();
        let mut files = Vec::new();
        let mut cancelled = false;

        let config_path = directory.join("hpdb.cfg");
        if !config_path.exists() {
            return Err(ImportError::MissingConfig(config_path));
        }

        let mut parser = HpdbParser::new();

        self.report_progress(ImportStage::Config, "hpdb.cfg", 0, 0);
        let content = read_lossy(&config_path)?;
        files.push(parser.parse_config_source(db, store, "hpdb.cfg", &content));

        let mut system_files = list_files(directory, "s_", ".hpd")?;
        if let Some(limit) = options.limit {
            system_files.truncate(limit);
        }
        let total = system_files.len();
        self.report_progress(ImportStage::Systems, "", 0, total);

        for (index, path) in system_files.iter().enumerate() {
            if self.cancelled() {
                log::warn!("import cancelled after {} of {} system files", index, total);
                cancelled = true;
                break;
            }
            let file_name = file_name_of(path);
            self.report_progress(ImportStage::Systems, &file_name, index, total);
            let content = read_lossy(path)?;
            files.push(parser.parse_system_source(db, store, &file_name, &content));
            self.report_progress(ImportStage::Systems, &file_name, index + 1, total);
        }

        let files_processed = files.len();
        log::info!(
            "HPDB import finished: {} files, {} agencies, {} frequencies{}",
            files_processed,
            db.agencies.len(),
            db.frequencies.len(),
            if cancelled { " (cancelled)" } else { "" }
        );
        Ok(ImportSummary {
            started_at,
            finished_at: Utc::now(),
            cancelled,
            files_processed,
            files,
        })
    }

    /// Import a favorites directory: f_list.cfg, then each list's
    /// f_*.hpd file when present.
    pub fn run_favorites_directory(
        &mut self,
        directory: &Path,
        lists: &mut Vec<FavoritesList>,
        store: &mut StructuredRecordStore,
    ) -> Result<ImportSummary, ImportError> {
        let started_at = Utc::now();
        let mut files = Vec::new();
        let mut cancelled = false;

        let index_path = directory.join("f_list.cfg");
        if !index_path.exists() {
            return Err(ImportError::MissingConfig(index_path));
        }

        let mut parser = FavoritesParser::new();

        self.report_progress(ImportStage::FavoritesIndex, "f_list.cfg", 0, 0);
        let content = read_lossy(&index_path)?;
        let (parsed_lists, report) = parser.parse_index_source(store, "f_list.cfg", &content);
        files.push(report);
        *lists = parsed_lists;

        let total = lists.iter().filter(|l| !l.filename.is_empty()).count();
        let mut processed = 0;
        self.report_progress(ImportStage::FavoritesFiles, "", 0, total);

        for list in lists.iter_mut() {
            if list.filename.is_empty() {
                continue;
            }
            if self.cancelled() {
                log::warn!("import cancelled after {} of {} favorites files", processed, total);
                cancelled = true;
                break;
            }
            let path = directory.join(&list.filename);
            if !path.exists() {
                log::warn!("favorites file missing: {}", path.display());
                processed += 1;
                continue;
            }
            let file_name = list.filename.clone();
            self.report_progress(ImportStage::FavoritesFiles, &file_name, processed, total);
            let content = read_lossy(&path)?;
            files.push(parser.parse_file_source(list, store, &file_name, &content));
            processed += 1;
            self.report_progress(ImportStage::FavoritesFiles, &file_name, processed, total);
        }

        let files_processed = files.len();
        log::info!(
            "favorites import finished: {} lists, {} files{}",
            lists.len(),
            files_processed,
            if cancelled { " (cancelled)" } else { "" }
        );
        Ok(ImportSummary {
            started_at,
            finished_at: Utc::now(),
            cancelled,
            files_processed,
            files,
        })
    }
}

/// Read a file as UTF-8 with best-effort replacement of invalid bytes.
fn read_lossy(path: &Path) -> Result<String, ImportError> {
    let bytes = fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Files in `directory` matching prefix/suffix, sorted by name.
fn list_files(directory: &Path, prefix: &str, suffix: &str) -> Result<Vec<PathBuf>, ImportError> {
    let entries = fs::read_dir(directory).map_err(|source| ImportError::Io {
        path: directory.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(prefix) && n.ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scannerdb-test-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_config_is_typed_error() {
        let dir = temp_dir("noconfig");
        let mut runner = ImportRunner::new();
        let mut db = HpdbDatabase::new();
        let mut store = StructuredRecordStore::new();
        let err = runner
            .run_hpdb_directory(&dir, &mut db, &mut store, &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingConfig(_)));
    }

    #[test]
    fn test_directory_run_with_progress() {
        let dir = temp_dir("run");
        write_file(&dir, "hpdb.cfg", "StateInfo\tStateId=6\tCountryId=1\tColorado\tCO\n");
        write_file(
            &dir,
            "s_000001.hpd",
            "Conventional\tAgencyId=12\tStateId=6\tPolice Dept\tOn\t\n",
        );
        write_file(
            &dir,
            "s_000002.hpd",
            "Conventional\tAgencyId=13\tStateId=6\tFire\tOn\t\n",
        );

        let updates: Rc<RefCell<Vec<ProgressUpdate>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&updates);

        let mut runner = ImportRunner::new();
        runner.set_progress(Box::new(move |u| sink.borrow_mut().push(u.clone())));

        let mut db = HpdbDatabase::new();
        let mut store = StructuredRecordStore::new();
        let summary = runner
            .run_hpdb_directory(&dir, &mut db, &mut store, &ImportOptions::default())
            .unwrap();

        assert!(!summary.cancelled);
        assert_eq!(summary.files_processed, 3);
        assert_eq!(db.agencies.len(), 2);
        assert_eq!(summary.created_counts().get("agencies"), Some(&2));

        let updates = updates.borrow();
        assert_eq!(updates[0].stage, ImportStage::Config);
        let last = updates.last().unwrap();
        assert_eq!(last.stage, ImportStage::Systems);
        assert_eq!(last.processed_files, 2);
        assert_eq!(last.total_files, 2);
        assert!(summary.finished_at >= summary.started_at);
    }

    #[test]
    fn test_cancel_before_system_files_keeps_partial_state() {
        let dir = temp_dir("cancel");
        write_file(&dir, "hpdb.cfg", "StateInfo\tStateId=6\tCountryId=1\tColorado\tCO\n");
        write_file(
            &dir,
            "s_000001.hpd",
            "Conventional\tAgencyId=12\tStateId=6\tPolice Dept\tOn\t\n",
        );

        let mut runner = ImportRunner::new();
        runner.cancel_flag().store(true, Ordering::Relaxed);

        let mut db = HpdbDatabase::new();
        let mut store = StructuredRecordStore::new();
        let summary = runner
            .run_hpdb_directory(&dir, &mut db, &mut store, &ImportOptions::default())
            .unwrap();

        // Config already parsed; the cancelled run is a valid partial state.
        assert!(summary.cancelled);
        assert_eq!(db.states.len(), 1);
        assert!(db.agencies.is_empty());
    }

    #[test]
    fn test_limit_option() {
        let dir = temp_dir("limit");
        write_file(&dir, "hpdb.cfg", "StateInfo\tStateId=6\tCountryId=1\tColorado\tCO\n");
        for i in 1..=3 {
            write_file(
                &dir,
                &format!("s_00000{}.hpd", i),
                &format!("Conventional\tAgencyId={}\tStateId=6\tAgency {}\tOn\t\n", i, i),
            );
        }
        let mut runner = ImportRunner::new();
        let mut db = HpdbDatabase::new();
        let mut store = StructuredRecordStore::new();
        let summary = runner
            .run_hpdb_directory(&dir, &mut db, &mut store, &ImportOptions { limit: Some(2) })
            .unwrap();
        assert_eq!(summary.files_processed, 3); // config + 2 systems
        assert_eq!(db.agencies.len(), 2);
    }

    #[test]
    fn test_favorites_directory_run() {
        let dir = temp_dir("favs");
        write_file(
            &dir,
            "f_list.cfg",
            "TargetModel\tSDS100\nFormatVersion\t1.00\nF-List \tPolice\tf_000001.hpd\tOff\tOn\t1\tOff\n",
        );
        write_file(
            &dir,
            "f_000001.hpd",
            "Conventional\t\t\tLocal PD\tOff\t\tConventional\nC-Group\t\t\tDispatch\tOff\nC-Freq\t\t\tMain\tOff\t460025000\n",
        );

        let mut runner = ImportRunner::new();
        let mut lists = Vec::new();
        let mut store = StructuredRecordStore::new();
        let summary = runner
            .run_favorites_directory(&dir, &mut lists, &mut store)
            .unwrap();

        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].scanner_model, "SDS100");
        assert_eq!(lists[0].conventional_systems.len(), 1);
        assert_eq!(
            lists[0].conventional_systems[0].groups[0].channels[0].frequency,
            460_025_000
        );
        assert_eq!(summary.files_processed, 2);
    }
}
