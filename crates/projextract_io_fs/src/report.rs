//! Extraction report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Aggregate counters and diagnostics for one `extract_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportExtract {
    /// Top-level backup directory created for this run.
    pub path_dir_backup: PathBuf,
    /// Mirror of the source root inside the backup directory.
    pub path_dir_project: PathBuf,
    /// Source directories visited by the walker.
    pub cnt_dirs_scanned: u64,
    /// Destination directories created (pre-existing mirrors excluded).
    pub cnt_dirs_created: u64,
    /// Destination directories removed by the pruner.
    pub cnt_dirs_pruned: u64,
    /// Source regular files inspected.
    pub cnt_files_scanned: u64,
    /// Source files whose name matched the extension set.
    pub cnt_files_matched: u64,
    /// Files copied into the mirror.
    pub cnt_files_copied: u64,
    /// Non-matching files removed from the mirror while pruning.
    pub cnt_files_removed: u64,
    /// Non-fatal warnings collected during traversal/pruning.
    pub warnings: Vec<String>,
}

impl ReportExtract {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_scanned".to_string(), self.cnt_dirs_scanned);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_dirs_pruned".to_string(), self.cnt_dirs_pruned);
        dict_counts.insert("cnt_files_scanned".to_string(), self.cnt_files_scanned);
        dict_counts.insert("cnt_files_matched".to_string(), self.cnt_files_matched);
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("cnt_files_removed".to_string(), self.cnt_files_removed);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs_scanned={} dirs_created={} dirs_pruned={} files_scanned={} matched={} copied={} removed={} warnings={}",
            self.cnt_dirs_scanned,
            self.cnt_dirs_created,
            self.cnt_dirs_pruned,
            self.cnt_files_scanned,
            self.cnt_files_matched,
            self.cnt_files_copied,
            self.cnt_files_removed,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportExtract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXTRACT]"))
    }
}

/// Mutable accumulator threaded through the walker and the pruner.
#[derive(Debug, Default, Clone)]
pub struct ReportExtractBuilder {
    pub cnt_dirs_scanned: u64,
    pub cnt_dirs_created: u64,
    pub cnt_dirs_pruned: u64,
    pub cnt_files_scanned: u64,
    pub cnt_files_matched: u64,
    pub cnt_files_copied: u64,
    pub cnt_files_removed: u64,
    pub warnings: Vec<String>,
}

impl ReportExtractBuilder {
    pub fn add_dir_scanned(&mut self) {
        self.cnt_dirs_scanned += 1;
    }

    pub fn add_dir_created(&mut self) {
        self.cnt_dirs_created += 1;
    }

    pub fn add_dir_pruned(&mut self) {
        self.cnt_dirs_pruned += 1;
    }

    /// Add `value` scanned files, e.g. one directory listing at a time.
    pub fn add_files_scanned(&mut self, value: u64) {
        self.cnt_files_scanned += value;
    }

    pub fn add_file_matched(&mut self) {
        self.cnt_files_matched += 1;
    }

    pub fn add_file_copied(&mut self) {
        self.cnt_files_copied += 1;
    }

    pub fn add_file_removed(&mut self) {
        self.cnt_files_removed += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self, path_dir_backup: PathBuf, path_dir_project: PathBuf) -> ReportExtract {
        ReportExtract {
            path_dir_backup,
            path_dir_project,
            cnt_dirs_scanned: self.cnt_dirs_scanned,
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_dirs_pruned: self.cnt_dirs_pruned,
            cnt_files_scanned: self.cnt_files_scanned,
            cnt_files_matched: self.cnt_files_matched,
            cnt_files_copied: self.cnt_files_copied,
            cnt_files_removed: self.cnt_files_removed,
            warnings: self.warnings,
        }
    }
}
