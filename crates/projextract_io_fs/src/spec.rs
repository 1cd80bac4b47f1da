//! Extraction specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::util::derive_backup_name;

/// Suffix appended to the date stamp of every backup directory name.
pub const C_BACKUP_SUFFIX_DEFAULT: &str = "_XilProj_Backup";

/// Extensions kept when no explicit list is configured.
pub const TUP_EXTENSIONS_DEFAULT: [&str; 7] = [".xpr", ".bd", ".tcl", ".vhd", ".v", ".sv", ".xdc"];

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Post-extraction cleanup policy for the mirrored tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPruneMode {
    /// Remove directories that are empty when visited; parents emptied by
    /// this pass are left in place.
    #[default]
    SinglePass,
    /// Re-check each directory after its children and remove it if it became
    /// empty.
    FixedPoint,
    /// Leave the mirrored tree untouched.
    Off,
}

impl EnumPruneMode {
    /// Parse the user-facing name (`single-pass`, `fixed-point`, `off`).
    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "single-pass" => Some(Self::SinglePass),
            "fixed-point" => Some(Self::FixedPoint),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Self::SinglePass => "single-pass",
            Self::FixedPoint => "fixed-point",
            Self::Off => "off",
        }
    }
}

/// Filesystem operation that failed, used in [`ExtractTreeError::Io`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFsOperation {
    ListEntries,
    CreateDirectory,
    CopyFile,
    RemoveFile,
    RemoveDirectory,
}

impl EnumFsOperation {
    pub fn as_name(&self) -> &'static str {
        match self {
            Self::ListEntries => "list entries",
            Self::CreateDirectory => "create directory",
            Self::CopyFile => "copy file",
            Self::RemoveFile => "remove file",
            Self::RemoveDirectory => "remove directory",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExtensionSet

/// Ordered, duplicate-free list of filename suffixes.
///
/// Matching is a plain case-sensitive `ends_with`, so `.v` also selects
/// `top.v` but not `top.V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExtensionSet {
    l_extensions: Vec<String>,
}

impl SpecExtensionSet {
    /// Build a set from raw suffixes.
    ///
    /// Every suffix must start with `.` and carry at least one more
    /// character. Duplicates are dropped, keeping first occurrence order.
    pub fn new<I, S>(extensions: I) -> Result<Self, ExtractTreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut l_extensions: Vec<String> = Vec::new();
        for extension in extensions {
            let extension = extension.into();
            if !extension.starts_with('.') || extension.len() < 2 {
                return Err(ExtractTreeError::InvalidExtension(extension));
            }
            if !l_extensions.contains(&extension) {
                l_extensions.push(extension);
            }
        }
        if l_extensions.is_empty() {
            return Err(ExtractTreeError::InvalidExtension(String::new()));
        }
        Ok(Self { l_extensions })
    }

    pub fn is_match(&self, name_file: &str) -> bool {
        self.l_extensions.iter().any(|ext| name_file.ends_with(ext))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.l_extensions
    }
}

impl Default for SpecExtensionSet {
    fn default() -> Self {
        Self {
            l_extensions: TUP_EXTENSIONS_DEFAULT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::extract_tree`].
#[derive(Debug, Clone)]
pub struct SpecExtractOptions {
    /// Suffixes selecting which files are copied and which keep a directory alive.
    pub spec_ext_set: SpecExtensionSet,
    /// Glob patterns applied to directory basename; matching directories are
    /// neither mirrored nor descended into.
    pub patterns_exclude_dirs: Option<Vec<String>>,
    /// Cleanup policy run after extraction.
    pub rule_prune: EnumPruneMode,
    /// Date stamped into the backup directory name. `None` uses today's local date.
    pub date_backup: Option<NaiveDate>,
    /// Suffix appended after the date stamp.
    pub suffix_backup: String,
}

impl SpecExtractOptions {
    /// Backup directory name for this run: `date_backup` (or today) plus suffix.
    pub fn derive_name_backup(&self) -> String {
        let date_backup = self
            .date_backup
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        derive_backup_name(date_backup, &self.suffix_backup)
    }
}

impl Default for SpecExtractOptions {
    fn default() -> Self {
        Self {
            spec_ext_set: SpecExtensionSet::default(),
            patterns_exclude_dirs: None,
            rule_prune: EnumPruneMode::SinglePass,
            date_backup: None,
            suffix_backup: C_BACKUP_SUFFIX_DEFAULT.to_string(),
        }
    }
}

/// Errors returned by extraction and pruning.
///
/// Configuration and collision variants are raised before the destination is
/// touched. [`ExtractTreeError::Io`] may leave a partial backup on disk.
#[derive(Debug, Error)]
pub enum ExtractTreeError {
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("Source path has no directory name to mirror: {}", .0.display())]
    SourceWithoutName(PathBuf),

    #[error("Destination is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),

    #[error("Destination is not writable: {}", .0.display())]
    DestinationNotWritable(PathBuf),

    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .source_dir.display(),
        .destination_dir.display()
    )]
    SourceDestinationOverlap {
        source_dir: PathBuf,
        destination_dir: PathBuf,
    },

    #[error("Invalid extension `{0}`: extensions must start with `.`")]
    InvalidExtension(String),

    #[error("Invalid directory exclude pattern: {0}")]
    InvalidPattern(String),

    #[error("Backup directory already exists: {}", .0.display())]
    BackupExists(PathBuf),

    #[error("Failed to {} {}: {source}", .op.as_name(), .path.display())]
    Io {
        op: EnumFsOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractTreeError {
    pub(crate) fn io(op: EnumFsOperation, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// True for errors detected while validating inputs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::SourceNotDirectory(_)
                | Self::SourceWithoutName(_)
                | Self::DestinationNotDirectory(_)
                | Self::DestinationNotWritable(_)
                | Self::SourceDestinationOverlap { .. }
                | Self::InvalidExtension(_)
                | Self::InvalidPattern(_)
        )
    }

    /// Process exit status for this error: 1 I/O, 2 configuration, 3 collision.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } => 1,
            Self::BackupExists(_) => 3,
            _ => 2,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
