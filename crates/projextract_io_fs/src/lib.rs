//! `projextract_io_fs` v1:
//! Selective tree mirror for project backups.
//!
//! Modules:
//! - `extract` : backup directory setup, traversal and filtered copy
//! - `prune`   : removal of mirrored directories left without matching files
//! - `spec`    : enums/options/errors
//! - `report`  : run-time report model
//! - `util`    : enumeration, path and copy helpers

pub mod extract;
pub mod prune;
pub mod report;
pub mod spec;
mod util;

pub use extract::{create_backup_sub_dir, create_main_backup_dir, extract, extract_tree};
pub use prune::prune;
pub use report::{ReportExtract, ReportExtractBuilder};
pub use spec::{
    C_BACKUP_SUFFIX_DEFAULT, EnumFsOperation, EnumPruneMode, ExtractTreeError, SpecExtensionSet,
    SpecExtractOptions, TUP_EXTENSIONS_DEFAULT,
};
pub use util::{derive_backup_name, list_matching_files, list_subdirectories};
