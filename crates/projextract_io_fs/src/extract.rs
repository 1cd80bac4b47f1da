//! Backup directory setup, tree traversal and filtered copy orchestration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::prune::prune;
use crate::report::{ReportExtract, ReportExtractBuilder};
use crate::spec::{
    EnumFsOperation, EnumPruneMode, ExtractTreeError, SpecExtensionSet, SpecExtractOptions,
};
use crate::util::{
    SpecDirExcludes, copy_file_into_dir, is_destination_inside_source, scan_directory,
};

#[derive(Debug)]
struct SpecExtractContext<'a> {
    spec_ext_set: &'a SpecExtensionSet,
    spec_excludes: SpecDirExcludes,
    builder_ex_report: &'a mut ReportExtractBuilder,
}

/// Extract the files of `dir_source` matching the configured extensions into
/// a new dated backup directory under `dir_destination`.
///
/// The resulting layout is `<dir_destination>/<backup name>/<source leaf>/...`.
///
/// This function performs:
/// 1. Input validation (no filesystem mutation on failure).
/// 2. Creation of the backup directory, refusing to reuse an existing one.
/// 3. Depth-first mirror + copy of every source directory.
/// 4. Pruning of the mirror per [`SpecExtractOptions::rule_prune`].
///
/// The first filesystem failure aborts the run. Files copied before it stay
/// on disk.
pub fn extract_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_ex_options: &SpecExtractOptions,
) -> Result<ReportExtract, ExtractTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(ExtractTreeError::SourceNotDirectory(path_dir_src));
    }
    if !path_dir_dst.is_dir() {
        return Err(ExtractTreeError::DestinationNotDirectory(path_dir_dst));
    }
    // `.` and `..` have no leaf name of their own.
    let path_dir_src = fs::canonicalize(&path_dir_src).unwrap_or(path_dir_src);
    if path_dir_src.file_name().is_none() {
        return Err(ExtractTreeError::SourceWithoutName(path_dir_src));
    }
    if is_destination_inside_source(&path_dir_src, &path_dir_dst) {
        return Err(ExtractTreeError::SourceDestinationOverlap {
            source_dir: path_dir_src,
            destination_dir: path_dir_dst,
        });
    }
    let spec_excludes =
        SpecDirExcludes::from_raw(spec_ex_options.patterns_exclude_dirs.as_deref())?;

    let name_backup = spec_ex_options.derive_name_backup();

    let mut builder_ex_report = ReportExtractBuilder::default();
    let path_dir_backup = create_main_backup_dir(&path_dir_dst, &name_backup)?;
    builder_ex_report.add_dir_created();
    info!(
        "Extracting {} -> {}",
        path_dir_src.display(),
        path_dir_backup.display()
    );

    let mut spec_ex_ctx = SpecExtractContext {
        spec_ext_set: &spec_ex_options.spec_ext_set,
        spec_excludes,
        builder_ex_report: &mut builder_ex_report,
    };
    let path_dir_project = walk_directory(&path_dir_src, &path_dir_backup, &mut spec_ex_ctx)?;

    if spec_ex_options.rule_prune != EnumPruneMode::Off {
        info!(
            "Pruning {} ({})",
            path_dir_project.display(),
            spec_ex_options.rule_prune.as_name()
        );
    }
    prune(
        &path_dir_project,
        &spec_ex_options.spec_ext_set,
        spec_ex_options.rule_prune,
        &mut builder_ex_report,
    )?;

    Ok(builder_ex_report.build(path_dir_backup, path_dir_project))
}

/// Create `name_backup` inside `path_dir_dst_root`.
///
/// Fails with [`ExtractTreeError::BackupExists`] if the name is already taken,
/// so one run can never merge into an earlier backup.
pub fn create_main_backup_dir(
    path_dir_dst_root: &Path,
    name_backup: &str,
) -> Result<PathBuf, ExtractTreeError> {
    if !path_dir_dst_root.is_dir() {
        return Err(ExtractTreeError::DestinationNotDirectory(
            path_dir_dst_root.to_path_buf(),
        ));
    }
    let path_dir_backup = path_dir_dst_root.join(name_backup);
    match fs::create_dir(&path_dir_backup) {
        Ok(()) => Ok(path_dir_backup),
        Err(e) => Err(classify_backup_dir_error(path_dir_dst_root, path_dir_backup, e)),
    }
}

/// Failures to create the backup directory that come from the destination
/// root itself are configuration errors. Nothing has been written yet.
fn classify_backup_dir_error(
    path_dir_dst_root: &Path,
    path_dir_backup: PathBuf,
    err: io::Error,
) -> ExtractTreeError {
    match err.kind() {
        io::ErrorKind::AlreadyExists => ExtractTreeError::BackupExists(path_dir_backup),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            ExtractTreeError::DestinationNotWritable(path_dir_dst_root.to_path_buf())
        }
        _ => ExtractTreeError::io(EnumFsOperation::CreateDirectory, path_dir_backup, err),
    }
}

/// Create the mirror of `path_dir_src` (same leaf name) inside
/// `path_dir_dst_parent` unless it already exists, and return its path.
pub fn create_backup_sub_dir(
    path_dir_src: &Path,
    path_dir_dst_parent: &Path,
) -> Result<PathBuf, ExtractTreeError> {
    ensure_mirror_dir(path_dir_src, path_dir_dst_parent).map(|(path_dir_here, _)| path_dir_here)
}

/// Returns the mirror path and whether this call created it.
fn ensure_mirror_dir(
    path_dir_src: &Path,
    path_dir_dst_parent: &Path,
) -> Result<(PathBuf, bool), ExtractTreeError> {
    let name_dir = path_dir_src
        .file_name()
        .ok_or_else(|| ExtractTreeError::SourceWithoutName(path_dir_src.to_path_buf()))?;
    let path_dir_here = path_dir_dst_parent.join(name_dir);

    match fs::create_dir(&path_dir_here) {
        Ok(()) => Ok((path_dir_here, true)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path_dir_here.is_dir() => {
            Ok((path_dir_here, false))
        }
        Err(e) => Err(ExtractTreeError::io(
            EnumFsOperation::CreateDirectory,
            path_dir_here,
            e,
        )),
    }
}

/// Mirror `path_dir_src` under `path_dir_dst_parent`, copy its matching files
/// and recurse into its subdirectories. Returns the mirror of
/// `path_dir_src`.
///
/// This is the bare traversal: no validation, no backup directory, no
/// pruning. Counters are accumulated into `builder_ex_report`.
pub fn extract(
    path_dir_src: &Path,
    path_dir_dst_parent: &Path,
    spec_ext_set: &SpecExtensionSet,
    builder_ex_report: &mut ReportExtractBuilder,
) -> Result<PathBuf, ExtractTreeError> {
    let mut spec_ex_ctx = SpecExtractContext {
        spec_ext_set,
        spec_excludes: SpecDirExcludes::default(),
        builder_ex_report,
    };
    walk_directory(path_dir_src, path_dir_dst_parent, &mut spec_ex_ctx)
}

fn walk_directory(
    path_dir_src: &Path,
    path_dir_dst_parent: &Path,
    spec_ex_ctx: &mut SpecExtractContext<'_>,
) -> Result<PathBuf, ExtractTreeError> {
    let (path_dir_here, b_created) = ensure_mirror_dir(path_dir_src, path_dir_dst_parent)?;
    if b_created {
        spec_ex_ctx.builder_ex_report.add_dir_created();
        debug!("Created {}", path_dir_here.display());
    }
    spec_ex_ctx.builder_ex_report.add_dir_scanned();

    let spec_listing = scan_directory(path_dir_src)?;
    spec_ex_ctx
        .builder_ex_report
        .add_files_scanned(spec_listing.l_names_file.len() as u64);

    for name_other in &spec_listing.l_names_other {
        let path_other = path_dir_src.join(name_other);
        warn!("Special entry skipped: {}", path_other.display());
        spec_ex_ctx
            .builder_ex_report
            .add_warning(format!("Special entry skipped: {}", path_other.display()));
    }

    for name_file in spec_listing.matching_files(spec_ex_ctx.spec_ext_set) {
        spec_ex_ctx.builder_ex_report.add_file_matched();
        let path_file_dst = copy_file_into_dir(&path_dir_src.join(&name_file), &path_dir_here)?;
        spec_ex_ctx.builder_ex_report.add_file_copied();
        debug!("Copied {}", path_file_dst.display());
    }

    for name_dir in &spec_listing.l_names_dir {
        if spec_ex_ctx.spec_excludes.is_excluded(name_dir) {
            debug!("Excluded {}", path_dir_src.join(name_dir).display());
            continue;
        }
        walk_directory(&path_dir_src.join(name_dir), &path_dir_here, spec_ex_ctx)?;
    }

    Ok(path_dir_here)
}
