//! Post-extraction removal of mirrored directories without matching content.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::report::ReportExtractBuilder;
use crate::spec::{EnumFsOperation, EnumPruneMode, ExtractTreeError, SpecExtensionSet};
use crate::util::{SpecDirListing, scan_directory};

/// Remove directories under (and including) `path_dir` that hold neither
/// subdirectories nor files matching `spec_ext_set`.
///
/// Emptiness is judged through the same extension filter as extraction: a
/// directory holding only non-matching files is empty, and those files are
/// deleted before the directory itself.
///
/// With [`EnumPruneMode::SinglePass`] a directory is checked once, before its
/// children. A parent whose last child is pruned in this call stays until the
/// next call. [`EnumPruneMode::FixedPoint`] checks again after the children.
///
/// Returns whether `path_dir` itself was removed.
pub fn prune(
    path_dir: &Path,
    spec_ext_set: &SpecExtensionSet,
    rule_prune: EnumPruneMode,
    builder_ex_report: &mut ReportExtractBuilder,
) -> Result<bool, ExtractTreeError> {
    if rule_prune == EnumPruneMode::Off {
        return Ok(false);
    }
    prune_directory(path_dir, spec_ext_set, rule_prune, builder_ex_report)
}

fn prune_directory(
    path_dir: &Path,
    spec_ext_set: &SpecExtensionSet,
    rule_prune: EnumPruneMode,
    builder_ex_report: &mut ReportExtractBuilder,
) -> Result<bool, ExtractTreeError> {
    let spec_listing = scan_directory(path_dir)?;
    let b_has_matching = !spec_listing.matching_files(spec_ext_set).is_empty();

    if spec_listing.l_names_dir.is_empty() {
        if b_has_matching {
            return Ok(false);
        }
        remove_content_free_dir(path_dir, &spec_listing, builder_ex_report)?;
        return Ok(true);
    }

    let mut b_children_all_removed = true;
    for name_dir in &spec_listing.l_names_dir {
        let b_removed = prune_directory(
            &path_dir.join(name_dir),
            spec_ext_set,
            rule_prune,
            builder_ex_report,
        )?;
        b_children_all_removed &= b_removed;
    }

    if rule_prune == EnumPruneMode::FixedPoint && b_children_all_removed && !b_has_matching {
        remove_content_free_dir(path_dir, &spec_listing, builder_ex_report)?;
        return Ok(true);
    }
    Ok(false)
}

fn remove_content_free_dir(
    path_dir: &Path,
    spec_listing: &SpecDirListing,
    builder_ex_report: &mut ReportExtractBuilder,
) -> Result<(), ExtractTreeError> {
    for name_stray in spec_listing
        .l_names_file
        .iter()
        .chain(spec_listing.l_names_other.iter())
    {
        let path_stray = path_dir.join(name_stray);
        fs::remove_file(&path_stray)
            .map_err(|e| ExtractTreeError::io(EnumFsOperation::RemoveFile, &path_stray, e))?;
        warn!("Removed non-matching entry {}", path_stray.display());
        builder_ex_report.add_file_removed();
        builder_ex_report.add_warning(format!(
            "Removed non-matching entry: {}",
            path_stray.display()
        ));
    }

    fs::remove_dir(path_dir)
        .map_err(|e| ExtractTreeError::io(EnumFsOperation::RemoveDirectory, path_dir, e))?;
    builder_ex_report.add_dir_pruned();
    debug!("Pruned {}", path_dir.display());
    Ok(())
}
