use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use globset::{Glob, GlobMatcher};

use crate::spec::{EnumFsOperation, ExtractTreeError, SpecExtensionSet};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// Compiled directory-exclude globs.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecDirExcludes {
    l_glob: Vec<GlobMatcher>,
}

impl SpecDirExcludes {
    pub(crate) fn from_raw(patterns: Option<&[String]>) -> Result<Self, ExtractTreeError> {
        let Some(patterns) = patterns else {
            return Ok(Self::default());
        };

        let mut l_glob = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let matcher = Glob::new(pattern)
                .map_err(|e| ExtractTreeError::InvalidPattern(format!("{pattern}: {e}")))?
                .compile_matcher();
            l_glob.push(matcher);
        }
        Ok(Self { l_glob })
    }

    pub(crate) fn is_excluded(&self, name_dir: &OsStr) -> bool {
        self.l_glob.iter().any(|p| p.is_match(name_dir))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Enumeration

/// One directory level split by entry kind, in listing order.
///
/// Names are kept as the raw `OsString` so they can be joined back into real
/// paths. Only matching and messages go through a lossy UTF-8 conversion.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecDirListing {
    pub(crate) l_names_file: Vec<OsString>,
    pub(crate) l_names_dir: Vec<OsString>,
    /// Symlinks, sockets, devices: never copied or followed.
    pub(crate) l_names_other: Vec<OsString>,
}

impl SpecDirListing {
    pub(crate) fn matching_files(&self, spec_ext_set: &SpecExtensionSet) -> Vec<OsString> {
        self.l_names_file
            .iter()
            .filter(|name| spec_ext_set.is_match(&name.to_string_lossy()))
            .cloned()
            .collect()
    }
}

pub(crate) fn scan_directory(path_dir: &Path) -> Result<SpecDirListing, ExtractTreeError> {
    let list_err = |e: io::Error| ExtractTreeError::io(EnumFsOperation::ListEntries, path_dir, e);

    let mut spec_listing = SpecDirListing::default();
    for entry_res in fs::read_dir(path_dir).map_err(list_err)? {
        let entry = entry_res.map_err(list_err)?;
        let c_name = entry.file_name();
        let cfg_file_type = entry
            .file_type()
            .map_err(|e| ExtractTreeError::io(EnumFsOperation::ListEntries, entry.path(), e))?;

        if cfg_file_type.is_dir() {
            spec_listing.l_names_dir.push(c_name);
        } else if cfg_file_type.is_file() {
            spec_listing.l_names_file.push(c_name);
        } else {
            spec_listing.l_names_other.push(c_name);
        }
    }
    Ok(spec_listing)
}

/// Names of regular files directly inside `path_dir` that end with one of the
/// configured extensions, in filesystem listing order.
///
/// An empty vector means the directory has no entries or none matched. Names
/// that are not valid UTF-8 are matched on their lossy form and returned
/// unchanged.
pub fn list_matching_files(
    path_dir: &Path,
    spec_ext_set: &SpecExtensionSet,
) -> Result<Vec<OsString>, ExtractTreeError> {
    Ok(scan_directory(path_dir)?.matching_files(spec_ext_set))
}

/// Names of directories directly inside `path_dir`, in filesystem listing
/// order. Symlinks to directories are not included.
pub fn list_subdirectories(path_dir: &Path) -> Result<Vec<OsString>, ExtractTreeError> {
    Ok(scan_directory(path_dir)?.l_names_dir)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// True when `dst` lies inside `src`, where the walker would find its own
/// output.
pub(crate) fn is_destination_inside_source(src: &Path, dst: &Path) -> bool {
    _normalize_path(dst).starts_with(_normalize_path(src))
}

/// `<YYYYMMDD><suffix>`, e.g. `20261014_XilProj_Backup`.
pub fn derive_backup_name(date_backup: NaiveDate, suffix_backup: &str) -> String {
    format!("{}{suffix_backup}", date_backup.format("%Y%m%d"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyPrimitive

/// Copy `path_file_src` into `path_dir_dst` under the same filename,
/// replacing any file already there.
pub(crate) fn copy_file_into_dir(
    path_file_src: &Path,
    path_dir_dst: &Path,
) -> Result<PathBuf, ExtractTreeError> {
    let name_file = path_file_src.file_name().ok_or_else(|| {
        ExtractTreeError::io(
            EnumFsOperation::CopyFile,
            path_file_src,
            io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
        )
    })?;
    let path_file_dst = path_dir_dst.join(name_file);
    copy_file_with_metadata(path_file_src, &path_file_dst)
        .map_err(|e| ExtractTreeError::io(EnumFsOperation::CopyFile, path_file_src, e))?;
    Ok(path_file_dst)
}

pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        apply_metadata_linux(path_file_src, path_file_dst)?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn apply_metadata_linux(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

// Extended attributes are best effort: tmpfs and some mounts reject `user.*`.
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::ffi::{OsStr, OsString};
    use std::fs;
    use std::path::Path;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::{
        SpecDirExcludes, copy_file_into_dir, derive_backup_name, is_destination_inside_source,
        list_matching_files, list_subdirectories,
    };
    use crate::spec::{EnumFsOperation, ExtractTreeError, SpecExtensionSet};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    fn sorted(mut names: Vec<OsString>) -> Vec<OsString> {
        names.sort();
        names
    }

    fn os_names(names: &[&str]) -> Vec<OsString> {
        names.iter().map(OsString::from).collect()
    }

    #[test]
    fn list_matching_files_filters_by_suffix_only() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("proj.xpr"), "x");
        write_text(&tmp.path().join("build.tcl"), "t");
        write_text(&tmp.path().join("vivado.log"), "l");
        write_text(&tmp.path().join("UPPER.XPR"), "u");
        fs::create_dir(tmp.path().join("looks_like.xpr")).expect("mkdir");

        let spec_ext_set = SpecExtensionSet::new([".xpr", ".tcl"]).expect("ext set");
        let l_names = list_matching_files(tmp.path(), &spec_ext_set).expect("list files");
        assert_eq!(sorted(l_names), os_names(&["build.tcl", "proj.xpr"]));
    }

    #[test]
    fn listings_of_empty_directory_are_empty_vectors() {
        let tmp = TempDir::new().expect("tempdir");
        let spec_ext_set = SpecExtensionSet::default();
        assert!(
            list_matching_files(tmp.path(), &spec_ext_set)
                .expect("list files")
                .is_empty()
        );
        assert!(list_subdirectories(tmp.path()).expect("list dirs").is_empty());
    }

    #[test]
    fn list_subdirectories_ignores_files() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir(tmp.path().join("srcs")).expect("mkdir");
        fs::create_dir(tmp.path().join("constrs")).expect("mkdir");
        write_text(&tmp.path().join("proj.xpr"), "x");

        let l_names = list_subdirectories(tmp.path()).expect("list dirs");
        assert_eq!(sorted(l_names), os_names(&["constrs", "srcs"]));
    }

    #[test]
    fn listing_missing_directory_is_io_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path_missing = tmp.path().join("missing");
        let err = list_subdirectories(&path_missing).expect_err("must fail");
        match err {
            ExtractTreeError::Io { op, path, .. } => {
                assert_eq!(op, EnumFsOperation::ListEntries);
                assert_eq!(path, path_missing);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_neither_files_nor_directories() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("real.xpr"), "x");
        fs::create_dir(tmp.path().join("real_dir")).expect("mkdir");
        symlink(tmp.path().join("real.xpr"), tmp.path().join("link.xpr")).expect("symlink");
        symlink(tmp.path().join("real_dir"), tmp.path().join("link_dir")).expect("symlink");

        let spec_ext_set = SpecExtensionSet::default();
        assert_eq!(
            list_matching_files(tmp.path(), &spec_ext_set).expect("list files"),
            os_names(&["real.xpr"])
        );
        assert_eq!(
            list_subdirectories(tmp.path()).expect("list dirs"),
            os_names(&["real_dir"])
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_returned_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().expect("tempdir");
        let name_file = OsStr::from_bytes(b"caf\xe9.xpr");
        let name_dir = OsStr::from_bytes(b"caf\xe9");
        write_text(&tmp.path().join(name_file), "x");
        fs::create_dir(tmp.path().join(name_dir)).expect("mkdir");

        let spec_ext_set = SpecExtensionSet::default();
        let l_files = list_matching_files(tmp.path(), &spec_ext_set).expect("list files");
        assert_eq!(l_files, vec![name_file.to_os_string()]);
        assert!(tmp.path().join(&l_files[0]).is_file());

        let l_dirs = list_subdirectories(tmp.path()).expect("list dirs");
        assert_eq!(l_dirs, vec![name_dir.to_os_string()]);
        assert!(tmp.path().join(&l_dirs[0]).is_dir());
    }

    #[test]
    fn backup_name_uses_four_digit_year() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).expect("date");
        assert_eq!(
            derive_backup_name(date, "_XilProj_Backup"),
            "20260307_XilProj_Backup"
        );
    }

    #[test]
    fn destination_inside_source_detected() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("out")).expect("mkdir");
        assert!(is_destination_inside_source(&src, &src.join("out")));
        assert!(is_destination_inside_source(&src, &src));
        assert!(!is_destination_inside_source(&src.join("out"), &src));
        assert!(!is_destination_inside_source(&src, tmp.path()));
    }

    #[test]
    fn dir_excludes_match_basename_globs() {
        let patterns = vec!["*.cache".to_string(), "*.runs".to_string()];
        let spec_excludes = SpecDirExcludes::from_raw(Some(&patterns)).expect("globs");
        assert!(spec_excludes.is_excluded(OsStr::new("proj.cache")));
        assert!(spec_excludes.is_excluded(OsStr::new("proj.runs")));
        assert!(!spec_excludes.is_excluded(OsStr::new("proj.srcs")));
        assert!(!SpecDirExcludes::default().is_excluded(OsStr::new("proj.cache")));

        let bad = vec!["[".to_string()];
        let err = SpecDirExcludes::from_raw(Some(&bad)).expect_err("invalid glob");
        assert!(matches!(err, ExtractTreeError::InvalidPattern(_)));
    }

    #[test]
    fn copy_into_dir_overwrites_existing_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file_src = tmp.path().join("src/top.v");
        let path_dir_dst = tmp.path().join("dst");
        write_text(&path_file_src, "new");
        write_text(&path_dir_dst.join("top.v"), "old");

        let path_file_dst = copy_file_into_dir(&path_file_src, &path_dir_dst).expect("copy");
        assert_eq!(path_file_dst, path_dir_dst.join("top.v"));
        assert_eq!(fs::read_to_string(&path_file_dst).expect("read"), "new");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn copy_preserves_linux_metadata() {
        use filetime::{FileTime, set_file_times};
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let path_file_src = tmp.path().join("src/meta.xdc");
        let path_dir_dst = tmp.path().join("dst");
        write_text(&path_file_src, "meta");
        fs::create_dir_all(&path_dir_dst).expect("mkdir dst");

        fs::set_permissions(&path_file_src, fs::Permissions::from_mode(0o640))
            .expect("set permissions");
        set_file_times(
            &path_file_src,
            FileTime::from_unix_time(1_700_000_010, 0),
            FileTime::from_unix_time(1_700_000_020, 0),
        )
        .expect("set times");

        let path_file_dst = copy_file_into_dir(&path_file_src, &path_dir_dst).expect("copy");
        let stat_src = fs::metadata(&path_file_src).expect("src metadata");
        let stat_dst = fs::metadata(&path_file_dst).expect("dst metadata");
        assert_eq!(
            stat_src.permissions().mode() & 0o777,
            stat_dst.permissions().mode() & 0o777
        );
        assert_eq!(
            FileTime::from_last_modification_time(&stat_src),
            FileTime::from_last_modification_time(&stat_dst)
        );
    }
}
