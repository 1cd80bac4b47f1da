//! Effective run configuration: command line over environment over TOML file
//! over built-in defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use projextract_io_fs::{EnumPruneMode, SpecExtensionSet, SpecExtractOptions};
use serde::Deserialize;

use crate::cli::ArgsExtract;

/// Optional TOML configuration file.
///
/// ```toml
/// source = "C:/Xilinx/projects/blinky"
/// destination = "D:/backups"
/// extensions = [".xpr", ".tcl", ".xdc"]
/// exclude_dirs = ["*.cache", "*.runs"]
/// prune = "fixed-point"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub exclude_dirs: Option<Vec<String>>,
    pub suffix: Option<String>,
    pub prune: Option<String>,
    pub verbose: Option<bool>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&txt).with_context(|| format!("Invalid config file {}", path.display()))
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub path_dir_src: PathBuf,
    pub path_dir_dst: PathBuf,
    pub spec_ex_options: SpecExtractOptions,
    pub verbose: bool,
}

impl RunConfig {
    /// Backup directory name a run started now would create.
    pub fn name_backup(&self) -> String {
        self.spec_ex_options.derive_name_backup()
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec_ex = &self.spec_ex_options;
        writeln!(f, "source       = {}", self.path_dir_src.display())?;
        writeln!(f, "destination  = {}", self.path_dir_dst.display())?;
        writeln!(f, "extensions   = {}", spec_ex.spec_ext_set.as_slice().join(" "))?;
        writeln!(
            f,
            "exclude_dirs = {}",
            spec_ex.patterns_exclude_dirs
                .as_deref()
                .map(|l| l.join(" "))
                .unwrap_or_default()
        )?;
        writeln!(f, "backup_name  = {}", self.name_backup())?;
        writeln!(f, "prune        = {}", spec_ex.rule_prune.as_name())?;
        write!(f, "verbose      = {}", self.verbose)
    }
}

/// Merge command line arguments (already carrying environment fallbacks) with
/// the optional config file.
pub fn resolve_run_config(args: &ArgsExtract) -> Result<RunConfig> {
    let cfg_file = match &args.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };

    let path_dir_src = args
        .source
        .clone()
        .or(cfg_file.source)
        .ok_or_else(|| anyhow!("No source directory given (use --source or `source` in the config file)"))?;
    let path_dir_dst = args
        .destination
        .clone()
        .or(cfg_file.destination)
        .ok_or_else(|| {
            anyhow!("No destination directory given (use --destination or `destination` in the config file)")
        })?;

    let l_extensions = if args.extensions.is_empty() {
        cfg_file.extensions
    } else {
        Some(args.extensions.clone())
    };
    let spec_ext_set = match l_extensions {
        Some(l_extensions) => SpecExtensionSet::new(l_extensions)?,
        None => SpecExtensionSet::default(),
    };

    let patterns_exclude_dirs = if args.exclude_dirs.is_empty() {
        cfg_file.exclude_dirs
    } else {
        Some(args.exclude_dirs.clone())
    };

    let rule_prune = match (args.prune, cfg_file.prune.as_deref()) {
        (Some(arg_prune), _) => EnumPruneMode::from(arg_prune),
        (None, Some(name)) => EnumPruneMode::from_name(name).ok_or_else(|| {
            anyhow!("Invalid prune mode `{name}` (expected single-pass, fixed-point or off)")
        })?,
        (None, None) => EnumPruneMode::default(),
    };

    let mut spec_ex_options = SpecExtractOptions {
        spec_ext_set,
        patterns_exclude_dirs,
        rule_prune,
        ..SpecExtractOptions::default()
    };
    if let Some(suffix) = args.suffix.clone().or(cfg_file.suffix) {
        spec_ex_options.suffix_backup = suffix;
    }

    Ok(RunConfig {
        path_dir_src,
        path_dir_dst,
        spec_ex_options,
        verbose: args.verbose || cfg_file.verbose.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use projextract_io_fs::{C_BACKUP_SUFFIX_DEFAULT, EnumPruneMode, ExtractTreeError};
    use tempfile::TempDir;

    use super::resolve_run_config;
    use crate::cli::{ArgPruneMode, ArgsExtract};

    fn write_config(tmp: &TempDir, txt: &str) -> PathBuf {
        let path = tmp.path().join("projextract.toml");
        fs::write(&path, txt).expect("write config");
        path
    }

    #[test]
    fn file_values_fill_missing_arguments() {
        let tmp = TempDir::new().expect("tempdir");
        let path_config = write_config(
            &tmp,
            r#"
source = "/work/proj"
destination = "/backups"
extensions = [".xpr", ".xdc"]
exclude_dirs = ["*.cache"]
suffix = "_Nightly"
prune = "fixed-point"
verbose = true
"#,
        );
        let args = ArgsExtract {
            config: Some(path_config),
            ..ArgsExtract::default()
        };

        let cfg = resolve_run_config(&args).expect("resolve");
        assert_eq!(cfg.path_dir_src, PathBuf::from("/work/proj"));
        assert_eq!(cfg.path_dir_dst, PathBuf::from("/backups"));
        assert_eq!(
            cfg.spec_ex_options.spec_ext_set.as_slice(),
            &[".xpr".to_string(), ".xdc".to_string()]
        );
        assert_eq!(
            cfg.spec_ex_options.patterns_exclude_dirs,
            Some(vec!["*.cache".to_string()])
        );
        assert_eq!(cfg.spec_ex_options.suffix_backup, "_Nightly");
        assert_eq!(cfg.spec_ex_options.rule_prune, EnumPruneMode::FixedPoint);
        assert!(cfg.verbose);
    }

    #[test]
    fn arguments_override_file_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path_config = write_config(
            &tmp,
            "source = \"/from/file\"\ndestination = \"/dst/file\"\nextensions = [\".xpr\"]\nprune = \"off\"\n",
        );
        let args = ArgsExtract {
            source: Some(PathBuf::from("/from/cli")),
            extensions: vec![".tcl".to_string()],
            prune: Some(ArgPruneMode::SinglePass),
            config: Some(path_config),
            ..ArgsExtract::default()
        };

        let cfg = resolve_run_config(&args).expect("resolve");
        assert_eq!(cfg.path_dir_src, PathBuf::from("/from/cli"));
        assert_eq!(cfg.path_dir_dst, PathBuf::from("/dst/file"));
        assert_eq!(cfg.spec_ex_options.spec_ext_set.as_slice(), &[".tcl".to_string()]);
        assert_eq!(cfg.spec_ex_options.rule_prune, EnumPruneMode::SinglePass);
    }

    #[test]
    fn defaults_apply_without_file() {
        let args = ArgsExtract {
            source: Some(PathBuf::from("/src")),
            destination: Some(PathBuf::from("/dst")),
            ..ArgsExtract::default()
        };
        let cfg = resolve_run_config(&args).expect("resolve");
        assert!(cfg.spec_ex_options.spec_ext_set.is_match("design_1.bd"));
        assert_eq!(cfg.spec_ex_options.suffix_backup, C_BACKUP_SUFFIX_DEFAULT);
        assert_eq!(cfg.spec_ex_options.rule_prune, EnumPruneMode::SinglePass);
        assert!(cfg.name_backup().ends_with(C_BACKUP_SUFFIX_DEFAULT));
        assert!(!cfg.verbose);
    }

    #[test]
    fn missing_source_is_reported() {
        let args = ArgsExtract {
            destination: Some(PathBuf::from("/dst")),
            ..ArgsExtract::default()
        };
        let err = resolve_run_config(&args).expect_err("must fail");
        assert!(err.to_string().contains("No source directory"));
    }

    #[test]
    fn invalid_extension_keeps_library_error() {
        let args = ArgsExtract {
            source: Some(PathBuf::from("/src")),
            destination: Some(PathBuf::from("/dst")),
            extensions: vec!["xpr".to_string()],
            ..ArgsExtract::default()
        };
        let err = resolve_run_config(&args).expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<ExtractTreeError>(),
            Some(ExtractTreeError::InvalidExtension(_))
        ));
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let path_config = write_config(&tmp, "sauce = \"/typo\"\n");
        let args = ArgsExtract {
            config: Some(path_config),
            ..ArgsExtract::default()
        };
        let err = resolve_run_config(&args).expect_err("must fail");
        assert!(format!("{err:#}").contains("Invalid config file"));
    }

    #[test]
    fn invalid_prune_name_in_file_is_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let path_config = write_config(&tmp, "source = \"/s\"\ndestination = \"/d\"\nprune = \"twice\"\n");
        let args = ArgsExtract {
            config: Some(path_config),
            ..ArgsExtract::default()
        };
        let err = resolve_run_config(&args).expect_err("must fail");
        assert!(err.to_string().contains("Invalid prune mode"));
    }
}
