use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use projextract_io_fs::EnumPruneMode;

const LONG_ABOUT: &str = "\
Extracts the source-controllable files of a project tree.

Starting at the source directory, every directory is mirrored under a new
dated backup directory inside the destination, and only files ending with one
of the configured extensions are copied. Mirrored directories left without
matching files are pruned afterwards.

The typical use is pulling the .xpr, .tcl, .xdc, .bd and HDL sources out of a
Vivado project so they can be put under version control.";

#[derive(Parser, Debug)]
#[command(name = "projextract", version, about = "Extract project data into a dated backup", long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the extraction of project data
    Start(ArgsExtract),
    /// Print the effective configuration without touching the filesystem
    PrintConfig(ArgsExtract),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ArgsExtract {
    /// Project directory to extract from
    #[arg(short, long, value_name = "DIR", env = "PROJEXTRACT_SOURCE")]
    pub source: Option<PathBuf>,

    /// Existing directory receiving the dated backup directory
    #[arg(short, long, value_name = "DIR", env = "PROJEXTRACT_DESTINATION")]
    pub destination: Option<PathBuf>,

    /// File extension to keep, including the leading dot (repeatable)
    #[arg(short = 'e', long = "ext", value_name = ".EXT")]
    pub extensions: Vec<String>,

    /// Glob matched against directory names to skip (repeatable)
    #[arg(long = "exclude-dir", value_name = "GLOB")]
    pub exclude_dirs: Vec<String>,

    /// Suffix appended to the date stamp of the backup directory
    #[arg(long, value_name = "TEXT")]
    pub suffix: Option<String>,

    /// Cleanup of mirrored directories without matching files
    #[arg(long, value_enum, value_name = "MODE")]
    pub prune: Option<ArgPruneMode>,

    /// TOML file providing defaults for the options above
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print diagnostic messages
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPruneMode {
    SinglePass,
    FixedPoint,
    Off,
}

impl From<ArgPruneMode> for EnumPruneMode {
    fn from(value: ArgPruneMode) -> Self {
        match value {
            ArgPruneMode::SinglePass => EnumPruneMode::SinglePass,
            ArgPruneMode::FixedPoint => EnumPruneMode::FixedPoint,
            ArgPruneMode::Off => EnumPruneMode::Off,
        }
    }
}
