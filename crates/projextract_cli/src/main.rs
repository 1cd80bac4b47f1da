mod cli;
mod config;
mod logging;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use cli::{ArgsExtract, Cli, Commands};
use projextract_io_fs::{ExtractTreeError, extract_tree};
use tracing::{debug, error, info};

const N_WIDTH_BANNER: usize = 72;
const N_EXIT_IO: u8 = 1;
const N_EXIT_CONFIGURATION: u8 = 2;

fn main() -> ExitCode {
    let args = Cli::parse();
    print_header();

    match args.command {
        Some(Commands::Start(args_extract)) => run_start(&args_extract),
        Some(Commands::PrintConfig(args_extract)) => run_print_config(&args_extract),
        None => match write_long_help(&mut io::stdout()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                logging::init_logger(false);
                error!("Failed to print help: {err}");
                ExitCode::from(N_EXIT_IO)
            }
        },
    }
}

fn write_long_help(out: &mut impl Write) -> io::Result<()> {
    Cli::command().write_long_help(&mut *out)?;
    out.flush()
}

fn print_header() {
    println!("{}", "-".repeat(N_WIDTH_BANNER));
    println!("projextract {}", env!("CARGO_PKG_VERSION"));
    println!("{}", "-".repeat(N_WIDTH_BANNER));
}

fn run_start(args_extract: &ArgsExtract) -> ExitCode {
    let cfg_run = match config::resolve_run_config(args_extract) {
        Ok(cfg_run) => cfg_run,
        Err(err) => {
            logging::init_logger(args_extract.verbose);
            error!("Configuration error: {err:#}");
            return exit_code_for(&err);
        }
    };
    logging::init_logger(cfg_run.verbose);
    debug!("Effective configuration:\n{cfg_run}");

    match extract_tree(
        &cfg_run.path_dir_src,
        &cfg_run.path_dir_dst,
        &cfg_run.spec_ex_options,
    ) {
        Ok(report) => {
            info!("{report}");
            if report.path_dir_project.is_dir() {
                info!("Backup written to {}", report.path_dir_project.display());
            } else {
                info!(
                    "No matching files found; {} is empty",
                    report.path_dir_backup.display()
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run_print_config(args_extract: &ArgsExtract) -> ExitCode {
    logging::init_logger(args_extract.verbose);
    match config::resolve_run_config(args_extract) {
        Ok(cfg_run) => {
            println!("{cfg_run}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Configuration error: {err:#}");
            exit_code_for(&err)
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ExtractTreeError>() {
        Some(err_extract) => ExitCode::from(err_extract.exit_code() as u8),
        None => ExitCode::from(N_EXIT_CONFIGURATION),
    }
}
