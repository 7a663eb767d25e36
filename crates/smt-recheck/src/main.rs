// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::*;
use colored::Colorize;
use log::debug;
use options::{CheckOptions, OutputOptions, RecheckConfig};
use qfbv_ir::SatVerdict;
use recheck::recheck_file;
use simplelog::{ConfigBuilder, WriteLogger};

mod options;
mod recheck;

/// Exit status for usage errors, failures and indeterminate verdicts.
const EXIT_FAILURE: i32 = -1;

#[derive(Parser)]
#[clap(
    name = env!("CARGO_BIN_NAME"),
    about = "Re-checks an SMT-LIB2 bit-vector benchmark by translating it into a QF_BV term graph. Exits with 1 if the formula is satisfiable, 0 if it is unsatisfiable and -1 otherwise",
    rename_all = "kebab-case",
    author,
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Args {
    /// SMT-LIB2 benchmark to check
    #[clap(value_name = "FILE")]
    pub file: PathBuf,

    /// TOML file with default settings, overridden by flags
    #[clap(long = "config", short = 'c', env = "SMT_RECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Check options
    #[clap(flatten)]
    pub check_options: CheckOptions,

    /// Output options
    #[clap(flatten)]
    pub output_options: OutputOptions,
}

fn fail(err: anyhow::Error) -> ! {
    let err = format!("{:?}", err);
    eprintln!("{}", err.bold().red());
    std::process::exit(EXIT_FAILURE);
}

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).unwrap();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(EXIT_FAILURE);
        }
        // --help and --version
        Err(err) => err.exit(),
    };

    let mut config = match &args.config {
        Some(path) => RecheckConfig::from_file(path).unwrap_or_else(|err| fail(err)),
        None => RecheckConfig::default(),
    };
    config.apply(&args.check_options, &args.output_options);

    let log_config = ConfigBuilder::new().set_time_level(log::LevelFilter::Off).build();
    let _ = WriteLogger::init(config.verbosity_level, log_config, std::io::stderr());
    debug!("{} version {}", env!("CARGO_BIN_NAME"), env!("CARGO_PKG_VERSION"));

    let outcome = recheck_file(&args.file, &config).unwrap_or_else(|err| fail(err));
    println!("{}", outcome.verdict);
    if outcome.is_mismatch() {
        if let Some(expected) = outcome.expected {
            eprintln!(
                "{}",
                format!(
                    "verdict mismatch: `{}` declares status {expected}, but the check returned {}",
                    args.file.display(),
                    outcome.verdict
                )
                .yellow()
            );
        }
    }

    std::process::exit(match outcome.verdict {
        SatVerdict::Sat => 1,
        SatVerdict::Unsat => 0,
        SatVerdict::Unknown => EXIT_FAILURE,
    });
}
