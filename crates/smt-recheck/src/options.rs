// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use clap::{Args, ValueEnum};
use log::LevelFilter;
use qfbv_ir::check::{Enumerator, SmtLibSolver, MAX_ENUMERATION_BITS};
use qfbv_ir::SatChecker;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Check options
#[derive(Args, Debug, Default)]
#[clap(next_help_heading = "Check Options")]
pub struct CheckOptions {
    /// Satisfiability checker for the translated formula [default: builtin]
    #[clap(name = "solver", long, short = 's')]
    pub solver: Option<SolverChoice>,

    /// Largest number of variable bits the builtin checker enumerates [default: 20]
    #[clap(name = "max-enum-bits", long)]
    pub max_enum_bits: Option<u32>,

    /// Disable constant folding in the target
    #[clap(name = "no-fold", long)]
    pub no_fold: bool,
}

/// Output options
#[derive(Args, Debug, Default)]
#[clap(next_help_heading = "Output Options")]
pub struct OutputOptions {
    /// Write the translated formula as an SMT-LIB2 script
    #[clap(name = "dump-smt2", long, value_name = "PATH")]
    pub dump_smt2: Option<PathBuf>,

    /// Log every translated node
    #[clap(name = "verbose", long, short = 'v')]
    pub verbose: bool,
}

#[derive(ValueEnum, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolverChoice {
    #[default]
    Builtin,
    Z3,
    Bitwuzla,
    Yices,
    Cvc5,
    Boolector,
}

impl Display for SolverChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverChoice::Builtin => write!(f, "builtin"),
            SolverChoice::Z3 => write!(f, "z3"),
            SolverChoice::Bitwuzla => write!(f, "bitwuzla"),
            SolverChoice::Yices => write!(f, "yices"),
            SolverChoice::Cvc5 => write!(f, "cvc5"),
            SolverChoice::Boolector => write!(f, "boolector"),
        }
    }
}

/// Settings of one re-check run. Read from a toml file, then overridden by
/// command line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecheckConfig {
    pub solver: SolverChoice,
    /// Enumeration budget of the builtin checker, in variable bits.
    pub max_enum_bits: u32,
    /// Constant folding in the target term graph.
    pub fold: bool,
    pub dump_smt2: Option<PathBuf>,
    pub verbosity_level: LevelFilter,
}

impl Default for RecheckConfig {
    fn default() -> Self {
        Self {
            solver: SolverChoice::Builtin,
            max_enum_bits: Enumerator::default().max_bits,
            fold: true,
            dump_smt2: None,
            verbosity_level: LevelFilter::Info,
        }
    }
}

impl RecheckConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config `{}`", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config `{}`", path.display()))
    }

    /// Overlays the flags that were given on the command line.
    pub fn apply(&mut self, check: &CheckOptions, output: &OutputOptions) {
        if let Some(solver) = check.solver {
            self.solver = solver;
        }
        if let Some(bits) = check.max_enum_bits {
            self.max_enum_bits = bits;
        }
        if check.no_fold {
            self.fold = false;
        }
        if let Some(path) = &output.dump_smt2 {
            self.dump_smt2 = Some(path.clone());
        }
        if output.verbose {
            self.verbosity_level = LevelFilter::Trace;
        }
    }

    pub fn checker(&self) -> anyhow::Result<Box<dyn SatChecker>> {
        let name = match self.solver {
            SolverChoice::Builtin => {
                anyhow::ensure!(
                    self.max_enum_bits <= MAX_ENUMERATION_BITS,
                    "--max-enum-bits must be at most {MAX_ENUMERATION_BITS}"
                );
                return Ok(Box::new(Enumerator::new(self.max_enum_bits)));
            }
            other => other.to_string(),
        };
        let solver = SmtLibSolver::by_name(&name)
            .with_context(|| format!("no solver preset named `{name}`"))?;
        Ok(Box::new(solver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_toml() {
        let config: RecheckConfig = toml::from_str(
            r#"
            solver = "z3"
            max_enum_bits = 12
            verbosity_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.solver, SolverChoice::Z3);
        assert_eq!(config.max_enum_bits, 12);
        assert!(config.fold);
        assert_eq!(config.verbosity_level, LevelFilter::Debug);
        assert!(toml::from_str::<RecheckConfig>("timeout = 3").is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut config = RecheckConfig {
            solver: SolverChoice::Cvc5,
            ..Default::default()
        };
        config.apply(
            &CheckOptions {
                solver: None,
                max_enum_bits: Some(8),
                no_fold: true,
            },
            &OutputOptions {
                dump_smt2: None,
                verbose: true,
            },
        );
        assert_eq!(config.solver, SolverChoice::Cvc5);
        assert_eq!(config.max_enum_bits, 8);
        assert!(!config.fold);
        assert_eq!(config.verbosity_level, LevelFilter::Trace);
    }

    #[test]
    fn checker_names() {
        for choice in SolverChoice::value_variants() {
            let config = RecheckConfig {
                solver: *choice,
                ..Default::default()
            };
            assert_eq!(config.checker().unwrap().name(), choice.to_string());
        }
        let too_wide = RecheckConfig {
            max_enum_bits: 64,
            ..Default::default()
        };
        assert!(too_wide.checker().is_err());
    }
}
