// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Satisfiability checking of the asserted formulas of a [`TermGraph`].

mod enumerate;
mod solver;

pub use enumerate::{Enumerator, MAX_ENUMERATION_BITS};
pub use solver::{SmtLibSolver, BITWUZLA, BOOLECTOR, CVC5, YICES2, Z3};

use crate::eval::EvalError;
use crate::graph::TermGraph;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Three-valued answer of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatVerdict {
    Sat,
    Unsat,
    /// the checker could not decide
    Unknown,
}

impl Display for SatVerdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SatVerdict::Sat => write!(f, "sat"),
            SatVerdict::Unsat => write!(f, "unsat"),
            SatVerdict::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to run `{0}`")]
    Spawn(String, #[source] std::io::Error),
    #[error("I/O with `{0}` failed")]
    Io(String, #[source] std::io::Error),
    #[error("{0} reported an error: {1}")]
    FromSolver(String, String),
    #[error("{0} returned an unexpected response: {1}")]
    UnexpectedResponse(String, String),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Decides satisfiability of the conjunction of all assertions of a graph.
pub trait SatChecker {
    fn name(&self) -> &str;

    fn check(&self, graph: &TermGraph) -> Result<SatVerdict, CheckError>;
}
