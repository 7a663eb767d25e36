// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Loader for SMT-LIB2 benchmark scripts.
//!
//! Only the quantifier-free fragment needed to state bit-vector problems is
//! understood: declarations, definitions, assertions and the informational
//! commands around them. Quantified and integer terms are loaded as-is so that
//! later stages can report them.

mod lexer;
mod script;
mod sexpr;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub use script::{parse_script, Script};

/// Byte range in the loaded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LoadError {
    pub message: String,
    pub span: Span,
}

impl LoadError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn to_diagnostic<FileId: Copy>(&self, file_id: FileId) -> Diagnostic<FileId> {
        Diagnostic::error()
            .with_message(&self.message)
            .with_labels(vec![Label::primary(
                file_id,
                self.span.start..self.span.end,
            )])
    }
}

/// Expected answer declared by `(set-info :status ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Sat,
    Unsat,
    Unknown,
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sat" => Ok(Status::Sat),
            "unsat" => Ok(Status::Unsat),
            "unknown" => Ok(Status::Unknown),
            other => Err(format!("unknown status `{other}`")),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Sat => write!(f, "sat"),
            Status::Unsat => write!(f, "unsat"),
            Status::Unknown => write!(f, "unknown"),
        }
    }
}
