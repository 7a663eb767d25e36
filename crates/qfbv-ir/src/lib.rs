// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Target representation for re-checking bit-vector formulas.
//!
//! Terms are built through the [`TargetBuilder`] trait. [`TermGraph`] is the
//! in-memory implementation; it can be evaluated, written out as SMT-LIB2 and
//! handed to a [`check::SatChecker`].

pub mod builder;
pub mod check;
pub mod eval;
pub mod graph;
pub mod serialize;
pub mod value;

pub use builder::{BinaryOp, TargetBuilder, UnaryOp};
pub use check::{CheckError, SatChecker, SatVerdict};
pub use graph::{Term, TermGraph, TermRef, TermSort};
pub use value::BvValue;
