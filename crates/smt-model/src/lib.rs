// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Source-side model of quantifier-free bit-vector formulas.
//!
//! A [`Formula`] is a hash-consed arena of typed nodes. Nodes are inspected
//! through [`Decl`], built through the checked constructors on [`Formula`] or
//! loaded from SMT-LIB2 text with [`smtlib::parse_script`].

pub mod decl;
pub mod eval;
pub mod formula;
pub mod kind;
pub mod literal;
pub mod smtlib;

pub use decl::Decl;
pub use formula::{Formula, NodeId, Sort};
pub use kind::{Kind, SortError};
pub use literal::LiteralError;
