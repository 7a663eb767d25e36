// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translates [`smt_model::Formula`] DAGs into any [`qfbv_ir::TargetBuilder`].
//!
//! Supported are the boolean connectives and the fixed-width bit-vector
//! operators of SMT-LIB `QF_BV`. Integer arithmetic, quantifiers,
//! uninterpreted functions and the few bit-vector kinds without a target
//! construction are reported as [`TranslateError::Unsupported`].

mod error;
mod translate;

pub use error::TranslateError;
pub use translate::{translate, translate_and_assert, Translator};
