// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Construction interface of the target representation.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    BvNot,
    BvNeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// equality of booleans or of equally wide bit-vectors
    Equal,
    And,
    Or,
    Xor,
    Implies,
    BvAdd,
    BvSub,
    BvMul,
    BvUDiv,
    BvSDiv,
    BvURem,
    BvSRem,
    BvULe,
    BvSLe,
    BvUGe,
    BvSGe,
    BvULt,
    BvSLt,
    BvUGt,
    BvSGt,
    BvAnd,
    BvOr,
    BvXor,
    BvNand,
    BvNor,
    BvXnor,
    Concat,
    BvComp,
    BvShl,
    BvLShr,
    BvAShr,
}

impl UnaryOp {
    pub fn smt_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::BvNot => "bvnot",
            UnaryOp::BvNeg => "bvneg",
        }
    }
}

impl BinaryOp {
    pub fn smt_name(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Equal => "=",
            And => "and",
            Or => "or",
            Xor => "xor",
            Implies => "=>",
            BvAdd => "bvadd",
            BvSub => "bvsub",
            BvMul => "bvmul",
            BvUDiv => "bvudiv",
            BvSDiv => "bvsdiv",
            BvURem => "bvurem",
            BvSRem => "bvsrem",
            BvULe => "bvule",
            BvSLe => "bvsle",
            BvUGe => "bvuge",
            BvSGe => "bvsge",
            BvULt => "bvult",
            BvSLt => "bvslt",
            BvUGt => "bvugt",
            BvSGt => "bvsgt",
            BvAnd => "bvand",
            BvOr => "bvor",
            BvXor => "bvxor",
            BvNand => "bvnand",
            BvNor => "bvnor",
            BvXnor => "bvxnor",
            Concat => "concat",
            BvComp => "bvcomp",
            BvShl => "bvshl",
            BvLShr => "bvlshr",
            BvAShr => "bvashr",
        }
    }

    /// Operators whose operands are booleans.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor | BinaryOp::Implies
        )
    }

    /// Operators that produce a boolean.
    pub fn is_predicate(self) -> bool {
        use BinaryOp::*;
        self.is_boolean()
            || matches!(
                self,
                Equal | BvULe | BvSLe | BvUGe | BvSGe | BvULt | BvSLt | BvUGt | BvSGt
            )
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.smt_name())
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.smt_name())
    }
}

/// Imperative construction of target terms.
///
/// Handles are opaque to callers and only ever passed back into the builder.
/// Every method expects operands of the sorts SMT-LIB prescribes for the
/// operator; callers are responsible for sort-correct construction.
pub trait TargetBuilder {
    type Handle: Clone;

    fn bool_lit(&mut self, value: bool) -> Self::Handle;
    /// Bit-vector literal from `0`/`1` digits, most significant bit first.
    fn bv_bin(&mut self, bits: &str) -> Self::Handle;
    /// Fresh boolean variable. `name` is a hint, the builder may rename it.
    fn new_bool(&mut self, name: &str) -> Self::Handle;
    /// Fresh bit-vector variable. `name` is a hint, the builder may rename it.
    fn new_bv(&mut self, name: &str, width: u32) -> Self::Handle;

    fn unary(&mut self, op: UnaryOp, a: Self::Handle) -> Self::Handle;
    fn binary(&mut self, op: BinaryOp, a: Self::Handle, b: Self::Handle) -> Self::Handle;
    fn ite(&mut self, cond: Self::Handle, then: Self::Handle, els: Self::Handle) -> Self::Handle;
    fn extract(&mut self, hi: u32, lo: u32, a: Self::Handle) -> Self::Handle;
    fn zero_extend(&mut self, by: u32, a: Self::Handle) -> Self::Handle;
    fn sign_extend(&mut self, by: u32, a: Self::Handle) -> Self::Handle;

    /// Adds a boolean term to the asserted formulas.
    fn assert(&mut self, formula: Self::Handle);
}
