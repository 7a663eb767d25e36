// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Operator kinds of the formula model and their sort signatures.

use crate::formula::Sort;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Operator tag of a formula node.
///
/// Every kind has a stable numeric [`code`](Kind::code), grouped by theory, which
/// is what error reports print next to the kind name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Kind {
    // leaves
    True = 0x100,
    False,
    BvNumeral,
    IntNumeral,
    Variable,

    // core boolean theory
    Eq = 0x200,
    Distinct,
    Ite,
    And,
    Or,
    Iff,
    Xor,
    Not,
    Implies,

    // bit-vector arithmetic
    BvNeg = 0x400,
    BvAdd,
    BvSub,
    BvMul,
    BvSDiv,
    BvUDiv,
    BvSRem,
    BvURem,
    BvSMod,
    BvSDiv0,
    BvUDiv0,
    BvSRem0,
    BvURem0,
    BvSMod0,

    // bit-vector comparison
    BvULe = 0x420,
    BvSLe,
    BvUGe,
    BvSGe,
    BvULt,
    BvSLt,
    BvUGt,
    BvSGt,

    // bit-vector bitwise
    BvAnd = 0x440,
    BvOr,
    BvNot,
    BvXor,
    BvNand,
    BvNor,
    BvXnor,

    // bit-vector structure
    Concat = 0x460,
    SignExt,
    ZeroExt,
    Extract,
    Repeat,
    BvRedOr,
    BvRedAnd,
    BvComp,

    // shifts and rotates
    BvShl = 0x480,
    BvLShr,
    BvAShr,
    RotateLeft,
    RotateRight,
    ExtRotateLeft,
    ExtRotateRight,

    // integers and conversions
    IntAdd = 0x500,
    IntSub,
    IntMul,
    IntNeg,
    IntLe,
    IntLt,
    IntGe,
    IntGt,
    Bv2Nat,
    Nat2Bv,

    /// application of a declared, uninterpreted function
    Apply = 0x600,

    // binders
    Forall = 0x700,
    Exists,
    Bound,
}

impl Kind {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// The SMT-LIB symbol of this kind.
    pub fn name(self) -> &'static str {
        use Kind::*;
        match self {
            True => "true",
            False => "false",
            BvNumeral => "bv-numeral",
            IntNumeral => "int-numeral",
            Variable => "variable",
            Eq => "=",
            Distinct => "distinct",
            Ite => "ite",
            And => "and",
            Or => "or",
            Iff => "iff",
            Xor => "xor",
            Not => "not",
            Implies => "=>",
            BvNeg => "bvneg",
            BvAdd => "bvadd",
            BvSub => "bvsub",
            BvMul => "bvmul",
            BvSDiv => "bvsdiv",
            BvUDiv => "bvudiv",
            BvSRem => "bvsrem",
            BvURem => "bvurem",
            BvSMod => "bvsmod",
            BvSDiv0 => "bvsdiv0",
            BvUDiv0 => "bvudiv0",
            BvSRem0 => "bvsrem0",
            BvURem0 => "bvurem0",
            BvSMod0 => "bvsmod0",
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
            BvNot => "bvnot",
            BvXor => "bvxor",
            BvNand => "bvnand",
            BvNor => "bvnor",
            BvXnor => "bvxnor",
            Concat => "concat",
            SignExt => "sign_extend",
            ZeroExt => "zero_extend",
            Extract => "extract",
            Repeat => "repeat",
            BvRedOr => "bvredor",
            BvRedAnd => "bvredand",
            BvComp => "bvcomp",
            BvShl => "bvshl",
            BvLShr => "bvlshr",
            BvAShr => "bvashr",
            RotateLeft => "rotate_left",
            RotateRight => "rotate_right",
            ExtRotateLeft => "ext_rotate_left",
            ExtRotateRight => "ext_rotate_right",
            IntAdd => "+",
            IntSub => "-",
            IntMul => "*",
            IntNeg => "-",
            IntLe => "<=",
            IntLt => "<",
            IntGe => ">=",
            IntGt => ">",
            Bv2Nat => "bv2nat",
            Nat2Bv => "nat2bv",
            Apply => "apply",
            Forall => "forall",
            Exists => "exists",
            Bound => "bound-variable",
        }
    }

    /// Number of integer parameters an application of this kind carries.
    pub fn param_count(self) -> usize {
        use Kind::*;
        match self {
            Extract => 2,
            SignExt | ZeroExt | Repeat | RotateLeft | RotateRight | Nat2Bv => 1,
            _ => 0,
        }
    }

    /// Kinds that are created through dedicated constructors instead of [`Kind::result_sort`].
    pub fn is_leaf_or_binder(self) -> bool {
        use Kind::*;
        matches!(
            self,
            True | False | BvNumeral | IntNumeral | Variable | Apply | Forall | Exists | Bound
        )
    }

    fn fits(self, width: Option<u32>) -> Result<u32, SortError> {
        width.ok_or_else(|| SortError::Invalid {
            kind: self,
            reason: format!("result width exceeds {} bits", u32::MAX),
        })
    }

    /// Checks arity, parameters and operand sorts of an application and computes its sort.
    pub fn result_sort(self, params: &[u32], args: &[Sort]) -> Result<Sort, SortError> {
        use Kind::*;
        if self.is_leaf_or_binder() {
            return Err(SortError::NotAnOperator(self));
        }
        if params.len() != self.param_count() {
            return Err(SortError::Params {
                kind: self,
                expected: self.param_count(),
                found: params.len(),
            });
        }
        let sig = Signature { kind: self, args };
        match self {
            Eq | Distinct => {
                sig.at_least(2)?;
                sig.all_same()?;
                Ok(Sort::Bool)
            }
            Ite => {
                sig.exactly(3)?;
                sig.boolean(0)?;
                if args[1] != args[2] {
                    return Err(sig.operand(2, args[1].to_string()));
                }
                Ok(args[1])
            }
            And | Or => {
                sig.at_least(1)?;
                sig.all_boolean()?;
                Ok(Sort::Bool)
            }
            Iff | Xor | Implies => {
                sig.exactly(2)?;
                sig.all_boolean()?;
                Ok(Sort::Bool)
            }
            Not => {
                sig.exactly(1)?;
                sig.boolean(0)?;
                Ok(Sort::Bool)
            }
            BvNeg | BvNot | BvSDiv0 | BvUDiv0 | BvSRem0 | BvURem0 | BvSMod0 => {
                sig.exactly(1)?;
                Ok(Sort::BitVec(sig.width(0)?))
            }
            BvAdd | BvSub | BvMul | BvSDiv | BvUDiv | BvSRem | BvURem | BvSMod | BvAnd | BvOr
            | BvXor | BvNand | BvNor | BvXnor | BvShl | BvLShr | BvAShr | ExtRotateLeft
            | ExtRotateRight => Ok(Sort::BitVec(sig.same_width_pair()?)),
            BvULe | BvSLe | BvUGe | BvSGe | BvULt | BvSLt | BvUGt | BvSGt => {
                sig.same_width_pair()?;
                Ok(Sort::Bool)
            }
            BvComp => {
                sig.same_width_pair()?;
                Ok(Sort::BitVec(1))
            }
            Concat => {
                sig.exactly(2)?;
                let width = sig.width(0)?.checked_add(sig.width(1)?);
                Ok(Sort::BitVec(self.fits(width)?))
            }
            SignExt | ZeroExt => {
                sig.exactly(1)?;
                let width = sig.width(0)?.checked_add(params[0]);
                Ok(Sort::BitVec(self.fits(width)?))
            }
            Extract => {
                sig.exactly(1)?;
                let width = sig.width(0)?;
                let (hi, lo) = (params[0], params[1]);
                if hi < lo || hi >= width {
                    return Err(SortError::Invalid {
                        kind: self,
                        reason: format!("bounds [{hi}:{lo}] do not fit a {width}-bit operand"),
                    });
                }
                Ok(Sort::BitVec(hi - lo + 1))
            }
            Repeat => {
                sig.exactly(1)?;
                if params[0] == 0 {
                    return Err(SortError::Invalid {
                        kind: self,
                        reason: "repeat count must be at least 1".to_string(),
                    });
                }
                let width = sig.width(0)?.checked_mul(params[0]);
                Ok(Sort::BitVec(self.fits(width)?))
            }
            BvRedOr | BvRedAnd => {
                sig.exactly(1)?;
                sig.width(0)?;
                Ok(Sort::BitVec(1))
            }
            RotateLeft | RotateRight => {
                sig.exactly(1)?;
                Ok(Sort::BitVec(sig.width(0)?))
            }
            IntAdd | IntSub | IntMul => {
                sig.at_least(2)?;
                sig.all_int()?;
                Ok(Sort::Int)
            }
            IntNeg => {
                sig.exactly(1)?;
                sig.all_int()?;
                Ok(Sort::Int)
            }
            IntLe | IntLt | IntGe | IntGt => {
                sig.exactly(2)?;
                sig.all_int()?;
                Ok(Sort::Bool)
            }
            Bv2Nat => {
                sig.exactly(1)?;
                sig.width(0)?;
                Ok(Sort::Int)
            }
            Nat2Bv => {
                sig.exactly(1)?;
                sig.all_int()?;
                if params[0] == 0 {
                    return Err(SortError::Invalid {
                        kind: self,
                        reason: "bit-vector width must be at least 1".to_string(),
                    });
                }
                Ok(Sort::BitVec(params[0]))
            }
            True | False | BvNumeral | IntNumeral | Variable | Apply | Forall | Exists | Bound => {
                Err(SortError::NotAnOperator(self))
            }
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ill-formed operator application.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error("`{kind}` expects {expected} argument(s) but got {found}")]
    Arity {
        kind: Kind,
        expected: String,
        found: usize,
    },
    #[error("`{kind}` expects {expected} integer parameter(s) but got {found}")]
    Params {
        kind: Kind,
        expected: usize,
        found: usize,
    },
    #[error("`{kind}`: argument {index} has sort {found}, expected {expected}")]
    Operand {
        kind: Kind,
        index: usize,
        found: Sort,
        expected: String,
    },
    #[error("`{kind}`: {reason}")]
    Invalid { kind: Kind, reason: String },
    #[error("`{0}` is not an operator application")]
    NotAnOperator(Kind),
}

struct Signature<'a> {
    kind: Kind,
    args: &'a [Sort],
}

impl Signature<'_> {
    fn exactly(&self, n: usize) -> Result<(), SortError> {
        if self.args.len() == n {
            Ok(())
        } else {
            Err(SortError::Arity {
                kind: self.kind,
                expected: n.to_string(),
                found: self.args.len(),
            })
        }
    }

    fn at_least(&self, n: usize) -> Result<(), SortError> {
        if self.args.len() >= n {
            Ok(())
        } else {
            Err(SortError::Arity {
                kind: self.kind,
                expected: format!("at least {n}"),
                found: self.args.len(),
            })
        }
    }

    fn operand(&self, index: usize, expected: String) -> SortError {
        SortError::Operand {
            kind: self.kind,
            index,
            found: self.args[index],
            expected,
        }
    }

    fn boolean(&self, index: usize) -> Result<(), SortError> {
        match self.args[index] {
            Sort::Bool => Ok(()),
            _ => Err(self.operand(index, "Bool".to_string())),
        }
    }

    fn all_boolean(&self) -> Result<(), SortError> {
        (0..self.args.len()).try_for_each(|i| self.boolean(i))
    }

    fn all_int(&self) -> Result<(), SortError> {
        match self.args.iter().position(|s| *s != Sort::Int) {
            Some(index) => Err(self.operand(index, "Int".to_string())),
            None => Ok(()),
        }
    }

    fn all_same(&self) -> Result<(), SortError> {
        let first = self.args[0];
        match self.args.iter().position(|s| *s != first) {
            Some(index) => Err(self.operand(index, first.to_string())),
            None => Ok(()),
        }
    }

    fn width(&self, index: usize) -> Result<u32, SortError> {
        match self.args[index] {
            Sort::BitVec(w) => Ok(w),
            _ => Err(self.operand(index, "a bit-vector".to_string())),
        }
    }

    fn same_width_pair(&self) -> Result<u32, SortError> {
        self.exactly(2)?;
        let width = self.width(0)?;
        if self.width(1)? != width {
            return Err(self.operand(1, Sort::BitVec(width).to_string()));
        }
        Ok(width)
    }
}
