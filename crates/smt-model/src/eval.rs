// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Reference semantics of quantifier-free bit-vector formulas.
//!
//! Values are limited to 128 bits. Division by zero, `bvsmod` and the signed
//! operators follow the SMT-LIB definitions.

use crate::formula::{Formula, NodeId, Sort};
use crate::kind::Kind;
use crate::literal::{self, LiteralError};
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(bool),
    Bv { width: u32, bits: u128 },
}

impl Value {
    pub fn bv(width: u32, bits: u128) -> Self {
        Value::Bv {
            width,
            bits: bits & mask(width),
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            Value::Bv { .. } => None,
        }
    }

    pub fn as_bv(self) -> Option<(u32, u128)> {
        match self {
            Value::Bv { width, bits } => Some((width, bits)),
            Value::Bool(_) => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Bv { width, bits } => write!(f, "#b{:0>w$b}", bits, w = *width as usize),
        }
    }
}

/// Assignment of free variables to values.
pub type Env = FxHashMap<NodeId, Value>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("variable `{0}` has no value")]
    Unbound(String),
    #[error("cannot evaluate `{0}`")]
    Unsupported(Kind),
    #[error("{0} is wider than 128 bits")]
    TooWide(Sort),
    #[error("{0} has no bits")]
    ZeroWidth(Sort),
    #[error("value {value} does not have sort {sort}")]
    SortMismatch { value: Value, sort: Sort },
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

fn mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

fn to_signed(bits: u128, width: u32) -> i128 {
    let shift = 128 - width;
    ((bits << shift) as i128) >> shift
}

fn msb(bits: u128, width: u32) -> bool {
    (bits >> (width - 1)) & 1 == 1
}

fn neg(bits: u128, width: u32) -> u128 {
    bits.wrapping_neg() & mask(width)
}

fn udiv(s: u128, t: u128, width: u32) -> u128 {
    if t == 0 {
        mask(width)
    } else {
        s / t
    }
}

fn urem(s: u128, t: u128) -> u128 {
    if t == 0 {
        s
    } else {
        s % t
    }
}

fn sdiv(s: u128, t: u128, w: u32) -> u128 {
    match (msb(s, w), msb(t, w)) {
        (false, false) => udiv(s, t, w),
        (true, false) => neg(udiv(neg(s, w), t, w), w),
        (false, true) => neg(udiv(s, neg(t, w), w), w),
        (true, true) => udiv(neg(s, w), neg(t, w), w),
    }
}

fn srem(s: u128, t: u128, w: u32) -> u128 {
    match (msb(s, w), msb(t, w)) {
        (false, false) => urem(s, t),
        (true, false) => neg(urem(neg(s, w), t), w),
        (false, true) => urem(s, neg(t, w)),
        (true, true) => neg(urem(neg(s, w), neg(t, w)), w),
    }
}

fn smod(s: u128, t: u128, w: u32) -> u128 {
    let (ms, mt) = (msb(s, w), msb(t, w));
    let abs_s = if ms { neg(s, w) } else { s };
    let abs_t = if mt { neg(t, w) } else { t };
    let u = urem(abs_s, abs_t);
    if u == 0 {
        return u;
    }
    match (ms, mt) {
        (false, false) => u,
        (true, false) => neg(u, w).wrapping_add(t) & mask(w),
        (false, true) => u.wrapping_add(t) & mask(w),
        (true, true) => neg(u, w),
    }
}

fn shl(s: u128, t: u128, w: u32) -> u128 {
    if t >= w as u128 {
        0
    } else {
        (s << t) & mask(w)
    }
}

fn lshr(s: u128, t: u128, w: u32) -> u128 {
    if t >= w as u128 {
        0
    } else {
        s >> t
    }
}

fn ashr(s: u128, t: u128, w: u32) -> u128 {
    let amount = t.min(w as u128 - 1) as u32;
    ((to_signed(s, w) >> amount) as u128) & mask(w)
}

fn rotl(s: u128, n: u32, w: u32) -> u128 {
    let n = n % w;
    if n == 0 {
        s
    } else {
        ((s << n) | (s >> (w - n))) & mask(w)
    }
}

fn rotr(s: u128, n: u32, w: u32) -> u128 {
    rotl(s, (w - n % w) % w, w)
}

/// Evaluates `root` under `env`.
pub fn evaluate(formula: &Formula, root: NodeId, env: &Env) -> Result<Value, EvalError> {
    let mut values: FxHashMap<NodeId, Value> = FxHashMap::default();
    for id in formula.post_order(root) {
        let value = evaluate_node(formula, id, env, &values)?;
        values.insert(id, value);
    }
    Ok(values[&root])
}

fn evaluate_node(
    formula: &Formula,
    id: NodeId,
    env: &Env,
    values: &FxHashMap<NodeId, Value>,
) -> Result<Value, EvalError> {
    use Kind::*;
    let decl = formula.decl(id);
    let sort = decl.sort();
    let width = match sort {
        Sort::BitVec(w) if w > 128 => return Err(EvalError::TooWide(sort)),
        Sort::BitVec(0) => return Err(EvalError::ZeroWidth(sort)),
        Sort::BitVec(w) => w,
        _ => 0,
    };
    let arg = |i: usize| values[&decl.args()[i]];
    let bool_arg = |i: usize| arg(i).as_bool().unwrap_or_default();
    let bv_arg = |i: usize| arg(i).as_bv().map(|(_, bits)| bits).unwrap_or_default();
    let arg_width = |i: usize| formula.sort(decl.args()[i]).bv_width().unwrap_or_default();
    let bv = |bits: u128| Value::bv(width, bits);
    let bit = |b: bool| Value::bv(1, b as u128);

    let value = match decl.kind() {
        True => Value::Bool(true),
        False => Value::Bool(false),
        BvNumeral => {
            let bits = literal::decode(decl.numeral().unwrap_or_default(), width)?;
            // hex numerals may carry more digits than the sort; keep the low bits
            let low = &bits[bits.len().saturating_sub(128)..];
            bv(u128::from_str_radix(low, 2).unwrap_or_default())
        }
        Variable => {
            let name = decl.name().unwrap_or_default();
            let value = *env
                .get(&id)
                .ok_or_else(|| EvalError::Unbound(name.to_string()))?;
            let fits = match (value, sort) {
                (Value::Bool(_), Sort::Bool) => true,
                (Value::Bv { width: w, .. }, Sort::BitVec(s)) => w == s,
                _ => false,
            };
            if !fits {
                return Err(EvalError::SortMismatch { value, sort });
            }
            value
        }
        Eq | Iff => Value::Bool(arg(0) == arg(1)),
        Distinct => {
            let args: Vec<Value> = (0..decl.arity()).map(arg).collect();
            let all_different = args
                .iter()
                .enumerate()
                .all(|(i, a)| args[i + 1..].iter().all(|b| a != b));
            Value::Bool(all_different)
        }
        Ite => {
            if bool_arg(0) {
                arg(1)
            } else {
                arg(2)
            }
        }
        And => Value::Bool((0..decl.arity()).all(bool_arg)),
        Or => Value::Bool((0..decl.arity()).any(bool_arg)),
        Xor => Value::Bool(bool_arg(0) != bool_arg(1)),
        Not => Value::Bool(!bool_arg(0)),
        Implies => Value::Bool(!bool_arg(0) || bool_arg(1)),

        BvNeg => bv(neg(bv_arg(0), width)),
        BvAdd => bv(bv_arg(0).wrapping_add(bv_arg(1))),
        BvSub => bv(bv_arg(0).wrapping_sub(bv_arg(1))),
        BvMul => bv(bv_arg(0).wrapping_mul(bv_arg(1))),
        BvUDiv => bv(udiv(bv_arg(0), bv_arg(1), width)),
        BvURem => bv(urem(bv_arg(0), bv_arg(1))),
        BvSDiv => bv(sdiv(bv_arg(0), bv_arg(1), width)),
        BvSRem => bv(srem(bv_arg(0), bv_arg(1), width)),
        BvSMod => bv(smod(bv_arg(0), bv_arg(1), width)),
        BvUDiv0 => bv(udiv(bv_arg(0), 0, width)),
        BvURem0 => bv(urem(bv_arg(0), 0)),
        BvSDiv0 => bv(sdiv(bv_arg(0), 0, width)),
        BvSRem0 => bv(srem(bv_arg(0), 0, width)),
        BvSMod0 => bv(smod(bv_arg(0), 0, width)),

        BvULe => Value::Bool(bv_arg(0) <= bv_arg(1)),
        BvULt => Value::Bool(bv_arg(0) < bv_arg(1)),
        BvUGe => Value::Bool(bv_arg(0) >= bv_arg(1)),
        BvUGt => Value::Bool(bv_arg(0) > bv_arg(1)),
        BvSLe | BvSLt | BvSGe | BvSGt => {
            let w = arg_width(0);
            let (s, t) = (to_signed(bv_arg(0), w), to_signed(bv_arg(1), w));
            Value::Bool(match decl.kind() {
                BvSLe => s <= t,
                BvSLt => s < t,
                BvSGe => s >= t,
                _ => s > t,
            })
        }

        BvAnd => bv(bv_arg(0) & bv_arg(1)),
        BvOr => bv(bv_arg(0) | bv_arg(1)),
        BvXor => bv(bv_arg(0) ^ bv_arg(1)),
        BvNot => bv(!bv_arg(0)),
        BvNand => bv(!(bv_arg(0) & bv_arg(1))),
        BvNor => bv(!(bv_arg(0) | bv_arg(1))),
        BvXnor => bv(!(bv_arg(0) ^ bv_arg(1))),

        Concat => bv((bv_arg(0) << arg_width(1)) | bv_arg(1)),
        ZeroExt => bv(bv_arg(0)),
        SignExt => bv(to_signed(bv_arg(0), arg_width(0)) as u128),
        Extract => {
            let lo = decl.lo().unwrap_or_default();
            bv(bv_arg(0) >> lo)
        }
        Repeat => {
            let w = arg_width(0);
            let count = decl.int_param(0).unwrap_or(1);
            bv((0..count).fold(0u128, |acc, _| (acc << w) | bv_arg(0)))
        }
        BvRedOr => bit(bv_arg(0) != 0),
        BvRedAnd => bit(bv_arg(0) == mask(arg_width(0))),
        BvComp => bit(bv_arg(0) == bv_arg(1)),

        BvShl => bv(shl(bv_arg(0), bv_arg(1), width)),
        BvLShr => bv(lshr(bv_arg(0), bv_arg(1), width)),
        BvAShr => bv(ashr(bv_arg(0), bv_arg(1), width)),
        RotateLeft => bv(rotl(bv_arg(0), decl.int_param(0).unwrap_or_default(), width)),
        RotateRight => bv(rotr(bv_arg(0), decl.int_param(0).unwrap_or_default(), width)),
        ExtRotateLeft => bv(rotl(bv_arg(0), (bv_arg(1) % width as u128) as u32, width)),
        ExtRotateRight => bv(rotr(bv_arg(0), (bv_arg(1) % width as u128) as u32, width)),

        kind @ (IntNumeral | IntAdd | IntSub | IntMul | IntNeg | IntLe | IntLt | IntGe | IntGt
        | Bv2Nat | Nat2Bv | Apply | Forall | Exists | Bound) => {
            return Err(EvalError::Unsupported(kind))
        }
    };
    Ok(value)
}
