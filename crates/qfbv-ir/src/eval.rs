// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Evaluation of terms under a model.

use crate::builder::{BinaryOp, UnaryOp};
use crate::graph::{Term, TermGraph, TermRef, TermSort};
use crate::value::BvValue;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermValue {
    Bool(bool),
    Bv(BvValue),
}

impl TermValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TermValue::Bool(b) => Some(*b),
            TermValue::Bv(_) => None,
        }
    }

    pub fn as_bv(&self) -> Option<&BvValue> {
        match self {
            TermValue::Bv(v) => Some(v),
            TermValue::Bool(_) => None,
        }
    }

    pub fn sort(&self) -> TermSort {
        match self {
            TermValue::Bool(_) => TermSort::Bool,
            TermValue::Bv(v) => TermSort::BitVec(v.width()),
        }
    }
}

impl Display for TermValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TermValue::Bool(b) => write!(f, "{b}"),
            TermValue::Bv(v) => write!(f, "{v}"),
        }
    }
}

/// Values of variables.
pub type Model = FxHashMap<TermRef, TermValue>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("variable `{0}` has no value")]
    Unassigned(String),
    #[error("variable `{name}` has sort {expected} but was assigned {value}")]
    WrongSort {
        name: String,
        expected: TermSort,
        value: TermValue,
    },
    #[error("operands of `{0}` have unexpected sorts")]
    IllSorted(String),
}

pub(crate) fn unary_value(op: UnaryOp, a: &TermValue) -> Option<TermValue> {
    let value = match (op, a) {
        (UnaryOp::Not, TermValue::Bool(b)) => TermValue::Bool(!b),
        (UnaryOp::BvNot, TermValue::Bv(v)) => TermValue::Bv(v.not()),
        (UnaryOp::BvNeg, TermValue::Bv(v)) => TermValue::Bv(v.neg()),
        _ => return None,
    };
    Some(value)
}

pub(crate) fn binary_value(op: BinaryOp, a: &TermValue, b: &TermValue) -> Option<TermValue> {
    use BinaryOp::*;
    if op == Equal {
        return (a.sort() == b.sort()).then(|| TermValue::Bool(a == b));
    }
    if op.is_boolean() {
        let (a, b) = (a.as_bool()?, b.as_bool()?);
        let value = match op {
            And => a && b,
            Or => a || b,
            Xor => a != b,
            _ => !a || b,
        };
        return Some(TermValue::Bool(value));
    }
    let (a, b) = (a.as_bv()?, b.as_bv()?);
    if op != Concat && a.width() != b.width() {
        return None;
    }
    let predicate = |holds: bool| Some(TermValue::Bool(holds));
    let bv = |v: BvValue| Some(TermValue::Bv(v));
    match op {
        BvAdd => bv(a.add(b)),
        BvSub => bv(a.sub(b)),
        BvMul => bv(a.mul(b)),
        BvUDiv => bv(a.udiv(b)),
        BvSDiv => bv(a.sdiv(b)),
        BvURem => bv(a.urem(b)),
        BvSRem => bv(a.srem(b)),
        BvULe => predicate(a.unsigned_cmp(b) != Ordering::Greater),
        BvULt => predicate(a.unsigned_cmp(b) == Ordering::Less),
        BvUGe => predicate(a.unsigned_cmp(b) != Ordering::Less),
        BvUGt => predicate(a.unsigned_cmp(b) == Ordering::Greater),
        BvSLe => predicate(a.signed_cmp(b) != Ordering::Greater),
        BvSLt => predicate(a.signed_cmp(b) == Ordering::Less),
        BvSGe => predicate(a.signed_cmp(b) != Ordering::Less),
        BvSGt => predicate(a.signed_cmp(b) == Ordering::Greater),
        BvAnd => bv(a.and(b)),
        BvOr => bv(a.or(b)),
        BvXor => bv(a.xor(b)),
        BvNand => bv(a.and(b).not()),
        BvNor => bv(a.or(b).not()),
        BvXnor => bv(a.xor(b).not()),
        Concat => bv(a.concat(b)),
        BvComp => bv(BvValue::from_u64((a == b) as u64, 1)),
        BvShl => bv(a.shl(b)),
        BvLShr => bv(a.lshr(b)),
        BvAShr => bv(a.ashr(b)),
        Equal | And | Or | Xor | Implies => None,
    }
}

/// Evaluates a fixed set of root terms under many models.
///
/// The terms reachable from the roots are collected once; every call to
/// [`Evaluator::run`] then evaluates them in arena order.
pub struct Evaluator<'g> {
    graph: &'g TermGraph,
    roots: Vec<TermRef>,
    reachable: Vec<TermRef>,
    values: Vec<Option<TermValue>>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g TermGraph, roots: &[TermRef]) -> Self {
        let mut marked = vec![false; graph.len()];
        for root in roots {
            marked[root.index()] = true;
        }
        // children have smaller indices, so one backwards sweep marks everything
        let mut reachable = vec![];
        for (index, term) in graph.terms().collect::<Vec<_>>().into_iter().rev() {
            if marked[index.index()] {
                reachable.push(index);
                for child in term.children() {
                    marked[child.index()] = true;
                }
            }
        }
        reachable.reverse();
        Self {
            graph,
            roots: roots.to_vec(),
            reachable,
            values: vec![None; graph.len()],
        }
    }

    /// Evaluates every reachable term and returns the values of the roots.
    pub fn run(&mut self, model: &Model) -> Result<Vec<TermValue>, EvalError> {
        for r in &self.reachable {
            let value = self.term_value(*r, model)?;
            self.values[r.index()] = Some(value);
        }
        Ok(self
            .roots
            .iter()
            .filter_map(|r| self.values[r.index()].clone())
            .collect())
    }

    fn operand(&self, r: TermRef) -> &TermValue {
        // operands precede their users in `reachable`
        match &self.values[r.index()] {
            Some(v) => v,
            None => unreachable!("{r} evaluated before its operands"),
        }
    }

    fn operand_bv(&self, r: TermRef, op: &str) -> Result<&BvValue, EvalError> {
        self.operand(r)
            .as_bv()
            .ok_or_else(|| EvalError::IllSorted(op.to_string()))
    }

    fn term_value(&self, r: TermRef, model: &Model) -> Result<TermValue, EvalError> {
        let value = match self.graph.term(r) {
            Term::Bool(b) => TermValue::Bool(*b),
            Term::Bv(v) => TermValue::Bv(v.clone()),
            Term::Var { name, sort } => {
                let value = model
                    .get(&r)
                    .ok_or_else(|| EvalError::Unassigned(name.to_string()))?;
                if value.sort() != *sort {
                    return Err(EvalError::WrongSort {
                        name: name.to_string(),
                        expected: *sort,
                        value: value.clone(),
                    });
                }
                value.clone()
            }
            Term::Unary(op, a) => unary_value(*op, self.operand(*a))
                .ok_or_else(|| EvalError::IllSorted(op.to_string()))?,
            Term::Binary(op, a, b) => binary_value(*op, self.operand(*a), self.operand(*b))
                .ok_or_else(|| EvalError::IllSorted(op.to_string()))?,
            Term::Ite(c, t, e) => match self.operand(*c).as_bool() {
                Some(true) => self.operand(*t).clone(),
                Some(false) => self.operand(*e).clone(),
                None => return Err(EvalError::IllSorted("ite".to_string())),
            },
            Term::Extract { hi, lo, arg } => {
                TermValue::Bv(self.operand_bv(*arg, "extract")?.extract(*hi, *lo))
            }
            Term::ZeroExtend { by, arg } => {
                TermValue::Bv(self.operand_bv(*arg, "zero_extend")?.zero_extend(*by))
            }
            Term::SignExtend { by, arg } => {
                TermValue::Bv(self.operand_bv(*arg, "sign_extend")?.sign_extend(*by))
            }
        };
        Ok(value)
    }
}

/// Value of `term` under `model`.
pub fn evaluate(graph: &TermGraph, term: TermRef, model: &Model) -> Result<TermValue, EvalError> {
    let mut evaluator = Evaluator::new(graph, &[term]);
    let mut values = evaluator.run(model)?;
    values
        .pop()
        .ok_or_else(|| EvalError::IllSorted(term.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TargetBuilder;

    #[test]
    fn evaluates_under_a_model() {
        let mut g = TermGraph::new();
        let x = g.new_bv("x", 4);
        let p = g.new_bool("p");
        let one = g.bv_bin("0001");
        let inc = g.binary(BinaryOp::BvAdd, x, one);
        let hi = g.extract(3, 2, inc);
        let wide = g.sign_extend(2, hi);
        let zero = g.bv_bin("0000");
        let pick = g.ite(p, wide, zero);

        let mut model = Model::default();
        model.insert(x, TermValue::Bv(BvValue::from_u64(0b1011, 4)));
        model.insert(p, TermValue::Bool(true));
        assert_eq!(
            evaluate(&g, pick, &model).unwrap(),
            TermValue::Bv(BvValue::from_u64(0b1111, 4))
        );
        model.insert(p, TermValue::Bool(false));
        assert_eq!(
            evaluate(&g, pick, &model).unwrap(),
            TermValue::Bv(BvValue::zero(4))
        );
    }

    #[test]
    fn missing_and_mistyped_variables() {
        let mut g = TermGraph::new();
        let x = g.new_bv("x", 4);
        let y = g.new_bv("y", 4);
        let lt = g.binary(BinaryOp::BvULt, x, y);
        let mut model = Model::default();
        model.insert(x, TermValue::Bv(BvValue::zero(4)));
        assert_eq!(
            evaluate(&g, lt, &model),
            Err(EvalError::Unassigned("y".to_string()))
        );
        model.insert(y, TermValue::Bool(false));
        assert!(matches!(
            evaluate(&g, lt, &model),
            Err(EvalError::WrongSort { .. })
        ));
        // unreachable variables need no value
        assert!(evaluate(&g, x, &model).is_ok());
    }
}
