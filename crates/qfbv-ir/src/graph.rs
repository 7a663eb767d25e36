// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! In-memory term graph implementing [`TargetBuilder`].

use crate::builder::{BinaryOp, TargetBuilder, UnaryOp};
use crate::eval::{binary_value, unary_value, TermValue};
use crate::value::BvValue;
use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::{Display, Formatter};

/// Handle of a term inside a [`TermGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermRef(u32);

impl TermRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for TermRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "t!{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermSort {
    Bool,
    BitVec(u32),
}

impl TermSort {
    pub fn width(self) -> Option<u32> {
        match self {
            TermSort::BitVec(w) => Some(w),
            TermSort::Bool => None,
        }
    }
}

impl Display for TermSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TermSort::Bool => write!(f, "Bool"),
            TermSort::BitVec(w) => write!(f, "(_ BitVec {w})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Bool(bool),
    Bv(BvValue),
    Var { name: Box<str>, sort: TermSort },
    Unary(UnaryOp, TermRef),
    Binary(BinaryOp, TermRef, TermRef),
    Ite(TermRef, TermRef, TermRef),
    Extract { hi: u32, lo: u32, arg: TermRef },
    ZeroExtend { by: u32, arg: TermRef },
    SignExtend { by: u32, arg: TermRef },
}

impl Term {
    pub fn children(&self) -> Vec<TermRef> {
        match self {
            Term::Bool(_) | Term::Bv(_) | Term::Var { .. } => vec![],
            Term::Unary(_, a)
            | Term::Extract { arg: a, .. }
            | Term::ZeroExtend { arg: a, .. }
            | Term::SignExtend { arg: a, .. } => vec![*a],
            Term::Binary(_, a, b) => vec![*a, *b],
            Term::Ite(c, t, e) => vec![*c, *t, *e],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Term::Bool(_) | Term::Bv(_) | Term::Var { .. })
    }
}

/// Hash-consed arena of target terms.
///
/// Operands are always allocated before the terms that use them, so iterating
/// the arena in index order visits children first. With constant folding
/// enabled (the default), operators applied to constants are evaluated
/// eagerly and only the resulting constant is stored.
#[derive(Debug, Clone)]
pub struct TermGraph {
    terms: Vec<(Term, TermSort)>,
    interned: FxHashMap<Term, TermRef>,
    names: FxHashSet<Box<str>>,
    variables: Vec<TermRef>,
    assertions: Vec<TermRef>,
    fold: bool,
}

impl Default for TermGraph {
    fn default() -> Self {
        Self::with_constant_folding(true)
    }
}

impl TermGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant_folding(fold: bool) -> Self {
        Self {
            terms: vec![],
            interned: FxHashMap::default(),
            names: FxHashSet::default(),
            variables: vec![],
            assertions: vec![],
            fold,
        }
    }

    pub fn folds_constants(&self) -> bool {
        self.fold
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term(&self, r: TermRef) -> &Term {
        &self.terms[r.index()].0
    }

    pub fn sort(&self, r: TermRef) -> TermSort {
        self.terms[r.index()].1
    }

    /// All terms in allocation order.
    pub fn terms(&self) -> impl Iterator<Item = (TermRef, &Term)> + '_ {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, (t, _))| (TermRef(i as u32), t))
    }

    /// Variables in order of creation.
    pub fn variables(&self) -> &[TermRef] {
        &self.variables
    }

    pub fn assertions(&self) -> &[TermRef] {
        &self.assertions
    }

    pub fn var_name(&self, r: TermRef) -> Option<&str> {
        match self.term(r) {
            Term::Var { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn constant(&self, r: TermRef) -> Option<TermValue> {
        match self.term(r) {
            Term::Bool(b) => Some(TermValue::Bool(*b)),
            Term::Bv(v) => Some(TermValue::Bv(v.clone())),
            _ => None,
        }
    }

    pub fn as_bool_const(&self, r: TermRef) -> Option<bool> {
        match self.term(r) {
            Term::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bv_const(&self, r: TermRef) -> Option<&BvValue> {
        match self.term(r) {
            Term::Bv(v) => Some(v),
            _ => None,
        }
    }

    fn intern(&mut self, term: Term, sort: TermSort) -> TermRef {
        if let Some(r) = self.interned.get(&term) {
            return *r;
        }
        let r = TermRef(self.terms.len() as u32);
        trace!("{r} = {term:?} : {sort}");
        self.terms.push((term.clone(), sort));
        self.interned.insert(term, r);
        r
    }

    fn intern_value(&mut self, value: TermValue) -> TermRef {
        match value {
            TermValue::Bool(b) => self.intern(Term::Bool(b), TermSort::Bool),
            TermValue::Bv(v) => {
                let sort = TermSort::BitVec(v.width());
                self.intern(Term::Bv(v), sort)
            }
        }
    }

    /// Picks an unused variable name that cannot clash with the `t!N` term names.
    fn fresh_name(&mut self, hint: &str) -> Box<str> {
        let base = if hint.is_empty() || hint.starts_with("t!") {
            format!("v{hint}")
        } else {
            hint.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 0;
        while self.names.contains(name.as_str()) {
            suffix += 1;
            name = format!("{base}!{suffix}");
        }
        let name: Box<str> = name.into();
        self.names.insert(name.clone());
        name
    }

    fn new_var(&mut self, hint: &str, sort: TermSort) -> TermRef {
        let name = self.fresh_name(hint);
        let r = self.intern(Term::Var { name, sort }, sort);
        self.variables.push(r);
        r
    }

    fn width(&self, r: TermRef) -> u32 {
        self.sort(r).width().unwrap_or_default()
    }

    fn fold_with(&self, operands: &[TermRef]) -> Option<Vec<TermValue>> {
        if !self.fold {
            return None;
        }
        operands.iter().map(|r| self.constant(*r)).collect()
    }
}

impl TargetBuilder for TermGraph {
    type Handle = TermRef;

    fn bool_lit(&mut self, value: bool) -> TermRef {
        self.intern(Term::Bool(value), TermSort::Bool)
    }

    /// # Panics
    ///
    /// If `bits` is empty or contains anything but `0` and `1`.
    fn bv_bin(&mut self, bits: &str) -> TermRef {
        match BvValue::from_bin(bits) {
            Some(v) => self.intern_value(TermValue::Bv(v)),
            None => panic!("`{bits}` is not a binary literal"),
        }
    }

    fn new_bool(&mut self, name: &str) -> TermRef {
        self.new_var(name, TermSort::Bool)
    }

    fn new_bv(&mut self, name: &str, width: u32) -> TermRef {
        self.new_var(name, TermSort::BitVec(width))
    }

    fn unary(&mut self, op: UnaryOp, a: TermRef) -> TermRef {
        if let Some(value) = self
            .fold_with(&[a])
            .and_then(|values| unary_value(op, &values[0]))
        {
            return self.intern_value(value);
        }
        let sort = match op {
            UnaryOp::Not => TermSort::Bool,
            UnaryOp::BvNot | UnaryOp::BvNeg => self.sort(a),
        };
        self.intern(Term::Unary(op, a), sort)
    }

    fn binary(&mut self, op: BinaryOp, a: TermRef, b: TermRef) -> TermRef {
        debug_assert!(
            op == BinaryOp::Concat || self.sort(a) == self.sort(b),
            "{op} applied to {} and {}",
            self.sort(a),
            self.sort(b)
        );
        if let Some(value) = self
            .fold_with(&[a, b])
            .and_then(|values| binary_value(op, &values[0], &values[1]))
        {
            return self.intern_value(value);
        }
        let sort = match op {
            _ if op.is_predicate() => TermSort::Bool,
            BinaryOp::Concat => TermSort::BitVec(self.width(a) + self.width(b)),
            BinaryOp::BvComp => TermSort::BitVec(1),
            _ => self.sort(a),
        };
        self.intern(Term::Binary(op, a, b), sort)
    }

    fn ite(&mut self, cond: TermRef, then: TermRef, els: TermRef) -> TermRef {
        if self.fold {
            match self.as_bool_const(cond) {
                Some(true) => return then,
                Some(false) => return els,
                None => {}
            }
        }
        let sort = self.sort(then);
        self.intern(Term::Ite(cond, then, els), sort)
    }

    fn extract(&mut self, hi: u32, lo: u32, a: TermRef) -> TermRef {
        debug_assert!(lo <= hi && hi < self.width(a));
        if self.fold {
            if let Some(v) = self.as_bv_const(a) {
                let v = v.extract(hi, lo);
                return self.intern_value(TermValue::Bv(v));
            }
        }
        self.intern(
            Term::Extract { hi, lo, arg: a },
            TermSort::BitVec(hi - lo + 1),
        )
    }

    fn zero_extend(&mut self, by: u32, a: TermRef) -> TermRef {
        if self.fold {
            if let Some(v) = self.as_bv_const(a) {
                let v = v.zero_extend(by);
                return self.intern_value(TermValue::Bv(v));
            }
        }
        let sort = TermSort::BitVec(self.width(a) + by);
        self.intern(Term::ZeroExtend { by, arg: a }, sort)
    }

    fn sign_extend(&mut self, by: u32, a: TermRef) -> TermRef {
        if self.fold {
            if let Some(v) = self.as_bv_const(a) {
                let v = v.sign_extend(by);
                return self.intern_value(TermValue::Bv(v));
            }
        }
        let sort = TermSort::BitVec(self.width(a) + by);
        self.intern(Term::SignExtend { by, arg: a }, sort)
    }

    fn assert(&mut self, formula: TermRef) {
        debug_assert_eq!(self.sort(formula), TermSort::Bool);
        self.assertions.push(formula);
    }
}
