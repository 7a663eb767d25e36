// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Random formulas over small widths evaluate the same before and after translation.

use model_to_qfbv::Translator;
use qfbv_ir::eval::{evaluate as evaluate_target, Model, TermValue};
use qfbv_ir::{BvValue, TermGraph};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use smt_model::eval::{evaluate as evaluate_source, Env, Value};
use smt_model::{Formula, Kind, NodeId, Sort};

const MAX_WIDTH: u32 = 8;

const SAME_WIDTH: &[Kind] = &[
    Kind::BvAdd,
    Kind::BvSub,
    Kind::BvMul,
    Kind::BvUDiv,
    Kind::BvURem,
    Kind::BvSDiv,
    Kind::BvSRem,
    Kind::BvAnd,
    Kind::BvOr,
    Kind::BvXor,
    Kind::BvNand,
    Kind::BvNor,
    Kind::BvXnor,
    Kind::BvShl,
    Kind::BvLShr,
    Kind::BvAShr,
];

const COMPARISONS: &[Kind] = &[
    Kind::BvULe,
    Kind::BvSLe,
    Kind::BvUGe,
    Kind::BvSGe,
    Kind::BvULt,
    Kind::BvSLt,
    Kind::BvUGt,
    Kind::BvSGt,
];

struct Generator {
    rng: StdRng,
    formula: Formula,
    p: NodeId,
    q: NodeId,
    x: NodeId,
    y: NodeId,
}

impl Generator {
    fn new(seed: u64) -> Self {
        let mut formula = Formula::new();
        let p = formula.variable("p", Sort::Bool);
        let q = formula.variable("q", Sort::Bool);
        let x = formula.variable("x", Sort::BitVec(3));
        let y = formula.variable("y", Sort::BitVec(3));
        Self {
            rng: StdRng::seed_from_u64(seed),
            formula,
            p,
            q,
            x,
            y,
        }
    }

    fn app(&mut self, kind: Kind, params: &[u32], args: &[NodeId]) -> NodeId {
        self.formula
            .app_with_params(kind, params, args)
            .unwrap_or_else(|e| panic!("generated ill-sorted `{kind}`: {e}"))
    }

    fn bv_leaf(&mut self, width: u32) -> NodeId {
        let var = if self.rng.gen() { self.x } else { self.y };
        match (self.rng.gen_range(0..3), width) {
            (0, _) => {
                let value = self.rng.gen_range(0..1u128 << width);
                self.formula.bv_value(value, width)
            }
            (_, 3) => var,
            (_, w) if w < 3 => {
                let lo = self.rng.gen_range(0..=3 - w);
                self.app(Kind::Extract, &[lo + w - 1, lo], &[var])
            }
            (_, w) => {
                let kind = if self.rng.gen() {
                    Kind::ZeroExt
                } else {
                    Kind::SignExt
                };
                self.app(kind, &[w - 3], &[var])
            }
        }
    }

    fn bv(&mut self, width: u32, depth: u32) -> NodeId {
        if depth == 0 {
            return self.bv_leaf(width);
        }
        let d = depth - 1;
        match self.rng.gen_range(0..10) {
            0 | 1 | 2 => {
                let kind = *SAME_WIDTH.choose(&mut self.rng).unwrap();
                let (a, b) = (self.bv(width, d), self.bv(width, d));
                self.app(kind, &[], &[a, b])
            }
            3 => {
                let kind = if self.rng.gen() {
                    Kind::BvNeg
                } else {
                    Kind::BvNot
                };
                let a = self.bv(width, d);
                self.app(kind, &[], &[a])
            }
            4 => {
                let c = self.boolean(d);
                let (a, b) = (self.bv(width, d), self.bv(width, d));
                self.app(Kind::Ite, &[], &[c, a, b])
            }
            5 => {
                let kind = if self.rng.gen() {
                    Kind::RotateLeft
                } else {
                    Kind::RotateRight
                };
                let amount = self.rng.gen_range(0..2 * width);
                let a = self.bv(width, d);
                self.app(kind, &[amount], &[a])
            }
            6 if width >= 2 => {
                let k = self.rng.gen_range(1..width);
                let (a, b) = (self.bv(k, d), self.bv(width - k, d));
                self.app(Kind::Concat, &[], &[a, b])
            }
            7 if width >= 2 => {
                let k = self.rng.gen_range(1..width);
                let kind = if self.rng.gen() {
                    Kind::ZeroExt
                } else {
                    Kind::SignExt
                };
                let a = self.bv(k, d);
                self.app(kind, &[width - k], &[a])
            }
            8 => {
                let wider = self.rng.gen_range(width..=MAX_WIDTH);
                let lo = self.rng.gen_range(0..=wider - width);
                let a = self.bv(wider, d);
                self.app(Kind::Extract, &[lo + width - 1, lo], &[a])
            }
            9 if width == 1 => {
                let inner = self.rng.gen_range(1..=4);
                let (a, b) = (self.bv(inner, d), self.bv(inner, d));
                self.app(Kind::BvComp, &[], &[a, b])
            }
            9 => {
                let part = (1..width).rev().find(|k| width % k == 0).unwrap_or(1);
                let a = self.bv(part, d);
                self.app(Kind::Repeat, &[width / part], &[a])
            }
            _ => self.bv_leaf(width),
        }
    }

    fn boolean(&mut self, depth: u32) -> NodeId {
        if depth == 0 {
            return match self.rng.gen_range(0..4) {
                0 => self.p,
                1 => self.q,
                2 => self.formula.bool_const(self.rng.gen()),
                _ => {
                    let a = self.bv_leaf(3);
                    let b = self.bv_leaf(3);
                    self.app(Kind::BvULt, &[], &[a, b])
                }
            };
        }
        let d = depth - 1;
        match self.rng.gen_range(0..9) {
            0 => {
                let a = self.boolean(d);
                self.app(Kind::Not, &[], &[a])
            }
            1 | 2 => {
                let kind = *[Kind::And, Kind::Or].choose(&mut self.rng).unwrap();
                let n = self.rng.gen_range(2..=4);
                let args: Vec<_> = (0..n).map(|_| self.boolean(d)).collect();
                self.app(kind, &[], &args)
            }
            3 => {
                let kind = *[Kind::Xor, Kind::Implies, Kind::Iff]
                    .choose(&mut self.rng)
                    .unwrap();
                let (a, b) = (self.boolean(d), self.boolean(d));
                self.app(kind, &[], &[a, b])
            }
            4 | 5 => {
                let kind = *COMPARISONS.choose(&mut self.rng).unwrap();
                let width = self.rng.gen_range(1..=MAX_WIDTH);
                let (a, b) = (self.bv(width, d), self.bv(width, d));
                self.app(kind, &[], &[a, b])
            }
            6 | 7 => {
                let kind = if self.rng.gen() {
                    Kind::Eq
                } else {
                    Kind::Distinct
                };
                let width = self.rng.gen_range(1..=4);
                let n = self.rng.gen_range(2..=4);
                let args: Vec<_> = (0..n).map(|_| self.bv(width, d)).collect();
                self.app(kind, &[], &args)
            }
            _ => {
                let c = self.boolean(d);
                let (a, b) = (self.boolean(d), self.boolean(d));
                self.app(Kind::Ite, &[], &[c, a, b])
            }
        }
    }
}

fn to_target(value: Value) -> TermValue {
    match value {
        Value::Bool(b) => TermValue::Bool(b),
        Value::Bv { width, bits } => TermValue::Bv(BvValue::from_u64(bits as u64, width)),
    }
}

/// Evaluates both sides under every assignment of `p`, `q`, `x` and `y`.
fn check_exhaustively(gen: &Generator, root: NodeId, fold: bool) {
    let mut graph = TermGraph::with_constant_folding(fold);
    let mut translator = Translator::new(&gen.formula, &mut graph);
    let translated = translator
        .translate(root)
        .unwrap_or_else(|e| panic!("translation failed: {e}"));
    let vars = [gen.p, gen.q, gen.x, gen.y];
    let handles: Vec<_> = vars.iter().map(|v| translator.lookup(*v).copied()).collect();

    for assignment in 0u32..(1 << 8) {
        let values = [
            Value::Bool(assignment & 1 != 0),
            Value::Bool(assignment & 2 != 0),
            Value::bv(3, ((assignment >> 2) & 7) as u128),
            Value::bv(3, ((assignment >> 5) & 7) as u128),
        ];
        let env: Env = vars.iter().copied().zip(values).collect();
        let model: Model = handles
            .iter()
            .zip(values)
            .filter_map(|(h, v)| h.map(|h| (h, to_target(v))))
            .collect();

        let expected = evaluate_source(&gen.formula, root, &env).unwrap();
        let actual = evaluate_target(&graph, translated, &model).unwrap();
        assert_eq!(
            actual,
            to_target(expected),
            "root {root} under p={} q={} x={} y={} (folding {fold})",
            values[0],
            values[1],
            values[2],
            values[3]
        );
    }
}

#[test]
fn random_boolean_formulas() {
    for seed in 0..150 {
        let mut gen = Generator::new(seed);
        let depth = gen.rng.gen_range(1..=3);
        let root = gen.boolean(depth);
        check_exhaustively(&gen, root, seed % 2 == 0);
    }
}

#[test]
fn random_bit_vector_terms() {
    for seed in 1000..1150 {
        let mut gen = Generator::new(seed);
        let width = gen.rng.gen_range(1..=MAX_WIDTH);
        let depth = gen.rng.gen_range(1..=3);
        let root = gen.bv(width, depth);
        check_exhaustively(&gen, root, seed % 2 == 1);
    }
}
