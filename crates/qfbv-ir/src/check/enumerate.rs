// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use super::{CheckError, SatChecker, SatVerdict};
use crate::eval::{Evaluator, Model, TermValue};
use crate::graph::{TermGraph, TermSort};
use crate::value::BvValue;
use log::{debug, info};
use num::BigUint;

/// Exhaustive search over all assignments of the graph's variables.
///
/// Only problems with at most `max_bits` variable bits are searched; larger
/// ones are answered with [`SatVerdict::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enumerator {
    pub max_bits: u32,
}

/// Largest supported search budget.
pub const MAX_ENUMERATION_BITS: u32 = 63;

impl Default for Enumerator {
    fn default() -> Self {
        Self { max_bits: 20 }
    }
}

impl Enumerator {
    pub fn new(max_bits: u32) -> Self {
        Self {
            max_bits: max_bits.min(MAX_ENUMERATION_BITS),
        }
    }
}

impl SatChecker for Enumerator {
    fn name(&self) -> &str {
        "builtin"
    }

    fn check(&self, graph: &TermGraph) -> Result<SatVerdict, CheckError> {
        let assertions = graph.assertions();
        // an assertion folded to `false` needs no search
        if assertions
            .iter()
            .any(|a| graph.as_bool_const(*a) == Some(false))
        {
            return Ok(SatVerdict::Unsat);
        }

        let variables = graph.variables();
        let total_bits: u64 = variables
            .iter()
            .map(|v| graph.sort(*v).width().unwrap_or(1) as u64)
            .sum();
        if total_bits > self.max_bits.min(MAX_ENUMERATION_BITS) as u64 {
            info!(
                "{} variable bits exceed the enumeration budget of {}",
                total_bits, self.max_bits
            );
            return Ok(SatVerdict::Unknown);
        }

        debug!(
            "enumerating 2^{total_bits} assignments of {} variable(s)",
            variables.len()
        );
        let mut evaluator = Evaluator::new(graph, assertions);
        let mut model = Model::default();
        for assignment in 0..(1u64 << total_bits) {
            let mut offset = 0;
            for v in variables {
                let value = match graph.sort(*v) {
                    TermSort::Bool => {
                        offset += 1;
                        TermValue::Bool((assignment >> (offset - 1)) & 1 == 1)
                    }
                    TermSort::BitVec(w) => {
                        let bits = (assignment >> offset) & ((1u64 << w) - 1);
                        offset += w;
                        TermValue::Bv(BvValue::new(w, BigUint::from(bits)))
                    }
                };
                model.insert(*v, value);
            }
            let values = evaluator.run(&model)?;
            if values.iter().all(|v| v.as_bool() == Some(true)) {
                debug!("satisfying assignment #{assignment}");
                return Ok(SatVerdict::Sat);
            }
        }
        Ok(SatVerdict::Unsat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BinaryOp, TargetBuilder};

    #[test]
    fn finds_a_model() {
        let mut g = TermGraph::new();
        let x = g.new_bv("x", 4);
        let y = g.new_bv("y", 4);
        let prod = g.binary(BinaryOp::BvMul, x, y);
        let six = g.bv_bin("0110");
        let eq = g.binary(BinaryOp::Equal, prod, six);
        let big = g.binary(BinaryOp::BvUGt, x, y);
        g.assert(eq);
        g.assert(big);
        assert_eq!(Enumerator::default().check(&g).unwrap(), SatVerdict::Sat);
    }

    #[test]
    fn proves_unsat() {
        let mut g = TermGraph::new();
        let x = g.new_bv("x", 3);
        let p = g.new_bool("p");
        let lt = g.binary(BinaryOp::BvULt, x, x);
        let both = g.binary(BinaryOp::And, lt, p);
        g.assert(both);
        assert_eq!(Enumerator::default().check(&g).unwrap(), SatVerdict::Unsat);
    }

    #[test]
    fn budget_and_trivial_cases() {
        let mut g = TermGraph::new();
        let x = g.new_bv("x", 16);
        let y = g.new_bv("y", 16);
        let eq = g.binary(BinaryOp::Equal, x, y);
        g.assert(eq);
        assert_eq!(Enumerator::new(20).check(&g).unwrap(), SatVerdict::Unknown);

        let empty = TermGraph::new();
        assert_eq!(Enumerator::new(0).check(&empty).unwrap(), SatVerdict::Sat);

        let mut folded = TermGraph::new();
        let f = folded.bool_lit(false);
        folded.assert(f);
        assert_eq!(Enumerator::new(0).check(&folded).unwrap(), SatVerdict::Unsat);
    }
}
