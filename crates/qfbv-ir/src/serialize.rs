// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! SMT-LIB2 rendering of a term graph.
//!
//! Every compound term reachable from an assertion becomes one `define-fun`,
//! emitted in arena order, so shared sub-terms are written once.

use crate::graph::{Term, TermGraph, TermRef};
use std::io::Write;

fn is_simple_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => false,
        Some(_) => name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(c)),
        None => false,
    }
}

fn symbol(name: &str) -> String {
    if is_simple_symbol(name) {
        name.to_string()
    } else {
        format!("|{name}|")
    }
}

/// Operand reference: constants and variables inline, compound terms by name.
fn operand(graph: &TermGraph, r: TermRef) -> String {
    match graph.term(r) {
        Term::Bool(b) => b.to_string(),
        Term::Bv(v) => v.to_string(),
        Term::Var { name, .. } => symbol(name),
        _ => r.to_string(),
    }
}

fn definition(graph: &TermGraph, r: TermRef, term: &Term) -> String {
    let op = |r: &TermRef| operand(graph, *r);
    match term {
        Term::Unary(o, a) => format!("({o} {})", op(a)),
        Term::Binary(o, a, b) => format!("({o} {} {})", op(a), op(b)),
        Term::Ite(c, t, e) => format!("(ite {} {} {})", op(c), op(t), op(e)),
        Term::Extract { hi, lo, arg } => format!("((_ extract {hi} {lo}) {})", op(arg)),
        Term::ZeroExtend { by, arg } => format!("((_ zero_extend {by}) {})", op(arg)),
        Term::SignExtend { by, arg } => format!("((_ sign_extend {by}) {})", op(arg)),
        Term::Bool(_) | Term::Bv(_) | Term::Var { .. } => operand(graph, r),
    }
}

/// Writes a complete script: declarations, definitions, assertions and `(check-sat)`.
pub fn serialize(graph: &TermGraph, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "(set-logic QF_BV)")?;
    for var in graph.variables() {
        let name = graph.var_name(*var).unwrap_or_default();
        writeln!(out, "(declare-const {} {})", symbol(name), graph.sort(*var))?;
    }

    let mut used = vec![false; graph.len()];
    for r in graph.assertions() {
        used[r.index()] = true;
    }
    let terms = graph.terms().collect::<Vec<_>>();
    for (r, term) in terms.iter().rev() {
        if used[r.index()] {
            for child in term.children() {
                used[child.index()] = true;
            }
        }
    }
    for (r, term) in terms {
        if used[r.index()] && !term.is_leaf() {
            writeln!(
                out,
                "(define-fun {r} () {} {})",
                graph.sort(r),
                definition(graph, r, term)
            )?;
        }
    }

    for r in graph.assertions() {
        writeln!(out, "(assert {})", operand(graph, *r))?;
    }
    writeln!(out, "(check-sat)")?;
    writeln!(out, "(exit)")
}

pub fn to_smt2(graph: &TermGraph) -> String {
    let mut out = vec![];
    // writing into a Vec cannot fail
    let _ = serialize(graph, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}
