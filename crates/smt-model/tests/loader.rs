// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{self, termcolor::Buffer, Config};
use smt_model::eval::{evaluate, Env, Value};
use smt_model::smtlib::{parse_script, Status};
use smt_model::{Kind, Sort};

const ROTATIONS: &str = r#"
; rotations of a 6-bit register
(set-logic QF_BV)
(set-info :status unsat)
(declare-fun r () (_ BitVec 6))
(define-fun spin ((v (_ BitVec 6))) (_ BitVec 6) ((_ rotate_left 2) ((_ rotate_right 5) v)))
(assert (not (= (spin r) ((_ rotate_left 3) r))))
(check-sat)
(exit)
"#;

#[test]
fn rotations_compose() {
    let script = parse_script(ROTATIONS).unwrap();
    assert_eq!(script.status, Some(Status::Unsat));
    let r = script.formula.variables().next().unwrap();
    assert_eq!(r.name(), Some("r"));
    assert_eq!(r.sort(), Sort::BitVec(6));
    for bits in 0..64u128 {
        let mut env = Env::default();
        env.insert(r.id(), Value::bv(6, bits));
        assert_eq!(
            evaluate(&script.formula, script.root, &env).unwrap(),
            Value::Bool(false),
            "r = {bits:#b}"
        );
    }
}

#[test]
fn shared_subterms_are_interned() {
    let script = parse_script(
        r#"
        (declare-const a (_ BitVec 8))
        (assert (bvult (bvmul a a) (bvadd (bvmul a a) #x01)))
        "#,
    )
    .unwrap();
    let f = &script.formula;
    let root = f.decl(script.root);
    assert_eq!(root.kind(), Kind::BvULt);
    let square = root.arg(0).unwrap();
    let sum = f.decl(root.arg(1).unwrap());
    assert_eq!(sum.arg(0), Some(square));
}

#[test]
fn load_errors_render_as_diagnostics() {
    let source = "(declare-const a (_ BitVec 8))\n(assert (bvadd a))\n";
    let err = parse_script(source).unwrap_err();

    let mut files = SimpleFiles::new();
    let file_id = files.add("bad.smt2", source);
    let mut buffer = Buffer::no_color();
    term::emit(
        &mut buffer,
        &Config::default(),
        &files,
        &err.to_diagnostic(file_id),
    )
    .unwrap();
    let rendered = String::from_utf8(buffer.into_inner()).unwrap();
    assert!(rendered.contains("bad.smt2:2:9"), "{rendered}");
    assert!(rendered.contains("`bvadd` expects"), "{rendered}");
}

#[test]
fn oversized_indices_are_load_errors() {
    for term in ["((_ zero_extend 4294967295) x)", "((_ repeat 536870913) x)"] {
        let source = format!("(declare-const x (_ BitVec 8))\n(assert (= {term} {term}))\n");
        let err = parse_script(&source).unwrap_err();
        assert!(err.message.contains("exceeds"), "{term}: {}", err.message);
        assert_eq!(&source[err.span.start..err.span.end], term);
    }
}
