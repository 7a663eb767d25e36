// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use super::{CheckError, SatChecker, SatVerdict};
use crate::graph::TermGraph;
use crate::serialize::serialize;
use log::debug;
use std::io::{BufWriter, Write};
use std::process::{Command, Stdio};

/// An external solver that reads an SMT-LIB2 script on `stdin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtLibSolver {
    name: &'static str,
    command: &'static str,
    args: &'static [&'static str],
}

pub const Z3: SmtLibSolver = SmtLibSolver {
    name: "z3",
    command: "z3",
    args: &["-in", "-smt2"],
};

pub const BITWUZLA: SmtLibSolver = SmtLibSolver {
    name: "bitwuzla",
    command: "bitwuzla",
    args: &[],
};

pub const YICES2: SmtLibSolver = SmtLibSolver {
    name: "yices",
    command: "yices-smt2",
    args: &[],
};

pub const CVC5: SmtLibSolver = SmtLibSolver {
    name: "cvc5",
    command: "cvc5",
    args: &["--lang", "smt2"],
};

pub const BOOLECTOR: SmtLibSolver = SmtLibSolver {
    name: "boolector",
    command: "boolector",
    args: &["--smt2"],
};

impl SmtLibSolver {
    pub const ALL: [SmtLibSolver; 5] = [Z3, BITWUZLA, YICES2, CVC5, BOOLECTOR];

    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name == name)
    }

    pub fn command(&self) -> &str {
        self.command
    }
}

/// Interprets the first non-empty line a solver printed after `(check-sat)`.
fn parse_response(solver: &str, output: &str) -> Result<SatVerdict, CheckError> {
    let response = output.trim();
    let first = response.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        Some("sat") => Ok(SatVerdict::Sat),
        Some("unsat") => Ok(SatVerdict::Unsat),
        Some("unknown") => Ok(SatVerdict::Unknown),
        Some(line) if line.starts_with("(error") => {
            let msg = line
                .trim_start_matches("(error")
                .trim_end_matches(')')
                .trim()
                .trim_matches('"');
            Err(CheckError::FromSolver(solver.to_string(), msg.to_string()))
        }
        _ => Err(CheckError::UnexpectedResponse(
            solver.to_string(),
            response.to_string(),
        )),
    }
}

impl SatChecker for SmtLibSolver {
    fn name(&self) -> &str {
        self.name
    }

    fn check(&self, graph: &TermGraph) -> Result<SatVerdict, CheckError> {
        debug!("running `{} {}`", self.command, self.args.join(" "));
        let mut proc = Command::new(self.command)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CheckError::Spawn(self.command.to_string(), e))?;
        let io_error = |e| CheckError::Io(self.command.to_string(), e);

        if let Some(stdin) = proc.stdin.take() {
            let mut stdin = BufWriter::new(stdin);
            if let Err(e) = serialize(graph, &mut stdin).and_then(|()| stdin.flush()) {
                debug!("{} stopped reading: {e}", self.command);
                let _ = proc.kill();
                let _ = proc.wait();
                return Err(io_error(e));
            }
            // dropping stdin closes the pipe
        }
        let output = proc.wait_with_output().map_err(io_error)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let verdict = parse_response(self.name, &stdout);
        if verdict.is_err() && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                return Err(CheckError::FromSolver(
                    self.name.to_string(),
                    stderr.trim().to_string(),
                ));
            }
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses() {
        assert_eq!(parse_response("z3", "sat\n").unwrap(), SatVerdict::Sat);
        assert_eq!(parse_response("z3", "\n unsat \n").unwrap(), SatVerdict::Unsat);
        assert_eq!(
            parse_response("z3", "unknown\n").unwrap(),
            SatVerdict::Unknown
        );
        match parse_response("z3", "(error \"line 3 column 10: unknown constant x\")\n") {
            Err(CheckError::FromSolver(name, msg)) => {
                assert_eq!(name, "z3");
                assert_eq!(msg, "line 3 column 10: unknown constant x");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_response("z3", ""),
            Err(CheckError::UnexpectedResponse(..))
        ));
    }

    #[test]
    fn solver_presets() {
        assert_eq!(SmtLibSolver::by_name("yices").unwrap().command(), "yices-smt2");
        assert_eq!(SmtLibSolver::by_name("z3"), Some(Z3));
        assert_eq!(SmtLibSolver::by_name("mathsat"), None);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let solver = SmtLibSolver {
            name: "missing",
            command: "definitely-not-an-smt-solver-binary",
            args: &[],
        };
        assert!(matches!(
            solver.check(&TermGraph::new()),
            Err(CheckError::Spawn(..))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn solver_that_stops_reading_is_an_io_error() {
        use crate::builder::TargetBuilder;

        let solver = SmtLibSolver {
            name: "true",
            command: "true",
            args: &[],
        };
        // far more than a pipe buffer
        let mut g = TermGraph::new();
        for i in 0..100_000 {
            let p = g.new_bool(&format!("p{i}"));
            g.assert(p);
        }
        assert!(matches!(solver.check(&g), Err(CheckError::Io(..))));
    }
}
