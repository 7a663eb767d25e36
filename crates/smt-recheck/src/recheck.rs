// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::options::RecheckConfig;
use anyhow::{anyhow, Context};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use codespan_reporting::term::{self, Config};
use log::{debug, info};
use model_to_qfbv::translate_and_assert;
use qfbv_ir::serialize::to_smt2;
use qfbv_ir::{SatVerdict, TermGraph};
use smt_model::smtlib::{parse_script, Script, Status};
use std::path::Path;
use std::time::Instant;

/// Result of re-checking one benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: SatVerdict,
    /// `:status` declared by the benchmark itself.
    pub expected: Option<Status>,
}

impl Outcome {
    /// A definite verdict that contradicts the declared status.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            (self.verdict, self.expected),
            (SatVerdict::Sat, Some(Status::Unsat)) | (SatVerdict::Unsat, Some(Status::Sat))
        )
    }
}

pub fn recheck_file(path: &Path, config: &RecheckConfig) -> anyhow::Result<Outcome> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read `{}`", path.display()))?;
    let mut error_writer = StandardStream::stderr(ColorChoice::Auto);
    recheck(&path.display().to_string(), &source, config, &mut error_writer)
}

/// Loads, translates and checks one SMT-LIB2 script.
///
/// Load errors are rendered as diagnostics into `error_writer` before the
/// error is returned.
pub fn recheck<W: WriteColor>(
    name: &str,
    source: &str,
    config: &RecheckConfig,
    error_writer: &mut W,
) -> anyhow::Result<Outcome> {
    let now = Instant::now();
    let script = match parse_script(source) {
        Ok(script) => script,
        Err(err) => {
            let file = SimpleFile::new(name, source);
            term::emit(error_writer, &Config::default(), &file, &err.to_diagnostic(()))?;
            return Err(anyhow!("exiting with load errors in `{name}`"));
        }
    };
    let Script {
        formula,
        assertions,
        root,
        logic,
        status,
    } = script;
    debug!(
        "loaded {} assertion(s), {} node(s), logic {}",
        assertions.len(),
        formula.len(),
        logic.as_deref().unwrap_or("unset")
    );
    let load_duration = now.elapsed();

    let now = Instant::now();
    let mut graph = TermGraph::with_constant_folding(config.fold);
    translate_and_assert(&formula, root, &mut graph)
        .with_context(|| format!("cannot translate `{name}`"))?;
    let translate_duration = now.elapsed();

    if let Some(dump) = &config.dump_smt2 {
        std::fs::write(dump, to_smt2(&graph))
            .with_context(|| format!("cannot write `{}`", dump.display()))?;
    }

    let now = Instant::now();
    let checker = config.checker()?;
    let verdict = checker
        .check(&graph)
        .with_context(|| format!("{} failed on `{name}`", checker.name()))?;
    info!(
        "{:.3}s loading, {:.3}s translation, {:.3}s checking with {}",
        load_duration.as_secs_f64(),
        translate_duration.as_secs_f64(),
        now.elapsed().as_secs_f64(),
        checker.name()
    );
    Ok(Outcome {
        verdict,
        expected: status,
    })
}
