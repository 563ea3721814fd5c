//! `eval` command implementation.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use contracts::{Predicate, PredicateCompiler};
use expression::ExpressionEngine;

use super::input::{open_input, parse_event};
use crate::cli::EvalArgs;
use crate::error::CliError;

/// Counts from one `eval` pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvalSummary {
    pub matched: u64,
    pub unmatched: u64,
    pub errors: u64,
    pub invalid_lines: u64,
}

/// Execute the `eval` command
pub fn run_eval(args: &EvalArgs) -> Result<()> {
    let predicate = ExpressionEngine::new()
        .compile(&args.expression)
        .map_err(|e| CliError::expression_compile(e.detail()))?;
    info!(expression = %predicate.source(), "Expression compiled");

    let input = open_input(args.input.as_deref()).context("Failed to open event input")?;
    let stdout = io::stdout();
    let summary = evaluate_lines(predicate.as_ref(), input, &mut stdout.lock())
        .context("Failed to evaluate events")?;

    info!(
        matched = summary.matched,
        unmatched = summary.unmatched,
        errors = summary.errors,
        invalid_lines = summary.invalid_lines,
        "Evaluation finished"
    );
    Ok(())
}

/// Evaluate every event line and print one result per event
pub fn evaluate_lines(
    predicate: &dyn Predicate,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<EvalSummary> {
    let mut summary = EvalSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line_no = index as u64 + 1;
        let event = match parse_event(line_no, &line?) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Skipping input line");
                summary.invalid_lines += 1;
                continue;
            }
        };

        match predicate.evaluate(&event) {
            Ok(true) => {
                summary.matched += 1;
                writeln!(out, "{line_no}: true")?;
            }
            Ok(false) => {
                summary.unmatched += 1;
                writeln!(out, "{line_no}: false")?;
            }
            Err(e) => {
                summary.errors += 1;
                writeln!(out, "{line_no}: error: {}", e.detail())?;
            }
        }
    }

    Ok(summary)
}
