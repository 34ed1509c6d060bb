use std::fmt::Write;

use crate::{error::ConvError, prettify::{paint, BOLD, BRIGHT_CYAN, DIM, GREEN, RED, YELLOW}};

use super::runner::{CaseResult, Outcome};

/// Differing positions spelled out per mismatching case.
const POSITIONS_PER_CASE: usize = 8;

/// Aggregate of a sweep. Mismatches never stop a sweep, they are collected here.
#[derive(Debug, Clone)]
pub struct Report {
    oracle: String,
    results: Vec<CaseResult>,
    elapsed: f32,
}

impl Report {
    pub fn new(oracle: &str, results: Vec<CaseResult>, elapsed: f32) -> Self {
        Self { oracle: oracle.to_string(), results, elapsed }
    }

    pub fn results(&self) -> &[CaseResult] { &self.results }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|result| predicate(&result.outcome)).count()
    }

    pub fn matched(&self) -> usize { self.count(|o| matches!(o, Outcome::Matched)) }
    pub fn mismatched(&self) -> usize { self.count(|o| matches!(o, Outcome::Mismatch(_))) }
    pub fn skipped(&self) -> usize { self.count(|o| matches!(o, Outcome::Skipped(_))) }
    pub fn failed(&self) -> usize { self.count(|o| matches!(o, Outcome::Failed(_))) }

    /// True when at least one case matched the oracle and none disagreed or broke.
    /// A sweep whose every case was skipped checked nothing, so it does not pass.
    pub fn passed(&self) -> bool {
        self.matched() > 0 && self.mismatched() == 0 && self.failed() == 0
    }

    /// Mismatching and failed cases, in sweep order.
    pub fn problems(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|result| matches!(result.outcome, Outcome::Mismatch(_) | Outcome::Failed(_)))
    }

    /// One tab-separated row per case.
    pub fn render_table(&self, color: bool) -> String {
        let mut out = paint("DIR\tFILT\tILEN\tSTRIDE\tDIL\tPAD\tKEY\tPHASE\tMATCH", BOLD, color);
        out.push('\n');
        for result in &self.results {
            let phase = result.phase.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
            let verdict = match &result.outcome {
                Outcome::Matched => paint("true", GREEN, color),
                Outcome::Mismatch(_) => paint("false", RED, color),
                Outcome::Skipped(_) => paint("skip", DIM, color),
                Outcome::Failed(_) => paint("error", RED, color),
            };
            let _ = writeln!(out, "{}\t{phase}\t{verdict}", result.case);
        }

        out
    }

    /// Counts, then the first max_reported problem cases with their differing positions.
    pub fn render_summary(&self, max_reported: usize, color: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} cases against {} oracle in {:.3}s: {} matched, {} mismatched, {} skipped, {} failed",
            self.results.len(), self.oracle, self.elapsed,
            paint(&self.matched().to_string(), GREEN, color),
            paint(&self.mismatched().to_string(), RED, color),
            paint(&self.skipped().to_string(), YELLOW, color),
            paint(&self.failed().to_string(), RED, color));

        for result in self.problems().take(max_reported) {
            let _ = writeln!(out, "{}", paint(&format!("case {}: {}", result.case.index, result.case), BRIGHT_CYAN, color));
            match &result.outcome {
                Outcome::Mismatch(ConvError::NumericMismatch { discrepancies }) => {
                    for discrepancy in discrepancies.iter().take(POSITIONS_PER_CASE) {
                        let _ = writeln!(out, "    {discrepancy}");
                    }
                    if discrepancies.len() > POSITIONS_PER_CASE {
                        let _ = writeln!(out, "    ... {} more", discrepancies.len() - POSITIONS_PER_CASE);
                    }
                }
                Outcome::Mismatch(e) => { let _ = writeln!(out, "    {e}"); }
                Outcome::Failed(message) => { let _ = writeln!(out, "    error: {message}"); }
                _ => {}
            }
        }

        let hidden = self.problems().count().saturating_sub(max_reported);
        if hidden > 0 {
            let _ = writeln!(out, "{hidden} more problem case(s) not shown");
        }

        out
    }
}
