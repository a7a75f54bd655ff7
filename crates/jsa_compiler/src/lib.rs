//! jsa_compiler: Pipeline orchestration.
//!
//! Runs lexer, parser, semantic analyzer, quadruple generator and optimizer
//! over one source buffer and assembles an [`AnalysisReport`]. Every run
//! allocates its own arena and counters, so runs are independent and
//! [`Pipeline::analyze_many`] can analyze buffers in parallel.
//!
//! Gating: intermediate code is generated, and then optimized, only when
//! the parser reported no syntax errors. Semantic errors never gate.

mod report;

pub use report::{lexical_report, semantic_report, syntactic_report};

use bumpalo::Bump;
use jsa_diagnostics::Diagnostic;
use jsa_ir::{GenerateError, Quadruple};
use jsa_optimizer::Optimizer;
use jsa_options::AnalyzerOptions;
use jsa_semantic::SemanticOptions;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info_span};

/// A fatal failure inside one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("intermediate code generation failed: {0}")]
    Generate(#[from] GenerateError),
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub lexical_errors: usize,
    pub syntax_errors: usize,
    pub semantic_errors: usize,
    /// Warnings from every phase.
    pub warnings: usize,
    pub lines_of_code: usize,
    /// Tokens excluding comments and the end-of-file marker.
    pub tokens: usize,
    pub characters: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalReport {
    pub report: String,
    pub lexical_errors: usize,
    pub token_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntacticReport {
    pub report: String,
    pub syntax_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticReport {
    pub report: String,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub lexical: LexicalReport,
    pub syntactic: SyntacticReport,
    pub semantic: SemanticReport,
    /// Generated code; empty when there were syntax errors.
    pub intermediate: Vec<Quadruple>,
    /// Optimized code; empty when there were syntax errors.
    pub optimized: Vec<Quadruple>,
    pub stats: Stats,
    /// Diagnostics of all phases: lexical, then syntactic, then semantic.
    pub diagnostics: Vec<Diagnostic>,
    /// Set by [`Pipeline::analyze`] when the run failed fatally. The phase
    /// reports are kept and both code sequences are empty.
    pub failure: Option<String>,
}

impl AnalysisReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// The analysis pipeline, configured once and reusable for any number of
/// runs.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: AnalyzerOptions,
}

impl Pipeline {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze `source`. A fatal failure is logged and reported through
    /// [`AnalysisReport::failure`].
    pub fn analyze(&self, source: &str) -> AnalysisReport {
        let (mut report, failure) = self.run(source);
        if let Some(err) = failure {
            error!(%err, "analysis failed");
            report.failure = Some(err.to_string());
        }
        report
    }

    /// Analyze `source`, returning fatal failures as errors.
    pub fn try_analyze(&self, source: &str) -> Result<AnalysisReport, AnalysisError> {
        match self.run(source) {
            (report, None) => Ok(report),
            (_, Some(err)) => Err(err),
        }
    }

    /// Analyze several buffers in parallel. Reports come back in input order.
    pub fn analyze_many<S>(&self, sources: &[S]) -> Vec<AnalysisReport>
    where
        S: AsRef<str> + Sync,
    {
        sources
            .par_iter()
            .map(|source| self.analyze(source.as_ref()))
            .collect()
    }

    fn semantic_options(&self) -> SemanticOptions {
        SemanticOptions {
            globals: self.options.globals.clone(),
            report_unused_variables: self.options.report_unused_variables,
        }
    }

    /// One full run. On a fatal failure the phase reports are complete and
    /// both code sequences are empty.
    fn run(&self, source: &str) -> (AnalysisReport, Option<AnalysisError>) {
        let arena = Bump::new();
        let lexed = info_span!("lexer").in_scope(|| jsa_scanner::tokenize(source));
        let parsed = info_span!("parser").in_scope(|| jsa_parser::parse(&arena, &lexed.tokens));
        let semantic = info_span!("semantic")
            .in_scope(|| jsa_semantic::analyze(&parsed.program, &self.semantic_options()));

        let mut diagnostics = Vec::with_capacity(
            lexed.diagnostics.len() + parsed.diagnostics.len() + semantic.diagnostics.len(),
        );
        diagnostics.extend(lexed.diagnostics.iter().cloned());
        diagnostics.extend(parsed.diagnostics.iter().cloned());
        diagnostics.extend(semantic.diagnostics.iter().cloned());

        let stats = Stats {
            lexical_errors: lexed.error_count(),
            syntax_errors: parsed.error_count(),
            semantic_errors: semantic.error_count(),
            warnings: diagnostics.iter().filter(|d| d.is_warning()).count(),
            lines_of_code: count_lines(source),
            tokens: lexed.token_count(),
            characters: source.chars().count(),
        };

        let mut report = AnalysisReport {
            lexical: LexicalReport {
                report: lexical_report(&lexed),
                lexical_errors: stats.lexical_errors,
                token_count: stats.tokens,
            },
            syntactic: SyntacticReport {
                report: syntactic_report(&parsed),
                syntax_errors: stats.syntax_errors,
            },
            semantic: SemanticReport {
                report: semantic_report(&semantic),
                error_count: semantic.error_count(),
                warning_count: semantic.warning_count(),
            },
            intermediate: Vec::new(),
            optimized: Vec::new(),
            stats,
            diagnostics,
            failure: None,
        };

        if stats.syntax_errors > 0 {
            return (report, None);
        }

        let intermediate = match info_span!("ir").in_scope(|| jsa_ir::generate(&parsed.program)) {
            Ok(code) => code,
            Err(err) => return (report, Some(err.into())),
        };
        let optimized = if self.options.optimize {
            info_span!("optimizer").in_scope(|| {
                let outcome = Optimizer::new(self.options.max_optimizer_passes).run(&intermediate);
                debug!(
                    iterations = outcome.iterations,
                    converged = outcome.converged,
                    "optimizer finished"
                );
                outcome.code
            })
        } else {
            intermediate.clone()
        };

        debug!(
            diagnostics = report.diagnostics.len(),
            quadruples = intermediate.len(),
            optimized = optimized.len(),
            "analysis complete"
        );
        report.intermediate = intermediate;
        report.optimized = optimized;
        (report, None)
    }
}

/// Number of `\n`-separated lines; 0 for empty input.
pub fn count_lines(source: &str) -> usize {
    if source.is_empty() {
        0
    } else {
        source.split('\n').count()
    }
}

/// Analyze with default options.
pub fn analyze(source: &str) -> AnalysisReport {
    Pipeline::default().analyze(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\n"), 2);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(Stats::default()).unwrap();
        for key in [
            "lexicalErrors",
            "syntaxErrors",
            "semanticErrors",
            "warnings",
            "linesOfCode",
            "tokens",
            "characters",
        ] {
            assert_eq!(json[key], 0, "missing {}", key);
        }
    }

    #[test]
    fn test_error_message() {
        let err = AnalysisError::from(GenerateError::ErrorNode { line: 3, column: 7 });
        assert!(err.to_string().starts_with("intermediate code generation failed"));
    }
}
