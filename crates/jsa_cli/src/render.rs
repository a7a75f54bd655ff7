//! Terminal rendering: miette diagnostics, token listings and reports.

use jsa_compiler::AnalysisReport;
use jsa_diagnostics::{Diagnostic, DiagnosticCategory};
use miette::{
    GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, Severity, SourceCode,
    SourceSpan,
};
use std::fmt::{self, Write};

/// A source diagnostic bound to its file text, for miette's graphical
/// handler.
#[derive(Debug)]
pub struct SourceDiagnostic {
    code: u32,
    category: DiagnosticCategory,
    message: String,
    label: String,
    source: NamedSource<String>,
    span: SourceSpan,
}

impl SourceDiagnostic {
    pub fn new(file: &str, text: &str, diagnostic: &Diagnostic) -> Self {
        let start = byte_offset(text, diagnostic.span.start as usize);
        let end = byte_offset(text, diagnostic.span.end() as usize);
        Self {
            code: diagnostic.code,
            category: diagnostic.category,
            message: diagnostic.message_text.clone(),
            label: format!("{} {}", diagnostic.phase, diagnostic.category),
            source: NamedSource::new(file, text.to_string()),
            span: SourceSpan::new(start.into(), end.saturating_sub(start)),
        }
    }
}

/// Byte offset of the `chars`-th character, clamped to the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

impl fmt::Display for SourceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceDiagnostic {}

impl miette::Diagnostic for SourceDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("JS{}", self.code)))
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.category {
            DiagnosticCategory::Error => Severity::Error,
            DiagnosticCategory::Warning => Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.label.clone()),
            self.span,
        ))))
    }
}

pub struct Renderer {
    handler: GraphicalReportHandler,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        let theme = if color {
            GraphicalTheme::unicode()
        } else {
            GraphicalTheme::unicode_nocolor()
        };
        Self {
            handler: GraphicalReportHandler::new_themed(theme),
        }
    }

    pub fn diagnostic(&self, file: &str, text: &str, diagnostic: &Diagnostic) -> String {
        let report = SourceDiagnostic::new(file, text, diagnostic);
        let mut out = String::new();
        if self.handler.render_report(&mut out, &report).is_err() {
            // Fall back to the plain one-line form.
            out = format!("{}:{}\n", file, diagnostic);
        }
        out
    }
}

/// Every token with its position and class, comments included.
pub fn token_listing(text: &str) -> String {
    let lexed = jsa_scanner::tokenize_with_comments(text);
    let mut out = String::new();
    for token in &lexed.tokens {
        let Some(class) = token.class() else {
            continue;
        };
        let _ = writeln!(
            out,
            "{:>5}:{:<4} {:<12} {}",
            token.line(),
            token.column(),
            class,
            token.text.escape_debug()
        );
    }
    out
}

/// The stage reports, optionally followed by both code tables.
pub fn text_report(report: &AnalysisReport, with_ir: bool) -> String {
    let mut out = String::new();
    section(&mut out, "Lexical analysis", &report.lexical.report);
    section(&mut out, "Syntax analysis", &report.syntactic.report);
    section(&mut out, "Semantic analysis", &report.semantic.report);

    if with_ir {
        if report.stats.syntax_errors > 0 {
            section(
                &mut out,
                "Intermediate code",
                "Skipped: the source has syntax errors.\n",
            );
        } else {
            section(&mut out, "Intermediate code", &jsa_ir::format_table(&report.intermediate));
            section(&mut out, "Optimized code", &jsa_ir::format_table(&report.optimized));
        }
    }

    let stats = &report.stats;
    let _ = writeln!(
        out,
        "Lines: {}, characters: {}, tokens: {}, lexical errors: {}, syntax errors: {}, semantic errors: {}, warnings: {}",
        stats.lines_of_code,
        stats.characters,
        stats.tokens,
        stats.lexical_errors,
        stats.syntax_errors,
        stats.semantic_errors,
        stats.warnings
    );
    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "== {} ==", title);
    out.push_str(body);
    out.push('\n');
}
