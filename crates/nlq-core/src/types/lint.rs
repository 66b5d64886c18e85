//! Coded lint diagnostics, shared between `nlq-sql`'s lint passes and
//! `nlq-eval`'s candidate evaluation. Mirrors the teacher's
//! `DiagnosticCode`/`Severity`/`Diagnostic` shape.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Lint rule codes owned by `nlq-sql` (`L001`..`L010`). Kept here so
/// `nlq-eval` can match on codes without depending on `nlq-sql` for
/// anything beyond the validator/lint entry points it already calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// `SELECT *` used instead of an explicit column list.
    L001SelectStar,
    /// Aggregate function present without a matching `GROUP BY`.
    L002MissingGroupBy,
    /// Unqualified column reference ambiguous across more than one joined table.
    L003AmbiguousColumn,
    /// `CROSS JOIN` semantics reached via a comma join rather than explicit syntax.
    L004ImplicitCrossJoin,
    /// `HAVING` present without a `GROUP BY`.
    L005HavingWithoutGroupBy,
    /// Trailing comma in a column or expression list.
    L006TrailingComma,
    /// Unbalanced parentheses.
    L007UnbalancedParens,
    /// Unclosed string literal.
    L008UnclosedQuote,
    /// `JOIN` clause missing an `ON` predicate.
    L009JoinWithoutOn,
    /// Reference to a table alias never introduced in `FROM`/`JOIN`.
    L010UndefinedAlias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub hint: Option<String>,
    pub pass_name: Cow<'static, str>,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        pass_name: &'static str,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            hint: None,
            pass_name: Cow::Borrowed(pass_name),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// A full lint pass result for one candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}
