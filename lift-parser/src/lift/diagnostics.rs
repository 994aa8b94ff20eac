//! Diagnostic collection
//!
//! Field data from linguistic fieldwork is routinely imperfect. Instead of failing, the
//! mapper and the lexicon queries record what they noticed as [`Diagnostic`] values that
//! travel alongside the successfully built lexicon.
//!
//! Diagnostic kinds
//!
//!     - UnresolvedReference: a relation, variant, reversal or grammatical-info value with no
//!       matching target. Only produced when the reference is queried.
//!     - DuplicateId: a second item claimed an id already in the index. First one wins.
//!     - UnknownVersion: the document declares a version we have no rule set for.
//!     - MalformedValue: an optional scalar (date, order) could not be coerced.
//!     - RangeCycle: a range hierarchy links back onto itself.
//!     - MissingRanges: an external ranges file referenced by `href` could not be read.

use serde::Serialize;
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Information => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    UnresolvedReference,
    DuplicateId,
    UnknownVersion,
    MalformedValue,
    RangeCycle,
    MissingRanges,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedReference => "unresolved-reference",
            DiagnosticKind::DuplicateId => "duplicate-id",
            DiagnosticKind::UnknownVersion => "unknown-version",
            DiagnosticKind::MalformedValue => "malformed-value",
            DiagnosticKind::RangeCycle => "range-cycle",
            DiagnosticKind::MissingRanges => "missing-ranges",
        }
    }

    fn default_severity(&self) -> DiagnosticSeverity {
        match self {
            DiagnosticKind::UnknownVersion => DiagnosticSeverity::Information,
            DiagnosticKind::MissingRanges => DiagnosticSeverity::Error,
            _ => DiagnosticSeverity::Warning,
        }
    }
}

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    /// Element path (`/lift/entry[3]/sense[0]`) or item id the finding is about.
    pub context: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            context: String::new(),
        }
    }

    pub fn at(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_severity(mut self, severity: DiagnosticSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code(), self.message)?;
        if !self.context.is_empty() {
            write!(f, " at {}", self.context)?;
        }
        Ok(())
    }
}

/// Ordered sink for diagnostics. Every push is also logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(code = diagnostic.code(), context = %diagnostic.context, "{}", diagnostic.message);
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new(DiagnosticKind::DuplicateId, "id 'x' already registered")
            .at("/lift/entry[1]");

        assert_eq!(diag.severity, DiagnosticSeverity::Warning);
        assert_eq!(diag.code(), "duplicate-id");
        assert_eq!(
            diag.to_string(),
            "warning [duplicate-id]: id 'x' already registered at /lift/entry[1]"
        );
    }

    #[test]
    fn test_unknown_version_is_informational() {
        let diag = Diagnostic::new(DiagnosticKind::UnknownVersion, "version 9.9");
        assert_eq!(diag.severity, DiagnosticSeverity::Information);
        assert_eq!(diag.to_string(), "info [unknown-version]: version 9.9");
    }

    #[test]
    fn test_collection_filters_by_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::new(DiagnosticKind::DuplicateId, "a"));
        diagnostics.push(Diagnostic::new(DiagnosticKind::RangeCycle, "b"));
        diagnostics.push(Diagnostic::new(DiagnosticKind::DuplicateId, "c"));

        assert_eq!(diagnostics.len(), 3);
        let dups: Vec<_> = diagnostics
            .of_kind(DiagnosticKind::DuplicateId)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(dups, vec!["a", "c"]);
    }
}
