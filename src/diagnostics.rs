//! Per-build diagnostics collection
//!
//! Diagnostics are append-only for the lifetime of one build: core passes
//! report problems and keep going, the caller decides at build end whether
//! anything collected is fatal.

use std::fmt;
use std::path::{Path, PathBuf};

/// Category of a reported problem, matching the failure taxonomy of the
/// style pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The plugin transform chain threw or returned an unusable shape.
    TransformFailure,
    /// The CSS optimizer failed on otherwise valid input.
    OptimizeFailure,
    /// A file read or write failed.
    IoFailure,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::TransformFailure => write!(f, "transform"),
            DiagnosticKind::OptimizeFailure => write!(f, "optimize"),
            DiagnosticKind::IoFailure => write!(f, "io"),
        }
    }
}

/// One reported problem.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file_path: Option<PathBuf>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file_path {
            Some(path) => write!(f, "[{}] {}: {}", self.kind, path.display(), self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Append-only diagnostics sink, created fresh per build.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem. Fire-and-forget: reporting never fails and never
    /// interrupts the build.
    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>, file_path: Option<&Path>) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
            file_path: file_path.map(Path::to_path_buf),
        };
        log::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if any entry of the given kind was reported this build.
    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_appends_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(DiagnosticKind::TransformFailure, "first", None);
        diagnostics.report(DiagnosticKind::IoFailure, "second", Some(Path::new("/tmp/a.css")));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.entries()[0].message, "first");
        assert_eq!(diagnostics.entries()[1].kind, DiagnosticKind::IoFailure);
        assert_eq!(
            diagnostics.entries()[1].file_path.as_deref(),
            Some(Path::new("/tmp/a.css"))
        );
    }

    #[test]
    fn test_has_kind() {
        let mut diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_kind(DiagnosticKind::OptimizeFailure));
        diagnostics.report(DiagnosticKind::OptimizeFailure, "bad css", None);
        assert!(diagnostics.has_kind(DiagnosticKind::OptimizeFailure));
        assert!(!diagnostics.has_kind(DiagnosticKind::TransformFailure));
    }

    #[test]
    fn test_display_includes_path() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(
            DiagnosticKind::TransformFailure,
            "plugin exploded",
            Some(Path::new("global.css")),
        );
        let rendered = diagnostics.entries()[0].to_string();
        assert!(rendered.contains("transform"));
        assert!(rendered.contains("global.css"));
        assert!(rendered.contains("plugin exploded"));
    }
}
