//! The shared error log and the small set of `Result`-returning engine errors.
//!
//! Validation problems never abort an operation: they accumulate into an [`ErrorLog`] that the
//! caller inspects afterwards. Only index-insertion collisions are reported as a `Result`,
//! since duplicate keys are a precondition violation the caller must decide how to handle before
//! the record is usable at all.

use std::fmt;

use crate::key::RecordKey;

/// The coarse-grained kind of a logged error, as printed in the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Surfaced unchanged from the external parser; the engine never produces these itself.
    Syntax,
    /// A dangling pointer, a role/sex mismatch, or a missing back-link.
    Linkage,
    /// An empty family or a duplicate child-in-family.
    Structural,
    /// Two records share a key.
    DuplicateKey,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Linkage => "LinkageError",
            ErrorKind::Structural => "StructuralError",
            ErrorKind::DuplicateKey => "DuplicateKey",
        };
        f.write_str(s)
    }
}

/// A single accumulated error: kind, source provenance, and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    pub segment: String,
    pub line: u32,
    pub message: String,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{}): {}", self.kind, self.segment, self.line, self.message)
    }
}

/// The append-only log that every non-fatal engine error accumulates into. Validation never
/// short-circuits on the log's contents; the caller decides what a non-empty log means.
#[derive(Debug, Default, Clone)]
pub struct ErrorLog {
    entries: Vec<ErrorEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ErrorKind, segment: impl Into<String>, line: u32, message: impl Into<String>) {
        self.entries.push(ErrorEntry { kind, segment: segment.into(), line, message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorEntry> {
        self.entries.iter()
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Errors returned directly from a fallible engine operation, as opposed to accumulated in an
/// [`ErrorLog`]. Every variant carries a stable `miette` diagnostic code so the CLI can render it
/// consistently with everything else in the error stack.
#[derive(thiserror::Error, derive_more::Display, Debug, miette::Diagnostic, PartialEq, Eq)]
pub enum EngineError {
    #[display("duplicate record key {key}")]
    #[diagnostic(code(gedcore::duplicate_key), help("record keys must be unique within a database"))]
    DuplicateKey { key: RecordKey },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_accumulates_without_short_circuiting() {
        let mut log = ErrorLog::new();
        log.push(ErrorKind::Linkage, "tom.ged", 12, "dangling FAMC");
        log.push(ErrorKind::Structural, "tom.ged", 0, "empty family");
        assert_eq!(log.len(), 2);
        assert!(!log.is_empty());
    }
}
