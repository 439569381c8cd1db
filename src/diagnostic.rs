//! Reports about the parts of a module which did not make it into the result.
//!
//! Extraction never fails, so these are the only way to tell a module with
//! nothing to extract apart from one which could not be understood.

use std::fmt;

/// A 1-based line and column (in bytes) within the module text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// A statement which is not a `name["key"] = ...` assignment, or whose
    /// value could not be parsed.
    OpaqueStatement { location: Location, text: String },
    /// An assignment of the right shape which was filtered out.
    RejectedAssignment {
        location: Location,
        key: String,
        reason: RejectReason,
    },
    /// A table entry with no usable key.
    DroppedField {
        location: Location,
        reason: DropReason,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// `items[1] = { ... }`
    NumericKey,
    /// `items["x"] = "not a table"`
    NotATable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// An array-style entry like the `1` in `{ 1, x = 2 }`.
    Positional,
    /// A bracketed key which is not a literal, like `[x + 1]`.
    ComputedKey,
}

impl Diagnostic {
    pub fn location(&self) -> Location {
        match self {
            Diagnostic::OpaqueStatement { location, .. }
            | Diagnostic::RejectedAssignment { location, .. }
            | Diagnostic::DroppedField { location, .. } => *location,
        }
    }
}

/// Longest excerpt of an opaque statement shown by `Display`.
const EXCERPT_LEN: usize = 40;

fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    match line.char_indices().nth(EXCERPT_LEN) {
        Some((end, _)) => format!("{}...", &line[..end]),
        None if line.len() < text.len() => format!("{}...", line),
        None => line.to_owned(),
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Diagnostic::*;
        match self {
            OpaqueStatement { location, text } => {
                write!(f, "{}: skipped statement `{}`", location, excerpt(text))
            }
            RejectedAssignment {
                location,
                key,
                reason,
            } => write!(f, "{}: skipped assignment to [{}]: {}", location, key, reason),
            DroppedField { location, reason } => {
                write!(f, "{}: dropped table entry: {}", location, reason)
            }
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NumericKey => write!(f, "the key is not a string"),
            RejectReason::NotATable => write!(f, "the value is not a table constructor"),
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Positional => write!(f, "positional entries are not supported"),
            DropReason::ComputedKey => write!(f, "the key is not a literal"),
        }
    }
}
