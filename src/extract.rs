//! Pulls the table assignments out of a module.

use tracing::debug;

use crate::diagnostic::{Diagnostic, RejectReason};
use crate::eval::Evaluator;
use crate::syntax::ast::{Expr, IndexKey, Statement};
use crate::syntax::lexer::{tokenize, LineIndex};
use crate::syntax::parser::parse_module;
use crate::value::{Key, Table};
use crate::Result;

/// The result of [`extract_tables_with_diagnostics`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    /// Every `name["key"] = { ... }` assignment, keyed by `"key"`.
    pub tables: Table,
    /// What was skipped along the way, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Extracts every assignment of the form `name["key"] = { ... }` from a Lua
/// module.
///
/// This never fails. Statements of any other shape are skipped. If the same
/// key is assigned more than once, the last assignment wins.
///
/// ```
/// let tables = luatab::extract_tables(r#"items["Gun"] = { Damage = 5 }"#);
/// let gun = tables.get_str("Gun").unwrap();
/// assert_eq!(gun.get("Damage").and_then(|v| v.as_number()), Some(5.0));
/// ```
pub fn extract_tables(text: &str) -> Table {
    extract_tables_with_diagnostics(text).tables
}

/// Like [`extract_tables`], but also reports everything it skipped.
#[tracing::instrument(level = "debug", skip_all, fields(len = text.len()))]
pub fn extract_tables_with_diagnostics(text: &str) -> Extraction {
    let lines = LineIndex::new(text);
    let mut tables = Table::new();
    let mut diagnostics = Vec::new();

    for statement in parse_module(text, tokenize(text)) {
        match statement {
            Statement::Opaque { text, offset } => {
                let location = lines.location(offset);
                diagnostics.push(Diagnostic::OpaqueStatement { location, text });
            }
            Statement::Assignment {
                target,
                value,
                offset,
            } => {
                let location = lines.location(offset);
                let (line, column) = (location.line, location.column);
                let key = match target.key {
                    IndexKey::String(key) => key,
                    IndexKey::Number(n) => {
                        debug!(key = n, line, column, "rejected numeric key");
                        diagnostics.push(Diagnostic::RejectedAssignment {
                            location,
                            key: Key::Number(n).to_string(),
                            reason: RejectReason::NumericKey,
                        });
                        continue;
                    }
                };
                if !matches!(value, Expr::Table(_)) {
                    debug!(key = key.as_str(), line, column, "rejected non-table value");
                    diagnostics.push(Diagnostic::RejectedAssignment {
                        location,
                        key,
                        reason: RejectReason::NotATable,
                    });
                    continue;
                }

                let value = Evaluator::new(&lines, &mut diagnostics).evaluate(value);
                debug!(
                    base = target.base.as_str(),
                    key = key.as_str(),
                    line,
                    column,
                    "extracted table"
                );
                if tables.insert(Key::String(key), value).is_some() {
                    debug!(line, column, "replaced earlier assignment");
                }
            }
        }
    }

    debug!(tables = tables.len(), diagnostics = diagnostics.len(), "extraction complete");
    Extraction {
        tables,
        diagnostics,
    }
}

/// Like [`extract_tables`], for input which has not been checked for UTF-8.
pub fn extract_tables_from_bytes(bytes: &[u8]) -> Result<Table> {
    let text = std::str::from_utf8(bytes)?;
    Ok(extract_tables(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DropReason, Location};
    use crate::value::Value;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn at(line: usize, column: usize) -> Location {
        Location { line, column }
    }

    #[test]
    fn test_extract() {
        let text = "items[\"A\"] = {Name = \"a\"}\nitems[\"B\"] = {Name = \"b\", Count = 2}";
        let tables = extract_tables(text);
        let keys: Vec<String> = tables.keys().map(Key::to_string).collect();
        assert_eq!(keys, ["A", "B"]);
        let b = tables.get_str("B").unwrap();
        assert_eq!(b.get("Name"), Some(&Value::from("b")));
        assert_eq!(b.get("Count"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_any_base_name() {
        let tables = extract_tables("a[\"x\"] = {} b[\"y\"] = {}");
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn test_diagnostics() {
        let text = "local items = {}\n\
                    items[1] = {}\n\
                    items[\"s\"] = \"str\"\n\
                    items[\"t\"] = {1, k = 2}";
        let extraction = extract_tables_with_diagnostics(text);
        assert_eq!(extraction.tables.len(), 1);
        assert_eq!(
            extraction.diagnostics,
            vec![
                Diagnostic::OpaqueStatement {
                    location: at(1, 1),
                    text: "local items = {}".into(),
                },
                Diagnostic::RejectedAssignment {
                    location: at(2, 1),
                    key: "1".into(),
                    reason: RejectReason::NumericKey,
                },
                Diagnostic::RejectedAssignment {
                    location: at(3, 1),
                    key: "s".into(),
                    reason: RejectReason::NotATable,
                },
                Diagnostic::DroppedField {
                    location: at(4, 15),
                    reason: DropReason::Positional,
                },
            ]
        );
    }

    #[test]
    fn test_last_wins() {
        let tables = extract_tables("t[\"a\"] = {v = 1} t[\"b\"] = {} t[\"a\"] = {v = 2}");
        let keys: Vec<String> = tables.keys().map(Key::to_string).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(
            tables.get_str("a").and_then(|a| a.get("v")),
            Some(&Value::Number(2.0))
        );
    }

    #[test]
    fn test_from_bytes() {
        let tables = extract_tables_from_bytes(b"t[\"a\"] = {}").unwrap();
        assert_eq!(tables.len(), 1);
        let err = extract_tables_from_bytes(b"t[\"\xff\"] = {}").unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8(_)));
    }
}
