//! Turns literal expressions into [`Value`]s.

use std::mem;

use tracing::trace;

use crate::diagnostic::{Diagnostic, DropReason};
use crate::stack::ensure_sufficient_stack;
use crate::syntax::ast::{Expr, FieldKey};
use crate::syntax::lexer::LineIndex;
use crate::value::{Key, Table, Value};

/// Evaluates expressions from one module, recording the table entries it has
/// to drop.
#[derive(Debug)]
pub(crate) struct Evaluator<'a> {
    lines: &'a LineIndex,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(lines: &'a LineIndex, diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Evaluator { lines, diagnostics }
    }

    pub(crate) fn evaluate(&mut self, expr: Expr) -> Value {
        ensure_sufficient_stack(|| self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(n),
            Expr::String(s) => Value::String(s),
            Expr::Opaque(text) => Value::Opaque(text),
            Expr::Table(mut constructor) => {
                let mut table = Table::new();
                for field in mem::take(&mut constructor.fields) {
                    let key = match field.key {
                        Some(FieldKey::Name(s) | FieldKey::String(s)) => Key::String(s),
                        Some(FieldKey::Number(n)) => Key::Number(n),
                        Some(FieldKey::Computed(_)) => {
                            self.drop_field(field.offset, DropReason::ComputedKey);
                            continue;
                        }
                        None => {
                            self.drop_field(field.offset, DropReason::Positional);
                            continue;
                        }
                    };
                    let value = self.evaluate(field.value);
                    table.insert(key, value);
                }
                Value::Table(table)
            }
        }
    }

    fn drop_field(&mut self, offset: usize, reason: DropReason) {
        let location = self.lines.location(offset);
        trace!(line = location.line, column = location.column, ?reason, "dropped field");
        self.diagnostics.push(Diagnostic::DroppedField { location, reason });
    }
}
