//! The syntax tree for the literal-table subset of Lua.

use std::mem;

/// A top-level statement of a module.
#[derive(Debug, PartialEq)]
pub(crate) enum Statement {
    /// `name[key] = value`
    Assignment {
        target: IndexExpr,
        value: Expr,
        /// Byte offset of the statement's first token.
        offset: usize,
    },
    /// Any statement which is not a recognized assignment, kept as the
    /// original source text.
    Opaque { text: String, offset: usize },
}

/// The left side of an assignment: a variable indexed by a literal.
#[derive(Debug, PartialEq)]
pub(crate) struct IndexExpr {
    pub(crate) base: String,
    pub(crate) key: IndexKey,
}

#[derive(Debug, PartialEq)]
pub(crate) enum IndexKey {
    String(String),
    Number(f64),
}

#[derive(Debug, PartialEq)]
pub(crate) enum Expr {
    String(String),
    Number(f64),
    Table(TableConstructor),
    /// An expression outside the supported subset, such as a function call,
    /// an operator or a variable reference.
    Opaque(String),
}

/// A `{ ... }` literal.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct TableConstructor {
    pub(crate) fields: Vec<Field>,
}

/// One entry of a table constructor.
#[derive(Debug, PartialEq)]
pub(crate) struct Field {
    /// `None` for a positional (array-style) entry.
    pub(crate) key: Option<FieldKey>,
    pub(crate) value: Expr,
    pub(crate) offset: usize,
}

#[derive(Debug, PartialEq)]
pub(crate) enum FieldKey {
    /// `name = value`
    Name(String),
    /// `"name" = value` or `["name"] = value`
    String(String),
    /// `1 = value` or `[1] = value`
    Number(f64),
    /// A bracketed key which is not a single literal, like `[x + 1]`.
    Computed(String),
}

impl TableConstructor {
    pub(crate) fn new(fields: Vec<Field>) -> Self {
        TableConstructor { fields }
    }
}

// Nested constructors are torn down with an explicit stack, so that dropping
// a deeply nested tree cannot overflow the call stack.
impl Drop for TableConstructor {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.fields);
        while let Some(field) = pending.pop() {
            if let Expr::Table(mut table) = field.value {
                pending.append(&mut table.fields);
            }
        }
    }
}
