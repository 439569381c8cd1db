//! Functions and types associated with converting source code into a syntax tree.

pub(crate) mod ast;
pub(crate) mod lexer;
pub(crate) mod parser;
mod token;
