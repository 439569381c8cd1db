//! A recursive descent parser for modules made of table assignments.
//!
//! Parsing is total. A statement which is not a recognized assignment is kept
//! as [`Statement::Opaque`] and parsing resumes at the next statement
//! boundary: a `;`, the start of another `name[literal] =` assignment, or the
//! end of input.

use tracing::trace;

use super::ast::{Expr, Field, FieldKey, IndexExpr, IndexKey, Statement, TableConstructor};
use super::token::Token;
use super::token::TokenType::{self, *};
use crate::stack::ensure_sufficient_stack;

/// Where an expression appears. This decides which tokens end it.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Context {
    /// The right side of a top-level assignment.
    Statement,
    /// The value of a table field.
    Field,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BlockChange {
    /// `function`, `do`, `if` or `repeat`
    Open,
    /// `end` or `until`
    Close,
}

/// Tracks the current state, to make parsing easier.
#[derive(Debug)]
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    /// Index of the next unread token.
    pos: usize,
}

/// Parses the tokens of `source` into a list of statements.
pub(crate) fn parse_module(
    source: &str,
    tokens: impl IntoIterator<Item = Token>,
) -> Vec<Statement> {
    let parser = Parser {
        source,
        tokens: tokens.into_iter().collect(),
        pos: 0,
    };
    parser.parse_all()
}

impl<'a> Parser<'a> {
    // Helper functions

    fn type_at(&self, i: usize) -> Option<TokenType> {
        self.tokens.get(i).map(|token| token.typ)
    }

    fn peek_type(&self) -> Option<TokenType> {
        self.type_at(self.pos)
    }

    /// Gets the original source code contained by a token.
    fn get_text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    /// Gets the source code spanned by the tokens `first..end`.
    fn text_between(&self, first: usize, end: usize) -> &'a str {
        let start = self.tokens[first].start;
        let stop = self.tokens[end - 1].end();
        &self.source[start..stop]
    }

    /// Checks for `Identifier '[' (LiteralString | LiteralNumber) ']' '='`
    /// starting at token `i`. The identifier must be a plain name, not the
    /// end of `a.b` or `a:b`.
    fn assignment_starts_at(&self, i: usize) -> bool {
        let qualified = i > 0 && matches!(self.type_at(i - 1), Some(Dot | Colon));
        !qualified
            && matches!(
                (
                    self.type_at(i),
                    self.type_at(i + 1),
                    self.type_at(i + 2),
                    self.type_at(i + 3),
                    self.type_at(i + 4),
                ),
                (
                    Some(Identifier),
                    Some(LSquare),
                    Some(LiteralString | LiteralNumber),
                    Some(RSquare),
                    Some(Assign),
                )
            )
    }

    /// How a keyword changes the block nesting of a function body.
    fn block_change(&self, token: Token) -> Option<BlockChange> {
        if token.typ != Identifier {
            return None;
        }
        match self.get_text(token) {
            "function" | "do" | "if" | "repeat" => Some(BlockChange::Open),
            "end" | "until" => Some(BlockChange::Close),
            _ => None,
        }
    }

    fn at_field_end(&self) -> bool {
        matches!(self.peek_type(), Some(Comma | Semi | RCurly))
    }

    // Actual parsing

    /// The main entry point for the parser. This parses the entire input.
    fn parse_all(mut self) -> Vec<Statement> {
        let mut statements = Vec::new();
        while let Some(typ) = self.peek_type() {
            if typ == Semi {
                self.pos += 1;
                continue;
            }
            let start = self.pos;
            let statement = match self.parse_assignment() {
                Some(statement) => statement,
                None => {
                    self.pos = start;
                    self.parse_opaque_statement()
                }
            };
            statements.push(statement);
        }
        statements
    }

    /// Parses an assignment of the form `name[key] = value`. Returns `None`
    /// if the statement is anything else, or if its value is malformed.
    fn parse_assignment(&mut self) -> Option<Statement> {
        if !self.assignment_starts_at(self.pos) {
            return None;
        }
        let base = self.tokens[self.pos];
        let key_token = self.tokens[self.pos + 2];
        self.pos += 5;

        let key_text = self.get_text(key_token);
        let key = match key_token.typ {
            LiteralString => IndexKey::String(string_contents(key_text)),
            _ => IndexKey::Number(number_value(key_text)?),
        };
        let value = self.parse_expr(Context::Statement)?;
        trace!(offset = base.start, key = key_text, "assignment");

        let target = IndexExpr {
            base: self.get_text(base).to_owned(),
            key,
        };
        Some(Statement::Assignment {
            target,
            value,
            offset: base.start,
        })
    }

    /// Consumes tokens up to the next statement boundary, keeping their
    /// source text. Always consumes at least one token.
    fn parse_opaque_statement(&mut self) -> Statement {
        let start = self.pos;
        let end = self
            .scan_opaque(start + 1, Context::Statement)
            .unwrap_or(self.tokens.len());
        self.pos = end;
        let text = self.text_between(start, end);
        trace!(offset = self.tokens[start].start, text, "opaque statement");
        Statement::Opaque {
            text: text.to_owned(),
            offset: self.tokens[start].start,
        }
    }

    /// Finds the end of an opaque run of tokens beginning at token `from`,
    /// returning the index one past its last token.
    ///
    /// Brackets are tracked, so that separators nested inside them do not
    /// end the run. In a table field, so are the blocks of a function body,
    /// which may hold assignments of its own. Otherwise, running into the end
    /// of input or the start of another assignment means the enclosing table
    /// was never closed, and `None` is returned.
    fn scan_opaque(&self, from: usize, context: Context) -> Option<usize> {
        let mut depth = 0usize;
        let mut blocks = 0usize;
        let mut i = from;
        while let Some(&token) = self.tokens.get(i) {
            if context == Context::Field {
                match self.block_change(token) {
                    Some(BlockChange::Open) => blocks += 1,
                    Some(BlockChange::Close) => blocks = blocks.saturating_sub(1),
                    None => {}
                }
            }
            if blocks == 0 && self.assignment_starts_at(i) {
                return match context {
                    Context::Statement => Some(i),
                    Context::Field => None,
                };
            }
            match token.typ {
                LCurly | LSquare | LParen => depth += 1,
                RCurly | RSquare | RParen if depth > 0 => depth -= 1,
                _ if blocks > 0 => {}
                Semi if depth == 0 => break,
                Comma | RCurly if depth == 0 && context == Context::Field => break,
                _ => {}
            }
            i += 1;
        }
        if i == self.tokens.len() && context == Context::Field {
            None
        } else {
            Some(i)
        }
    }

    /// Parses a single expression. `None` means the expression contains an
    /// unclosed table, and the enclosing statement has to be discarded.
    fn parse_expr(&mut self, context: Context) -> Option<Expr> {
        ensure_sufficient_stack(|| self.parse_expr_inner(context))
    }

    fn parse_expr_inner(&mut self, context: Context) -> Option<Expr> {
        let start = self.pos;
        let token = *self.tokens.get(start)?;
        let expr = match token.typ {
            LCurly => self.parse_table()?,
            LiteralString => {
                self.pos += 1;
                Expr::String(string_contents(self.get_text(token)))
            }
            LiteralNumber => {
                self.pos += 1;
                let text = self.get_text(token);
                match number_value(text) {
                    Some(n) => Expr::Number(n),
                    None => Expr::Opaque(text.to_owned()),
                }
            }
            _ => return self.parse_opaque_expr(start, context),
        };

        // Lua needs no separator between statements, so a statement's value
        // ends right here. A field's value has to reach a `,`, `;` or `}`.
        if context == Context::Statement || self.at_field_end() {
            Some(expr)
        } else {
            self.parse_opaque_expr(start, context)
        }
    }

    /// Parses the rest of an expression outside the supported subset. Its
    /// text starts at token `start` and continues to the next boundary.
    fn parse_opaque_expr(&mut self, start: usize, context: Context) -> Option<Expr> {
        let end = self.scan_opaque(self.pos, context)?;
        self.pos = end;
        if end > start {
            Some(Expr::Opaque(self.text_between(start, end).to_owned()))
        } else if context == Context::Field {
            // `{ a = }`
            Some(Expr::Opaque(String::new()))
        } else {
            None
        }
    }

    /// Parses a table constructor, starting at its `{`.
    ///
    /// Returns `None` if the input ends, or another assignment starts, before
    /// the matching `}`.
    fn parse_table(&mut self) -> Option<Expr> {
        self.pos += 1; // `{`
        let mut fields = Vec::new();
        loop {
            match self.peek_type()? {
                RCurly => {
                    self.pos += 1;
                    return Some(Expr::Table(TableConstructor::new(fields)));
                }
                Comma | Semi => self.pos += 1,
                _ if self.assignment_starts_at(self.pos) => {
                    trace!(offset = self.tokens[self.pos].start, "unclosed table");
                    return None;
                }
                _ => fields.push(self.parse_field()?),
            }
        }
    }

    /// Parses a table entry.
    fn parse_field(&mut self) -> Option<Field> {
        let offset = self.tokens[self.pos].start;
        let key = self.parse_field_key();
        let value = self.parse_expr(Context::Field)?;
        Some(Field { key, value, offset })
    }

    /// Parses the key of a table entry along with its `=`, if the entry has
    /// one.
    fn parse_field_key(&mut self) -> Option<FieldKey> {
        let token = self.tokens[self.pos];
        match token.typ {
            Identifier | LiteralString | LiteralNumber
                if self.type_at(self.pos + 1) == Some(Assign) =>
            {
                self.pos += 2;
                Some(self.literal_key(token))
            }
            LSquare => self.parse_bracket_key(),
            _ => None,
        }
    }

    /// Parses a `[key] =` prefix. If the brackets are not followed by `=`,
    /// nothing is consumed and the entry is positional.
    fn parse_bracket_key(&mut self) -> Option<FieldKey> {
        let open = self.pos;
        let close = self.matching_square(open)?;
        if self.type_at(close + 1) != Some(Assign) {
            return None;
        }
        self.pos = close + 2;

        let inner = self.tokens[open + 1];
        let key = match inner.typ {
            LiteralString | LiteralNumber if close == open + 2 => self.literal_key(inner),
            _ => {
                let text = &self.source[self.tokens[open].end()..self.tokens[close].start];
                FieldKey::Computed(text.trim().to_owned())
            }
        };
        Some(key)
    }

    /// Finds the `]` closing the `[` at token `open`.
    fn matching_square(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        loop {
            if i > open && self.assignment_starts_at(i) {
                return None;
            }
            match self.type_at(i)? {
                LSquare | LCurly | LParen => depth += 1,
                typ @ (RSquare | RCurly | RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return (typ == RSquare).then_some(i);
                    }
                }
                Comma | Semi if depth == 1 => return None,
                _ => {}
            }
            i += 1;
        }
    }

    /// Converts a name, string or number token into a field key.
    fn literal_key(&self, token: Token) -> FieldKey {
        let text = self.get_text(token);
        match token.typ {
            Identifier => FieldKey::Name(text.to_owned()),
            LiteralString => FieldKey::String(string_contents(text)),
            _ => match number_value(text) {
                Some(n) => FieldKey::Number(n),
                None => FieldKey::Computed(text.to_owned()),
            },
        }
    }
}

/// Strips the delimiters from a literal string. Only an escaped delimiter is
/// decoded; any other backslash sequence is kept verbatim.
fn string_contents(text: &str) -> String {
    if let Some(body) = text.strip_prefix('[') {
        let level = body.bytes().take_while(|&b| b == b'=').count();
        let inner = body
            .len()
            .checked_sub(level + 2)
            .and_then(|end| body.get(level + 1..end))
            .unwrap_or_default();
        // A newline directly after the opening bracket is not part of the string.
        let inner = inner
            .strip_prefix("\r\n")
            .or_else(|| inner.strip_prefix('\n'))
            .unwrap_or(inner);
        return inner.to_owned();
    }

    let mut chars = text.chars();
    let delimiter = chars.next();
    chars.next_back();
    let mut contents = String::with_capacity(text.len());
    while let Some(c) = chars.next() {
        if c != '\\' {
            contents.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if Some(next) == delimiter => contents.push(next),
            Some(next) => {
                contents.push('\\');
                contents.push(next);
            }
            None => contents.push('\\'),
        }
    }
    contents
}

/// Reads the value of a literal number, including an optional sign and the
/// hexadecimal form.
fn number_value(text: &str) -> Option<f64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some("") => return None,
        Some(hex) => hex.chars().try_fold(0.0, |acc: f64, c| {
            c.to_digit(16).map(|d| acc * 16.0 + f64::from(d))
        })?,
        None => digits.parse::<f64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_str(input: &str) -> Vec<Statement> {
        parse_module(input, tokenize(input))
    }

    fn check_it(input: &str, output: Vec<Statement>) {
        assert_eq!(parse_str(input), output);
    }

    fn assign(base: &str, key: &str, value: Expr, offset: usize) -> Statement {
        Statement::Assignment {
            target: IndexExpr {
                base: base.into(),
                key: IndexKey::String(key.into()),
            },
            value,
            offset,
        }
    }

    fn opaque(text: &str, offset: usize) -> Statement {
        Statement::Opaque {
            text: text.into(),
            offset,
        }
    }

    fn table(fields: Vec<Field>) -> Expr {
        Expr::Table(TableConstructor::new(fields))
    }

    fn field(key: Option<FieldKey>, value: Expr, offset: usize) -> Field {
        Field { key, value, offset }
    }

    fn name(s: &str) -> Option<FieldKey> {
        Some(FieldKey::Name(s.into()))
    }

    #[test]
    fn test01() {
        let text = "items[\"A\"] = {Name = \"x\", 5}";
        let fields = vec![
            field(name("Name"), Expr::String("x".into()), 14),
            field(None, Expr::Number(5.0), 26),
        ];
        check_it(text, vec![assign("items", "A", table(fields), 0)]);
    }

    #[test]
    fn test02() {
        check_it("foo.bar = {}", vec![opaque("foo.bar = {}", 0)]);
    }

    #[test]
    fn test03() {
        let text = "items[1] = {}";
        let out = Statement::Assignment {
            target: IndexExpr {
                base: "items".into(),
                key: IndexKey::Number(1.0),
            },
            value: table(vec![]),
            offset: 0,
        };
        check_it(text, vec![out]);
    }

    #[test]
    fn test04() {
        check_it("items[x] = {}", vec![opaque("items[x] = {}", 0)]);
    }

    #[test]
    fn test05() {
        let text = "t[\"k\"] = {[\"1\"] = 2, [x + 1] = 3; [2] = 4, [ 'a' ] = 5}";
        let fields = vec![
            field(Some(FieldKey::String("1".into())), Expr::Number(2.0), 10),
            field(Some(FieldKey::Computed("x + 1".into())), Expr::Number(3.0), 21),
            field(Some(FieldKey::Number(2.0)), Expr::Number(4.0), 34),
            field(Some(FieldKey::String("a".into())), Expr::Number(5.0), 43),
        ];
        check_it(text, vec![assign("t", "k", table(fields), 0)]);
    }

    #[test]
    fn test06() {
        let text = "t[\"k\"] = {Damage = 5 * 2, f(x, y), \"a\" = b}";
        let fields = vec![
            field(name("Damage"), Expr::Opaque("5 * 2".into()), 10),
            field(None, Expr::Opaque("f(x, y)".into()), 26),
            field(
                Some(FieldKey::String("a".into())),
                Expr::Opaque("b".into()),
                35,
            ),
        ];
        check_it(text, vec![assign("t", "k", table(fields), 0)]);
    }

    #[test]
    fn test07() {
        let text = "x = 1; items[\"A\"] = \"s\" local y = 2";
        let out = vec![
            opaque("x = 1", 0),
            assign("items", "A", Expr::String("s".into()), 7),
            opaque("local y = 2", 24),
        ];
        check_it(text, out);
    }

    #[test]
    fn test_qualified_target() {
        check_it("p.items[\"x\"] = {}", vec![opaque("p.items[\"x\"] = {}", 0)]);
        check_it("a.b:c[\"y\"] = {}", vec![opaque("a.b:c[\"y\"] = {}", 0)]);
    }

    #[test]
    fn test_function_value() {
        let text = "t[\"k\"] = {f = function(s) c[\"c\"] = {} end, n = 1}";
        let body = "function(s) c[\"c\"] = {} end";
        let fields = vec![
            field(name("f"), Expr::Opaque(body.into()), 10),
            field(name("n"), Expr::Number(1.0), 43),
        ];
        check_it(text, vec![assign("t", "k", table(fields), 0)]);
    }

    #[test]
    fn test_unclosed_function_value() {
        let text = "t[\"k\"] = {f = function() x = 1,\nt[\"j\"] = {}";
        let out = vec![
            opaque("t[\"k\"] = {f = function() x = 1,", 0),
            assign("t", "j", table(vec![]), 32),
        ];
        check_it(text, out);
    }

    #[test]
    fn test_unclosed_table() {
        let text = "a[\"A\"] = {Name = \"x\",\na[\"B\"] = {}";
        let out = vec![
            opaque("a[\"A\"] = {Name = \"x\",", 0),
            assign("a", "B", table(vec![]), 22),
        ];
        check_it(text, out);
    }

    #[test]
    fn test_unclosed_table_at_eof() {
        let text = "a[\"A\"] = {b = {1, 2}";
        check_it(text, vec![opaque(text, 0)]);
    }

    #[test]
    fn test_missing_value() {
        let text = "a[\"A\"] =\na[\"B\"] = {x = }";
        let out = vec![
            opaque("a[\"A\"] =", 0),
            assign(
                "a",
                "B",
                table(vec![field(name("x"), Expr::Opaque(String::new()), 19)]),
                9,
            ),
        ];
        check_it(text, out);
    }

    #[test]
    fn test_nested_tables() {
        let text = "g[\"Y\"] = {Stats = {[\"1\"] = {Stat = \"Damage\"}}, {}}";
        let inner = table(vec![field(name("Stat"), Expr::String("Damage".into()), 28)]);
        let stats = table(vec![field(Some(FieldKey::String("1".into())), inner, 19)]);
        let fields = vec![field(name("Stats"), stats, 10), field(None, table(vec![]), 47)];
        check_it(text, vec![assign("g", "Y", table(fields), 0)]);
    }

    #[test]
    fn test_string_contents() {
        assert_eq!(string_contents(r#""it\"s""#), "it\"s");
        assert_eq!(string_contents(r"'a\nb'"), r"a\nb");
        assert_eq!(string_contents(r#"'say \"hi\"'"#), r#"say \"hi\""#);
        assert_eq!(string_contents(r#""e\\""#), r"e\\");
        assert_eq!(string_contents("[[\nline]]"), "line");
        assert_eq!(string_contents("[==[a]]b]==]"), "a]]b");
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value("5"), Some(5.0));
        assert_eq!(number_value("-2.5"), Some(-2.5));
        assert_eq!(number_value("+.5"), Some(0.5));
        assert_eq!(number_value("1e3"), Some(1000.0));
        assert_eq!(number_value("0x1F"), Some(31.0));
        assert_eq!(number_value("-0x10"), Some(-16.0));
        assert_eq!(number_value("0x"), None);
    }

    #[test]
    fn test_empty() {
        check_it("", vec![]);
        check_it(" ;; -- nothing\n", vec![]);
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 100_000;
        let text = format!("t[\"k\"] = {}{}", "{".repeat(depth), "}".repeat(depth));
        let statements = parse_str(&text);
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            &statements[0],
            Statement::Assignment {
                value: Expr::Table(_),
                ..
            }
        ));
    }
}
