//! This module contains functions which can tokenize a string input.
//!
//! Lexing never fails. Characters which cannot start a token are skipped, as
//! are comments and unterminated strings, so a damaged region of a module only
//! loses the tokens inside it.

use std::iter::Peekable;
use std::str::CharIndices;

use super::token::Token;
use super::token::TokenType::{self, *};
use crate::diagnostic::Location;

/// Returns a lazy stream of the tokens in `source`.
pub(crate) fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// A `Lexer` handles the raw conversion of characters to tokens.
#[derive(Debug)]
pub(crate) struct Lexer<'a> {
    /// The starting position of the next character.
    pos: usize,
    iter: Peekable<CharIndices<'a>>,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Lexer {
            iter: source.char_indices().peekable(),
            pos: 0,
            source,
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.consume_whitespace();
            let tok_start = self.pos;
            let first_char = self.next_char()?;
            let tok_type = match first_char {
                '(' => Some(LParen),
                ')' => Some(RParen),
                '{' => Some(LCurly),
                '}' => Some(RCurly),
                ']' => Some(RSquare),
                ',' => Some(Comma),
                ';' => Some(Semi),
                // `::label::`
                ':' if self.try_next(':') => None,
                ':' => Some(Colon),
                '[' => self.lex_square(),

                // `==` is a comparison, never an assignment.
                '=' if self.try_next('=') => None,
                '=' => Some(Assign),
                '<' | '>' | '~' => {
                    self.try_next('=');
                    None
                }

                '-' if self.try_next('-') => {
                    self.comment();
                    None
                }
                '-' | '+' => self.lex_signed_number(),
                '.' => self.lex_leading_dot(),

                '\'' | '\"' => self.lex_string(first_char),

                _ if first_char.is_ascii_digit() => Some(self.lex_full_number(first_char)),

                _ if first_char.is_ascii_alphabetic() || first_char == '_' => {
                    Some(self.lex_word())
                }

                _ => None,
            };
            if let Some(typ) = tok_type {
                let len = self.pos - tok_start;
                return Some(Token::new(typ, tok_start, len as u32));
            }
        }
    }

    /// Skips a comment. The leading `--` has already been read.
    fn comment(&mut self) {
        if self.try_next('[') {
            if let Some(level) = self.long_bracket_open() {
                self.skip_long_bracket(level);
                return;
            }
        }
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                return;
            }
            self.next_char();
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek_char(&mut self) -> Option<char> {
        self.iter.peek().map(|(_, c)| *c)
    }

    fn next_char(&mut self) -> Option<char> {
        let (pos, c) = self.iter.next()?;
        self.pos = pos + c.len_utf8();
        Some(c)
    }

    /// Moves forward until the position reaches `target`.
    fn advance_to(&mut self, target: usize) {
        while self.pos < target {
            if self.next_char().is_none() {
                break;
            }
        }
    }

    /// Consume any whitespace characters
    fn consume_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.next_char();
        }
    }

    /// Move a character forward, only if the current character matches
    /// `expected`.
    fn try_next(&mut self, expected: char) -> bool {
        match self.peek_char() {
            Some(c) if c == expected => {
                self.next_char();
                true
            }
            _ => false,
        }
    }

    /// The lexer just read a `[`. It is either a plain `LSquare` or the
    /// opening of a long string like `[[...]]` or `[==[...]==]`.
    fn lex_square(&mut self) -> Option<TokenType> {
        match self.long_bracket_open() {
            Some(level) if self.skip_long_bracket(level) => Some(LiteralString),
            Some(_) => None,
            None => Some(LSquare),
        }
    }

    /// Having read a `[`, checks for the rest of a long bracket opening
    /// (`=`* followed by `[`). If found, it is consumed and the number of `=`
    /// is returned.
    fn long_bracket_open(&mut self) -> Option<usize> {
        let bytes = self.rest().as_bytes();
        let level = bytes.iter().take_while(|&&b| b == b'=').count();
        if bytes.get(level) == Some(&b'[') {
            self.advance_to(self.pos + level + 1);
            Some(level)
        } else {
            None
        }
    }

    /// Skips past the long bracket closing of the given level. Returns
    /// `false` if the input ended first.
    fn skip_long_bracket(&mut self, level: usize) -> bool {
        let close = format!("]{}]", "=".repeat(level));
        match self.rest().find(&close) {
            Some(i) => {
                self.advance_to(self.pos + i + close.len());
                true
            }
            None => {
                self.advance_to(self.source.len());
                false
            }
        }
    }

    /// Tokenize a 'short' literal string, AKA a string denoted by single or
    /// double quotes and not by two square brackets.
    ///
    /// A string which reaches the end of its line unclosed is dropped.
    fn lex_string(&mut self, delimiter: char) -> Option<TokenType> {
        while let Some(c) = self.peek_char() {
            if c == '\n' || c == '\r' {
                return None;
            }
            self.next_char();
            if c == delimiter {
                return Some(LiteralString);
            } else if c == '\\' {
                // The escaped character can never close the string.
                self.next_char();
            }
        }
        None
    }

    /// The lexer just read a `+` or `-`. It only starts a number when a digit
    /// (or a decimal point and a digit) follows immediately.
    fn lex_signed_number(&mut self) -> Option<TokenType> {
        match self.peek_char() {
            Some(c) if c.is_ascii_digit() => {
                self.next_char();
                Some(self.lex_full_number(c))
            }
            Some('.') if self.rest()[1..].starts_with(|c: char| c.is_ascii_digit()) => {
                self.next_char();
                self.lex_number_after_decimal();
                Some(LiteralNumber)
            }
            _ => None,
        }
    }

    /// The lexer just read a `.`. It is a number in the form `.4`, a field
    /// access, or part of the `..` and `...` operators, which are skipped.
    fn lex_leading_dot(&mut self) -> Option<TokenType> {
        match self.peek_char() {
            Some(c) if c.is_ascii_digit() => {
                self.lex_number_after_decimal();
                Some(LiteralNumber)
            }
            Some('.') => {
                while self.try_next('.') {}
                None
            }
            _ => Some(Dot),
        }
    }

    /// Read in a number which starts with a digit (as opposed to a decimal
    /// point).
    fn lex_full_number(&mut self, first_char: char) -> TokenType {
        if first_char == '0' && (self.try_next('x') || self.try_next('X')) {
            while let Some(c) = self.peek_char() {
                if c.is_ascii_hexdigit() {
                    self.next_char();
                } else {
                    break;
                }
            }
        } else {
            self.lex_digits();
            if self.try_next('.') {
                self.lex_digits();
            }
            self.lex_exponent();
        }
        LiteralNumber
    }

    /// Read in a literal number which had no digits before the decimal point.
    fn lex_number_after_decimal(&mut self) {
        self.lex_digits();
        self.lex_exponent();
    }

    /// Read in an unbroken sequence of digits.
    fn lex_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Read in the optional exponent part of a literal number. An `e` with no
    /// digits after it is left for the next token.
    fn lex_exponent(&mut self) {
        let bytes = self.rest().as_bytes();
        if !matches!(bytes.first(), Some(b'e' | b'E')) {
            return;
        }
        let digits_at = match bytes.get(1) {
            Some(b'+' | b'-') => 2,
            _ => 1,
        };
        if bytes.get(digits_at).is_some_and(u8::is_ascii_digit) {
            self.advance_to(self.pos + digits_at);
            self.lex_digits();
        }
    }

    fn lex_word(&mut self) -> TokenType {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        Identifier
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Maps byte offsets back to 1-based line and column numbers.
#[derive(Debug)]
pub(crate) struct LineIndex {
    /// `linebreaks[i]` is the byte offset of the start of line `i`.
    linebreaks: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut linebreaks = vec![0];
        linebreaks.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { linebreaks }
    }

    pub(crate) fn line_and_col(&self, pos: usize) -> (usize, usize) {
        // `linebreaks[0]` is 0, so at least one line always matches.
        let line = self.linebreaks.partition_point(|&start| start <= pos);
        let column = pos - self.linebreaks[line - 1];
        // lines and columns start counting at 1
        (line, column + 1)
    }

    pub(crate) fn location(&self, pos: usize) -> Location {
        let (line, column) = self.line_and_col(pos);
        Location { line, column }
    }
}
