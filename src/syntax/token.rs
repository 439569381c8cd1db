use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Token {
    pub(crate) typ: TokenType,
    pub(crate) start: usize,
    pub(crate) len: u32,
}

#[rustfmt::skip]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenType {
    // L/R stuff
    LParen, RParen, LCurly, RCurly, LSquare, RSquare,
    // Other symbols
    Semi, Comma, Assign, Dot, Colon,
    // Others
    Identifier,
    LiteralNumber,
    LiteralString,
}

impl Token {
    pub(crate) fn new(typ: TokenType, start: usize, len: u32) -> Self {
        Token { typ, start, len }
    }

    pub(crate) fn range(&self) -> Range<usize> {
        let start = self.start;
        let end = start + self.len as usize;
        start..end
    }

    /// The original source code covered by this token.
    pub(crate) fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }

    pub(crate) fn end(&self) -> usize {
        self.start + self.len as usize
    }
}
