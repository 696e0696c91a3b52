use crate::error::{Error, Location};
use crate::tree::Span;

/// Byte cursor over one input text. All state is local to a single parse;
/// backtracking restores a previously saved state and nothing else.
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct State {
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// One-byte lookahead past the current byte, used to tell `$(`
    /// expressions apart from bare binary values.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    pub fn bump(&mut self) {
        if let Some(byte) = self.peek() {
            self.pos += 1;
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Consumes `byte` if it is next.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.bump();
            return true;
        }
        false
    }

    /// Consumes `token` only if the input continues with it in full.
    pub fn eat_str(&mut self, token: &str) -> bool {
        if self.input[self.pos..].starts_with(token) {
            for _ in 0..token.len() {
                self.bump();
            }
            return true;
        }
        false
    }

    pub fn location(&self) -> Location {
        Location {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn save(&self) -> State {
        State {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn restore(&mut self, state: State) {
        self.pos = state.pos;
        self.line = state.line;
        self.column = state.column;
    }

    pub fn slice(&self, span: Span) -> &'a str {
        &self.input[span.start..span.end]
    }

    pub fn span_from(&self, start: usize) -> Span {
        Span {
            start,
            end: self.pos,
        }
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::grammar(message, self.location())
    }
}
