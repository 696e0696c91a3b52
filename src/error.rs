use memchr::memchr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Grammar,
    Reduce,
    Invariant,
    NotImplemented,
    Io,
}

/// A source position: byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Recomputes the line/column of a byte offset within `input`.
    pub fn of(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let bytes = &input.as_bytes()[..offset];
        let line = bytes.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = bytes
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |idx| idx + 1);
        Self {
            offset,
            line,
            column: offset - line_start + 1,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}{}", location_suffix(.location))]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!(" at {}:{}", location.line, location.column),
        None => String::new(),
    }
}

impl Error {
    pub fn grammar(message: impl Into<String>, location: Location) -> Self {
        Self {
            kind: ErrorKind::Grammar,
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn reduce(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Reduce,
            message: message.into(),
            location: None,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Invariant,
            message: message.into(),
            location: None,
        }
    }

    pub fn not_implemented(context: &'static str) -> Self {
        Self {
            kind: ErrorKind::NotImplemented,
            message: format!("not implemented: {context}"),
            location: None,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io,
            message: message.into(),
            location: None,
        }
    }

    /// Prefixes the message with a file path, for errors raised while
    /// processing an included file.
    pub fn in_file(mut self, path: &std::path::Path) -> Self {
        self.message = format!("{}: {}", path.display(), self.message);
        self
    }

    /// Renders the error for terminal output: the message, then the
    /// offending source line with a caret under the failing column.
    pub fn render(&self, input: &str) -> String {
        match self.location {
            Some(location) => {
                let line = line_of(input, location);
                let caret = " ".repeat(location.column.saturating_sub(1));
                format!("{self}\n{line}\n{caret}^")
            }
            None => self.to_string(),
        }
    }
}

/// The full source line containing `location`, without its terminator.
pub fn line_of(input: &str, location: Location) -> &str {
    let offset = location.offset.min(input.len());
    let start = input.as_bytes()[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |idx| idx + 1);
    let rest = &input[start..];
    let end = memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len());
    rest[..end].trim_end_matches('\r')
}
