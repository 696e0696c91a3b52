//! Leaf literal rules of the JAXN dialect: whitespace and comments, quoted
//! strings, numbers, and binary values. The grammar layer composes these;
//! string decoding lives here so escape handling exists exactly once.

use memchr::memchr;

use crate::cursor::Cursor;
use crate::error::Error;
use crate::tree::{Node, Rule, Span};

type Result<T> = std::result::Result<T, Error>;

/// Skips whitespace and comments: `#` and `//` to end of line, `/* ... */`
/// blocks. An unterminated block comment is a grammar error.
pub(crate) fn skip_ws(cur: &mut Cursor<'_>) -> Result<()> {
    loop {
        match cur.peek() {
            Some(b' ' | b'\t' | b'\n' | b'\r') => cur.bump(),
            Some(b'#') => skip_line(cur),
            Some(b'/') if cur.peek_at(1) == Some(b'/') => skip_line(cur),
            Some(b'/') if cur.peek_at(1) == Some(b'*') => {
                cur.bump();
                cur.bump();
                loop {
                    if cur.at_eof() {
                        return Err(cur.error("unterminated comment"));
                    }
                    if cur.peek() == Some(b'*') && cur.peek_at(1) == Some(b'/') {
                        cur.bump();
                        cur.bump();
                        break;
                    }
                    cur.bump();
                }
            }
            _ => return Ok(()),
        }
    }
}

/// Skips whitespace and requires that at least one character was consumed.
pub(crate) fn skip_rws(cur: &mut Cursor<'_>) -> Result<bool> {
    let start = cur.pos();
    skip_ws(cur)?;
    Ok(cur.pos() > start)
}

fn skip_line(cur: &mut Cursor<'_>) {
    while let Some(byte) = cur.peek() {
        if byte == b'\n' {
            break;
        }
        cur.bump();
    }
}

fn hex_digit(byte: u8) -> Option<u32> {
    match byte {
        b'0'..=b'9' => Some(u32::from(byte - b'0')),
        b'a'..=b'f' => Some(u32::from(byte - b'a' + 10)),
        b'A'..=b'F' => Some(u32::from(byte - b'A' + 10)),
        _ => None,
    }
}

fn is_hex(byte: u8) -> bool {
    hex_digit(byte).is_some()
}

/// Scans one quoted string literal (single or double quotes), validating
/// escapes and surrogate pairing. Returns the span including the quotes, or
/// `None` when the cursor is not at a quote.
pub(crate) fn try_quoted(cur: &mut Cursor<'_>) -> Result<Option<Span>> {
    let quote = match cur.peek() {
        Some(byte @ (b'"' | b'\'')) => byte,
        _ => return Ok(None),
    };
    let start = cur.pos();
    cur.bump();
    loop {
        match cur.peek() {
            None => return Err(cur.error("unterminated string")),
            Some(byte) if byte == quote => {
                cur.bump();
                return Ok(Some(cur.span_from(start)));
            }
            Some(b'\\') => {
                cur.bump();
                scan_escape(cur)?;
            }
            Some(byte) if byte < 0x20 => {
                return Err(cur.error("invalid character in string"));
            }
            Some(_) => cur.bump(),
        }
    }
}

fn scan_escape(cur: &mut Cursor<'_>) -> Result<()> {
    match cur.peek() {
        None => Err(cur.error("unterminated string")),
        Some(b'"' | b'\'' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' | b'0') => {
            cur.bump();
            Ok(())
        }
        Some(b'u') => {
            cur.bump();
            scan_unicode_escape(cur)
        }
        Some(_) => Err(cur.error("invalid escape")),
    }
}

fn scan_unicode_escape(cur: &mut Cursor<'_>) -> Result<()> {
    if cur.eat(b'{') {
        let mut value: u32 = 0;
        let mut digits = 0;
        while let Some(digit) = cur.peek().and_then(hex_digit) {
            value = value.saturating_mul(16).saturating_add(digit);
            digits += 1;
            cur.bump();
        }
        if digits == 0 || digits > 6 || !cur.eat(b'}') || char::from_u32(value).is_none() {
            return Err(cur.error("invalid unicode escape"));
        }
        return Ok(());
    }
    let first = scan_hex4(cur)?;
    if (0xDC00..=0xDFFF).contains(&first) {
        return Err(cur.error("invalid unicode escape"));
    }
    if (0xD800..=0xDBFF).contains(&first) {
        // high surrogate: the low half must follow immediately
        if !(cur.eat(b'\\') && cur.eat(b'u')) {
            return Err(cur.error("invalid unicode escape"));
        }
        let second = scan_hex4(cur)?;
        if !(0xDC00..=0xDFFF).contains(&second) {
            return Err(cur.error("invalid unicode escape"));
        }
    }
    Ok(())
}

fn scan_hex4(cur: &mut Cursor<'_>) -> Result<u32> {
    let mut value: u32 = 0;
    for _ in 0..4 {
        match cur.peek().and_then(hex_digit) {
            Some(digit) => {
                value = value * 16 + digit;
                cur.bump();
            }
            None => return Err(cur.error("invalid unicode escape")),
        }
    }
    Ok(value)
}

/// Decodes a captured string literal (quotes included) to its content.
/// Inputs come from spans already validated by [`try_quoted`], so a
/// malformed literal here means the grammar and this decoder disagree.
pub(crate) fn decode_string(raw: &str) -> Result<String> {
    let malformed = || Error::invariant(format!("malformed string literal: {raw}"));
    if raw.len() < 2 {
        return Err(malformed());
    }
    let inner = &raw[1..raw.len() - 1];
    if memchr(b'\\', inner.as_bytes()).is_none() {
        return Ok(inner.to_string());
    }
    let bytes = inner.as_bytes();
    let mut out = String::with_capacity(inner.len());
    let mut idx = 0;
    while idx < bytes.len() {
        let Some(offset) = memchr(b'\\', &bytes[idx..]) else {
            out.push_str(&inner[idx..]);
            break;
        };
        let pos = idx + offset;
        out.push_str(&inner[idx..pos]);
        let next = *bytes.get(pos + 1).ok_or_else(malformed)?;
        idx = pos + 2;
        match next {
            b'"' => out.push('"'),
            b'\'' => out.push('\''),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{8}'),
            b'f' => out.push('\u{c}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'v' => out.push('\u{b}'),
            b'0' => out.push('\0'),
            b'u' => {
                idx = decode_unicode_escape(inner, idx, &mut out).ok_or_else(malformed)?;
            }
            _ => return Err(malformed()),
        }
    }
    Ok(out)
}

fn decode_unicode_escape(inner: &str, idx: usize, out: &mut String) -> Option<usize> {
    let bytes = inner.as_bytes();
    if bytes.get(idx) == Some(&b'{') {
        let end = idx + memchr(b'}', &bytes[idx..])?;
        let value = u32::from_str_radix(&inner[idx + 1..end], 16).ok()?;
        out.push(char::from_u32(value)?);
        return Some(end + 1);
    }
    let first = u32::from_str_radix(inner.get(idx..idx + 4)?, 16).ok()?;
    if (0xD800..=0xDBFF).contains(&first) {
        if inner.get(idx + 4..idx + 6)? != "\\u" {
            return None;
        }
        let second = u32::from_str_radix(inner.get(idx + 6..idx + 10)?, 16).ok()?;
        if !(0xDC00..=0xDFFF).contains(&second) {
            return None;
        }
        let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
        out.push(char::from_u32(combined)?);
        return Some(idx + 10);
    }
    out.push(char::from_u32(first)?);
    Some(idx + 4)
}

/// Scans a number after any sign has been consumed by the dispatcher.
/// Accepts decimals with optional fraction and exponent, leading and
/// trailing dots, hex integers, `Infinity` and `NaN`. Returns `None` when
/// the input does not start a number at all.
pub(crate) fn try_number(cur: &mut Cursor<'_>, negative: bool) -> Result<Option<Node>> {
    let saved = cur.save();
    let start = cur.pos();

    if cur.eat_str("Infinity") {
        let rule = if negative {
            Rule::NegInfinity
        } else {
            Rule::Infinity
        };
        return Ok(Some(Node::structural(rule, cur.span_from(start), Vec::new())));
    }
    if cur.eat_str("NaN") {
        return Ok(Some(Node::structural(Rule::NaN, cur.span_from(start), Vec::new())));
    }

    if cur.peek() == Some(b'0') && matches!(cur.peek_at(1), Some(b'x' | b'X')) {
        cur.bump();
        cur.bump();
        let mut digits = 0;
        while cur.peek().is_some_and(is_hex) {
            cur.bump();
            digits += 1;
        }
        if digits == 0 {
            return Err(cur.error("incomplete number"));
        }
        let rule = if negative {
            Rule::NegHexNumber
        } else {
            Rule::HexNumber
        };
        let span = cur.span_from(start);
        return Ok(Some(Node::leaf(rule, span, cur.slice(span))));
    }

    let int_digits = scan_digits(cur);
    if int_digits > 1 && cur.slice(cur.span_from(start)).starts_with('0') {
        return Err(cur.error("invalid number"));
    }
    let mut frac_digits = 0;
    if cur.peek() == Some(b'.') {
        if int_digits == 0 && !cur.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            cur.restore(saved);
            return Ok(None);
        }
        cur.bump();
        frac_digits = scan_digits(cur);
    }
    if int_digits == 0 && frac_digits == 0 {
        cur.restore(saved);
        return Ok(None);
    }
    if matches!(cur.peek(), Some(b'e' | b'E')) {
        cur.bump();
        if matches!(cur.peek(), Some(b'+' | b'-')) {
            cur.bump();
        }
        if scan_digits(cur) == 0 {
            return Err(cur.error("incomplete number"));
        }
    }
    let rule = if negative {
        Rule::NegNumber
    } else {
        Rule::Number
    };
    let span = cur.span_from(start);
    Ok(Some(Node::leaf(rule, span, cur.slice(span))))
}

fn scan_digits(cur: &mut Cursor<'_>) -> usize {
    let mut count = 0;
    while cur.peek().is_some_and(|b| b.is_ascii_digit()) {
        cur.bump();
        count += 1;
    }
    count
}

/// Scans one binary value: `$` followed by either a quoted byte string or
/// hex byte pairs with optional `.` separators; a bare `$` is the empty
/// binary. The caller has already ruled out `$(`.
pub(crate) fn try_binary(cur: &mut Cursor<'_>) -> Result<Option<Node>> {
    if cur.peek() != Some(b'$') {
        return Ok(None);
    }
    let start = cur.pos();
    cur.bump();
    match cur.peek() {
        Some(quote @ (b'"' | b'\'')) => {
            cur.bump();
            loop {
                match cur.peek() {
                    None => return Err(cur.error("unterminated binary")),
                    Some(byte) if byte == quote => {
                        cur.bump();
                        break;
                    }
                    Some(b'\\') => {
                        cur.bump();
                        scan_binary_escape(cur)?;
                    }
                    Some(byte) if byte < 0x20 || byte >= 0x80 => {
                        return Err(cur.error("invalid character in binary"));
                    }
                    Some(_) => cur.bump(),
                }
            }
        }
        _ => {
            while cur.peek().is_some_and(is_hex) {
                cur.bump();
                if !cur.peek().is_some_and(is_hex) {
                    return Err(cur.error("invalid binary"));
                }
                cur.bump();
                if cur.peek() == Some(b'.') && cur.peek_at(1).is_some_and(is_hex) {
                    cur.bump();
                }
            }
        }
    }
    let span = cur.span_from(start);
    Ok(Some(Node::leaf(Rule::BinaryLiteral, span, cur.slice(span))))
}

fn scan_binary_escape(cur: &mut Cursor<'_>) -> Result<()> {
    match cur.peek() {
        Some(b'"' | b'\'' | b'\\' | b'/') => {
            cur.bump();
            Ok(())
        }
        Some(b'x') => {
            cur.bump();
            for _ in 0..2 {
                if !cur.peek().is_some_and(is_hex) {
                    return Err(cur.error("invalid escape"));
                }
                cur.bump();
            }
            Ok(())
        }
        _ => Err(cur.error("invalid escape")),
    }
}
