//! The statement grammar: recursive descent with one function per rule.
//! Soft alternatives return `Ok(None)` and restore the cursor; once a rule
//! is committed (`if_must` positions in the grammar) failures are hard
//! errors carrying the current source position. Tree construction follows
//! the retention policy in [`crate::tree`]: unlisted rules leave no node,
//! so fragment concatenation flattens into a single structural node.

use crate::cursor::Cursor;
use crate::error::Error;
use crate::jaxn;
use crate::tree::{Node, Rule, Span};

type Result<T> = std::result::Result<T, Error>;

pub(crate) fn parse(input: &str) -> Result<Node> {
    Parser {
        cur: Cursor::new(input),
    }
    .parse_document()
}

/// Value-parsing strategy chosen from one (sometimes two) bytes of
/// lookahead. Pure dispatch; the lowest matching entry wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueStart {
    Object,
    Array,
    Null,
    True,
    False,
    String,
    ExpressionList,
    Binary,
    Signed { negative: bool },
    Number,
}

fn classify(first: u8, second: Option<u8>) -> ValueStart {
    match first {
        b'{' => ValueStart::Object,
        b'[' => ValueStart::Array,
        b'n' => ValueStart::Null,
        b't' => ValueStart::True,
        b'f' => ValueStart::False,
        b'"' | b'\'' => ValueStart::String,
        b'$' if second == Some(b'(') => ValueStart::ExpressionList,
        b'$' => ValueStart::Binary,
        b'+' => ValueStart::Signed { negative: false },
        b'-' => ValueStart::Signed { negative: true },
        _ => ValueStart::Number,
    }
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'$' | b'-')
}

struct Parser<'a> {
    cur: Cursor<'a>,
}

impl Parser<'_> {
    fn parse_document(mut self) -> Result<Node> {
        let mut statements = Vec::new();
        loop {
            jaxn::skip_ws(&mut self.cur)?;
            if self.cur.at_eof() {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        let span = Span {
            start: 0,
            end: self.cur.pos(),
        };
        Ok(Node::root(span, statements))
    }

    /// `include`/`delete` are ordinary identifiers everywhere else, so both
    /// statement forms back off to a plain member when their shape does not
    /// follow through.
    fn parse_statement(&mut self) -> Result<Node> {
        if let Some(node) = self.try_include()? {
            return Ok(node);
        }
        if let Some(node) = self.try_delete()? {
            return Ok(node);
        }
        match self.try_member()? {
            Some(node) => Ok(node),
            None => Err(self.cur.error("expected statement")),
        }
    }

    fn try_include(&mut self) -> Result<Option<Node>> {
        let saved = self.cur.save();
        let start = self.cur.pos();
        if !self.cur.eat_str("include") || !jaxn::skip_rws(&mut self.cur)? {
            self.cur.restore(saved);
            return Ok(None);
        }
        if !self.at_string_start() {
            self.cur.restore(saved);
            return Ok(None);
        }
        let string = self.parse_string()?;
        let end = string.span().end;
        Ok(Some(Node::structural(
            Rule::IncludeFile,
            Span { start, end },
            vec![string],
        )))
    }

    fn try_delete(&mut self) -> Result<Option<Node>> {
        let saved = self.cur.save();
        let start = self.cur.pos();
        if !self.cur.eat_str("delete") || !jaxn::skip_rws(&mut self.cur)? {
            self.cur.restore(saved);
            return Ok(None);
        }
        let Some(key) = self.try_mkey()? else {
            self.cur.restore(saved);
            return Ok(None);
        };
        let end = key.span().end;
        Ok(Some(Node::structural(
            Rule::DeleteKeys,
            Span { start, end },
            vec![key],
        )))
    }

    fn try_member(&mut self) -> Result<Option<Node>> {
        let start = self.cur.pos();
        let Some(key) = self.try_mkey()? else {
            return Ok(None);
        };
        // the key committed this rule: separator and value are required
        self.parse_name_separator()?;
        let value = self.parse_value()?;
        let end = value.span().end;
        Ok(Some(Node::structural(
            Rule::Member,
            Span { start, end },
            vec![key, value],
        )))
    }

    fn parse_name_separator(&mut self) -> Result<()> {
        jaxn::skip_ws(&mut self.cur)?;
        if !self.cur.eat(b':') && !self.cur.eat(b'=') {
            return Err(self.cur.error("expected ':' or '='"));
        }
        jaxn::skip_ws(&mut self.cur)
    }

    /// Member key path: identifier or quoted segments joined by `.` with no
    /// surrounding whitespace. A trailing dot is left unconsumed.
    fn try_mkey(&mut self) -> Result<Option<Node>> {
        let start = self.cur.pos();
        let Some(first) = self.try_mkey_part()? else {
            return Ok(None);
        };
        let mut parts = vec![first];
        loop {
            let saved = self.cur.save();
            if !self.cur.eat(b'.') {
                break;
            }
            match self.try_mkey_part()? {
                Some(part) => parts.push(part),
                None => {
                    self.cur.restore(saved);
                    break;
                }
            }
        }
        Ok(Some(Node::structural(
            Rule::MemberKey,
            self.cur.span_from(start),
            parts,
        )))
    }

    fn try_mkey_part(&mut self) -> Result<Option<Node>> {
        if let Some(ident) = self.try_identifier() {
            return Ok(Some(ident));
        }
        if let Some(span) = jaxn::try_quoted(&mut self.cur)? {
            return Ok(Some(Node::leaf(
                Rule::QuotedString,
                span,
                self.cur.slice(span),
            )));
        }
        Ok(None)
    }

    fn try_identifier(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        while self.cur.peek().is_some_and(is_ident_byte) {
            self.cur.bump();
        }
        if self.cur.pos() == start {
            return None;
        }
        let span = self.cur.span_from(start);
        Some(Node::leaf(Rule::Identifier, span, self.cur.slice(span)))
    }

    /// One value, right-padded: trailing whitespace is consumed but never
    /// included in the returned node's span.
    fn parse_value(&mut self) -> Result<Node> {
        let Some(first) = self.cur.peek() else {
            return Err(self.cur.error("expected value"));
        };
        let node = match classify(first, self.cur.peek_at(1)) {
            ValueStart::Object => self.parse_object()?,
            ValueStart::Array => self.parse_array()?,
            ValueStart::Null => self.parse_keyword("null", Rule::Null)?,
            ValueStart::True => self.parse_keyword("true", Rule::True)?,
            ValueStart::False => self.parse_keyword("false", Rule::False)?,
            ValueStart::String => self.parse_string()?,
            ValueStart::ExpressionList => self.parse_expression_list()?,
            ValueStart::Binary => self.parse_binary()?,
            ValueStart::Signed { negative } => {
                self.cur.bump();
                match jaxn::try_number(&mut self.cur, negative)? {
                    Some(node) => node,
                    None => return Err(self.cur.error("incomplete number")),
                }
            }
            ValueStart::Number => match jaxn::try_number(&mut self.cur, false)? {
                Some(node) => node,
                None => return Err(self.cur.error("expected value")),
            },
        };
        jaxn::skip_ws(&mut self.cur)?;
        Ok(node)
    }

    fn parse_keyword(&mut self, keyword: &str, rule: Rule) -> Result<Node> {
        let start = self.cur.pos();
        if !self.cur.eat_str(keyword) {
            return Err(self.cur.error("expected value"));
        }
        Ok(Node::structural(rule, self.cur.span_from(start), Vec::new()))
    }

    fn at_string_start(&self) -> bool {
        matches!(self.cur.peek(), Some(b'"' | b'\''))
            || (self.cur.peek() == Some(b'$') && self.cur.peek_at(1) == Some(b'('))
    }

    /// String value: fragments joined by `+`, each a quoted literal piece or
    /// an embedded expression, flattened into one `String` node.
    fn parse_string(&mut self) -> Result<Node> {
        let start = self.cur.pos();
        let mut children = Vec::new();
        self.parse_string_fragment(&mut children)?;
        let mut end = self.cur.pos();
        while self.eat_concat()? {
            self.parse_string_fragment(&mut children)?;
            end = self.cur.pos();
        }
        Ok(Node::structural(Rule::String, Span { start, end }, children))
    }

    fn parse_string_fragment(&mut self, children: &mut Vec<Node>) -> Result<()> {
        if self.cur.peek() == Some(b'$') && self.cur.peek_at(1) == Some(b'(') {
            children.push(self.parse_expression()?);
            return Ok(());
        }
        match jaxn::try_quoted(&mut self.cur)? {
            Some(span) => {
                children.push(Node::leaf(Rule::StringFragment, span, self.cur.slice(span)));
                Ok(())
            }
            None => Err(self.cur.error("expected string")),
        }
    }

    /// Consumes a `+` concatenation separator with surrounding whitespace,
    /// or restores the cursor and reports `false`.
    fn eat_concat(&mut self) -> Result<bool> {
        let saved = self.cur.save();
        jaxn::skip_ws(&mut self.cur)?;
        if !self.cur.eat(b'+') {
            self.cur.restore(saved);
            return Ok(false);
        }
        jaxn::skip_ws(&mut self.cur)?;
        Ok(true)
    }

    fn parse_binary(&mut self) -> Result<Node> {
        let start = self.cur.pos();
        let mut children = Vec::new();
        self.parse_binary_fragment(&mut children)?;
        let mut end = self.cur.pos();
        while self.eat_concat()? {
            self.parse_binary_fragment(&mut children)?;
            end = self.cur.pos();
        }
        Ok(Node::structural(Rule::Binary, Span { start, end }, children))
    }

    fn parse_binary_fragment(&mut self, children: &mut Vec<Node>) -> Result<()> {
        if self.cur.peek() == Some(b'$') && self.cur.peek_at(1) == Some(b'(') {
            children.push(self.parse_expression()?);
            return Ok(());
        }
        match jaxn::try_binary(&mut self.cur)? {
            Some(node) => {
                children.push(node);
                Ok(())
            }
            None => Err(self.cur.error("expected binary")),
        }
    }

    fn parse_array(&mut self) -> Result<Node> {
        let start = self.cur.pos();
        let mut children = Vec::new();
        self.parse_array_value(&mut children)?;
        let mut end = self.cur.pos();
        while self.eat_concat()? {
            if self.cur.peek() == Some(b'$') && self.cur.peek_at(1) == Some(b'(') {
                children.push(self.parse_expression()?);
            } else if self.cur.peek() == Some(b'[') {
                self.parse_array_value(&mut children)?;
            } else {
                return Err(self.cur.error("expected array"));
            }
            end = self.cur.pos();
        }
        Ok(Node::structural(Rule::Array, Span { start, end }, children))
    }

    /// One bracketed `[...]` group: elements separated by `,`, trailing
    /// comma allowed. Elements append to the surrounding fragment list.
    fn parse_array_value(&mut self, children: &mut Vec<Node>) -> Result<()> {
        self.cur.bump(); // '['
        jaxn::skip_ws(&mut self.cur)?;
        if self.cur.eat(b']') {
            return Ok(());
        }
        loop {
            let value = self.parse_value()?;
            children.push(Node::structural(Rule::Element, value.span(), vec![value]));
            if self.cur.eat(b',') {
                jaxn::skip_ws(&mut self.cur)?;
                if self.cur.eat(b']') {
                    return Ok(());
                }
                continue;
            }
            if self.cur.eat(b']') {
                return Ok(());
            }
            return Err(self.cur.error("expected ',' or ']'"));
        }
    }

    fn parse_object(&mut self) -> Result<Node> {
        let start = self.cur.pos();
        let mut children = Vec::new();
        self.parse_object_value(&mut children)?;
        let mut end = self.cur.pos();
        while self.eat_concat()? {
            if self.cur.peek() == Some(b'$') && self.cur.peek_at(1) == Some(b'(') {
                children.push(self.parse_expression()?);
            } else if self.cur.peek() == Some(b'{') {
                self.parse_object_value(&mut children)?;
            } else {
                return Err(self.cur.error("expected object"));
            }
            end = self.cur.pos();
        }
        Ok(Node::structural(Rule::Object, Span { start, end }, children))
    }

    /// One braced `{...}` group: members with optional `,` separators.
    fn parse_object_value(&mut self, children: &mut Vec<Node>) -> Result<()> {
        self.cur.bump(); // '{'
        loop {
            jaxn::skip_ws(&mut self.cur)?;
            if self.cur.eat(b'}') {
                return Ok(());
            }
            match self.try_member()? {
                Some(member) => {
                    children.push(member);
                    self.cur.eat(b',');
                }
                None => return Err(self.cur.error("expected '}'")),
            }
        }
    }

    /// `$(` then a function call or a key reference, then `)`.
    fn parse_expression(&mut self) -> Result<Node> {
        let start = self.cur.pos();
        self.cur.bump(); // '$'
        self.cur.bump(); // '('
        let inner = if let Some(function) = self.try_function()? {
            function
        } else if let Some(key) = self.try_rkey()? {
            key
        } else {
            return Err(self.cur.error("expected function or key"));
        };
        if !self.cur.eat(b')') {
            return Err(self.cur.error("expected ')'"));
        }
        Ok(Node::structural(
            Rule::Expression,
            self.cur.span_from(start),
            vec![inner],
        ))
    }

    /// Function call: identifier, required whitespace, then `,`-separated
    /// parameters. Backs off (for a key reference) only before the first
    /// parameter's separator commits it.
    fn try_function(&mut self) -> Result<Option<Node>> {
        let saved = self.cur.save();
        let start = self.cur.pos();
        let Some(name) = self.try_identifier() else {
            return Ok(None);
        };
        if !jaxn::skip_rws(&mut self.cur)? {
            self.cur.restore(saved);
            return Ok(None);
        }
        let Some(first) = self.try_function_param()? else {
            self.cur.restore(saved);
            return Ok(None);
        };
        let mut children = vec![name, first];
        loop {
            let before = self.cur.save();
            if !self.cur.eat(b',') {
                break;
            }
            jaxn::skip_ws(&mut self.cur)?;
            match self.try_function_param()? {
                Some(param) => children.push(param),
                None => {
                    self.cur.restore(before);
                    break;
                }
            }
        }
        let end = children.last().map_or(start, |node| node.span().end);
        Ok(Some(Node::structural(
            Rule::Function,
            Span { start, end },
            children,
        )))
    }

    fn try_function_param(&mut self) -> Result<Option<Node>> {
        let start = self.cur.pos();
        let Some(name) = self.try_identifier() else {
            return Ok(None);
        };
        self.parse_name_separator()?;
        let value = self.parse_value()?;
        let end = value.span().end;
        Ok(Some(Node::structural(
            Rule::FunctionParam,
            Span { start, end },
            vec![name, value],
        )))
    }

    /// Key reference inside an expression: string-or-identifier segments
    /// joined by `.`.
    fn try_rkey(&mut self) -> Result<Option<Node>> {
        let start = self.cur.pos();
        let Some(first) = self.try_rkey_part()? else {
            return Ok(None);
        };
        let mut parts = vec![first];
        loop {
            let saved = self.cur.save();
            if !self.cur.eat(b'.') {
                break;
            }
            match self.try_rkey_part()? {
                Some(part) => parts.push(part),
                None => {
                    self.cur.restore(saved);
                    break;
                }
            }
        }
        Ok(Some(Node::structural(
            Rule::RefKey,
            self.cur.span_from(start),
            parts,
        )))
    }

    fn try_rkey_part(&mut self) -> Result<Option<Node>> {
        if self.at_string_start() {
            return self.parse_string().map(Some);
        }
        Ok(self.try_identifier())
    }

    /// Expression list: an expression optionally concatenated with further
    /// expressions or whole string/binary/object/array values. A lone
    /// expression stays a plain `Expression` node.
    fn parse_expression_list(&mut self) -> Result<Node> {
        let start = self.cur.pos();
        let mut fragments = vec![self.parse_expression()?];
        let mut end = self.cur.pos();
        while self.eat_concat()? {
            let Some(first) = self.cur.peek() else {
                return Err(self.cur.error("expected value"));
            };
            let fragment = match classify(first, self.cur.peek_at(1)) {
                ValueStart::ExpressionList => self.parse_expression()?,
                ValueStart::String => self.parse_string()?,
                ValueStart::Binary => self.parse_binary()?,
                ValueStart::Object => self.parse_object()?,
                ValueStart::Array => self.parse_array()?,
                _ => return Err(self.cur.error("expected value")),
            };
            fragments.push(fragment);
            end = self.cur.pos();
        }
        if fragments.len() == 1 {
            return Ok(fragments.pop().expect("one fragment"));
        }
        Ok(Node::structural(
            Rule::ExpressionList,
            Span { start, end },
            fragments,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_second_byte_only_for_dollar() {
        assert_eq!(classify(b'$', Some(b'(')), ValueStart::ExpressionList);
        assert_eq!(classify(b'$', Some(b'4')), ValueStart::Binary);
        assert_eq!(classify(b'$', None), ValueStart::Binary);
        assert_eq!(classify(b'-', Some(b'(')), ValueStart::Signed { negative: true });
        assert_eq!(classify(b'7', None), ValueStart::Number);
    }

    #[test]
    fn document_collects_statements_in_order() {
        let root = parse("a: 1\nb = 2").unwrap();
        assert!(root.is_root());
        let rules: Vec<_> = root.children().iter().map(|n| n.rule()).collect();
        assert_eq!(rules, vec![Some(Rule::Member), Some(Rule::Member)]);
    }

    #[test]
    fn member_is_binary_key_and_value() {
        let root = parse("a.b.c: [1, 2]").unwrap();
        let member = &root.children()[0];
        assert_eq!(member.children().len(), 2);
        assert!(member.children()[0].is(Rule::MemberKey));
        assert!(member.children()[1].is(Rule::Array));
    }

    #[test]
    fn keyword_statements_back_off_to_members() {
        let root = parse("include: 1\ndelete = 2").unwrap();
        assert!(root.children().iter().all(|n| n.is(Rule::Member)));
    }
}
