use smol_str::SmolStr;

/// Byte range within the original input. Non-empty for every retained node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The grammar rules that produce retained tree nodes. Structural rules keep
/// children and no text; leaf rules keep their matched text and no children.
/// Rules absent here (whitespace, separators, keywords, the bracket/brace
/// wrappers inside fragment lists) never materialize a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    // structural
    IncludeFile,
    DeleteKeys,
    Member,
    MemberKey,
    RefKey,
    String,
    Binary,
    Array,
    Object,
    Element,
    Expression,
    ExpressionList,
    Function,
    FunctionParam,
    Null,
    True,
    False,
    Infinity,
    NegInfinity,
    NaN,
    // content leaves
    Identifier,
    QuotedString,
    StringFragment,
    BinaryLiteral,
    Number,
    NegNumber,
    HexNumber,
    NegHexNumber,
}

impl Rule {
    /// The retention policy: whether a node of this rule stores its matched
    /// source text.
    pub fn stores_content(self) -> bool {
        matches!(
            self,
            Rule::Identifier
                | Rule::QuotedString
                | Rule::StringFragment
                | Rule::BinaryLiteral
                | Rule::Number
                | Rule::NegNumber
                | Rule::HexNumber
                | Rule::NegHexNumber
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::IncludeFile => "include_file",
            Rule::DeleteKeys => "delete_keys",
            Rule::Member => "member",
            Rule::MemberKey => "member_key",
            Rule::RefKey => "ref_key",
            Rule::String => "string",
            Rule::Binary => "binary",
            Rule::Array => "array",
            Rule::Object => "object",
            Rule::Element => "element",
            Rule::Expression => "expression",
            Rule::ExpressionList => "expression_list",
            Rule::Function => "function",
            Rule::FunctionParam => "function_param",
            Rule::Null => "null",
            Rule::True => "true",
            Rule::False => "false",
            Rule::Infinity => "infinity",
            Rule::NegInfinity => "neg_infinity",
            Rule::NaN => "nan",
            Rule::Identifier => "identifier",
            Rule::QuotedString => "quoted_string",
            Rule::StringFragment => "string_fragment",
            Rule::BinaryLiteral => "binary_value",
            Rule::Number => "number",
            Rule::NegNumber => "neg_number",
            Rule::HexNumber => "hex_number",
            Rule::NegHexNumber => "neg_hex_number",
        }
    }
}

/// One retained parse-tree node. The synthetic root has no rule; every other
/// node is either a content leaf or a structural node, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    rule: Option<Rule>,
    span: Span,
    content: Option<SmolStr>,
    children: Vec<Node>,
}

impl Node {
    pub(crate) fn root(span: Span, children: Vec<Node>) -> Self {
        Self {
            rule: None,
            span,
            content: None,
            children,
        }
    }

    pub(crate) fn structural(rule: Rule, span: Span, children: Vec<Node>) -> Self {
        debug_assert!(!rule.stores_content());
        Self {
            rule: Some(rule),
            span,
            content: None,
            children,
        }
    }

    pub(crate) fn leaf(rule: Rule, span: Span, content: &str) -> Self {
        debug_assert!(rule.stores_content());
        Self {
            rule: Some(rule),
            span,
            content: Some(SmolStr::new(content)),
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.rule.is_none()
    }

    pub fn rule(&self) -> Option<Rule> {
        self.rule
    }

    pub fn is(&self, rule: Rule) -> bool {
        self.rule == Some(rule)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Transfers ownership of the children, draining this node.
    pub fn into_children(self) -> Vec<Node> {
        self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_policy_is_unambiguous() {
        let leaf = Node::leaf(Rule::Identifier, Span { start: 0, end: 2 }, "ab");
        assert!(leaf.has_content());
        assert!(leaf.children().is_empty());

        let node = Node::structural(Rule::Member, Span { start: 0, end: 4 }, vec![leaf]);
        assert!(!node.has_content());
        assert_eq!(node.children().len(), 1);
        assert!(node.is(Rule::Member));
        assert!(!node.is_root());
    }

    #[test]
    fn root_has_no_rule() {
        let root = Node::root(Span { start: 0, end: 0 }, Vec::new());
        assert!(root.is_root());
        assert_eq!(root.rule(), None);
    }
}
