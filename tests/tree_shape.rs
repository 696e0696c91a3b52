//! The retained tree: every node is either a content leaf or a structural
//! node, spans always slice the original input, and fragment concatenation
//! flattens into a single value node.

use jaxn_config::{parse_str, Node, Rule};

fn assert_well_formed(node: &Node, input: &str) {
    match node.rule() {
        None => assert!(node.content().is_none(), "root stores no content"),
        Some(rule) => {
            assert!(!node.span().is_empty(), "{rule:?} has an empty span");
            if rule.stores_content() {
                assert!(node.children().is_empty(), "{rule:?} leaf with children");
                assert_eq!(
                    node.content(),
                    Some(&input[node.span().start..node.span().end]),
                    "{rule:?} content must equal its source slice"
                );
            } else {
                assert!(node.content().is_none(), "{rule:?} stores content");
            }
        }
    }
    let mut previous_end = node.span().start;
    for child in node.children() {
        assert!(child.span().start >= previous_end, "children overlap");
        assert!(child.span().end <= node.span().end, "child escapes parent");
        previous_end = child.span().end;
        assert_well_formed(child, input);
    }
}

#[test]
fn kitchen_sink_tree_is_well_formed() {
    let input = r#"
# server settings
host: "localhost"
port: 8080
limits.cpu: 0.5
limits."max mem": 0x1000
flags: [true, false, null, -Infinity, NaN,]
nested: {a: 1 b: "x" + $(host), c: $42.43}
include "defaults.conf"
delete limits.cpu
banner: "hi " + $(env name: "USER", fallback: 'nobody') + "!"
"#;
    let root = parse_str(input).unwrap();
    assert!(root.is_root());
    assert_well_formed(&root, input);
}

#[test]
fn statement_kinds_in_source_order() {
    let root = parse_str("include \"f.conf\"\ndelete a\nk: 1").unwrap();
    let rules: Vec<_> = root.children().iter().map(Node::rule).collect();
    assert_eq!(
        rules,
        vec![
            Some(Rule::IncludeFile),
            Some(Rule::DeleteKeys),
            Some(Rule::Member)
        ]
    );
}

#[test]
fn include_holds_a_string_value() {
    let root = parse_str("include \"f.conf\"").unwrap();
    let include = &root.children()[0];
    assert_eq!(include.children().len(), 1);
    let string = &include.children()[0];
    assert!(string.is(Rule::String));
    assert_eq!(string.children().len(), 1);
    assert_eq!(string.children()[0].content(), Some("\"f.conf\""));
}

#[test]
fn member_key_keeps_quoted_segments_verbatim() {
    let root = parse_str("a.\"x.y\".c: 1").unwrap();
    let key = &root.children()[0].children()[0];
    assert!(key.is(Rule::MemberKey));
    let parts: Vec<_> = key
        .children()
        .iter()
        .map(|part| (part.rule().unwrap(), part.content().unwrap()))
        .collect();
    assert_eq!(
        parts,
        vec![
            (Rule::Identifier, "a"),
            (Rule::QuotedString, "\"x.y\""),
            (Rule::Identifier, "c")
        ]
    );
}

#[test]
fn string_concatenation_flattens_to_one_node() {
    let root = parse_str("s: \"a\" + $(k) + \"b\"").unwrap();
    let value = &root.children()[0].children()[1];
    assert!(value.is(Rule::String));
    let rules: Vec<_> = value.children().iter().map(|n| n.rule().unwrap()).collect();
    assert_eq!(
        rules,
        vec![Rule::StringFragment, Rule::Expression, Rule::StringFragment]
    );
    // the embedded expression wraps a key reference down to its segments
    let reference = &value.children()[1].children()[0];
    assert!(reference.is(Rule::RefKey));
    assert_eq!(reference.children()[0].content(), Some("k"));
}

#[test]
fn binary_concatenation_flattens_to_one_node() {
    let root = parse_str("b: $48 + $'a'").unwrap();
    let value = &root.children()[0].children()[1];
    assert!(value.is(Rule::Binary));
    let contents: Vec<_> = value.children().iter().map(Node::content).collect();
    assert_eq!(contents, vec![Some("$48"), Some("$'a'")]);
}

#[test]
fn array_elements_wrap_their_values() {
    let root = parse_str("a: [1, true, [2]]").unwrap();
    let array = &root.children()[0].children()[1];
    assert!(array.is(Rule::Array));
    assert_eq!(array.children().len(), 3);
    assert!(array.children().iter().all(|n| n.is(Rule::Element)));
    assert_eq!(array.children()[0].children()[0].content(), Some("1"));
    assert!(array.children()[1].children()[0].is(Rule::True));
    let inner = &array.children()[2].children()[0];
    assert!(inner.is(Rule::Array));
    assert_eq!(inner.children().len(), 1);
}

#[test]
fn array_concatenation_splices_fragments() {
    let root = parse_str("a: [1] + $(x) + [2, 3]").unwrap();
    let array = &root.children()[0].children()[1];
    let rules: Vec<_> = array.children().iter().map(|n| n.rule().unwrap()).collect();
    assert_eq!(
        rules,
        vec![Rule::Element, Rule::Expression, Rule::Element, Rule::Element]
    );
}

#[test]
fn object_members_allow_optional_separators() {
    let root = parse_str("o: {a: 1 b: 2, c: 3}").unwrap();
    let object = &root.children()[0].children()[1];
    assert!(object.is(Rule::Object));
    assert_eq!(object.children().len(), 3);
    assert!(object.children().iter().all(|n| n.is(Rule::Member)));
}

#[test]
fn object_concatenation_splices_fragments() {
    let root = parse_str("o: {a: 1} + $(x) + {b: 2}").unwrap();
    let object = &root.children()[0].children()[1];
    let rules: Vec<_> = object.children().iter().map(|n| n.rule().unwrap()).collect();
    assert_eq!(rules, vec![Rule::Member, Rule::Expression, Rule::Member]);
}

#[test]
fn function_calls_keep_name_and_parameters() {
    let root = parse_str("v: $(env name: \"PATH\", sep: ':')").unwrap();
    let expression = &root.children()[0].children()[1];
    assert!(expression.is(Rule::Expression));
    let function = &expression.children()[0];
    assert!(function.is(Rule::Function));
    assert_eq!(function.children()[0].content(), Some("env"));
    for param in &function.children()[1..] {
        assert!(param.is(Rule::FunctionParam));
        assert_eq!(param.children().len(), 2);
        assert!(param.children()[0].is(Rule::Identifier));
        assert!(param.children()[1].is(Rule::String));
    }
    assert_eq!(function.children().len(), 3);
}

#[test]
fn lone_expression_is_not_wrapped() {
    let root = parse_str("a: $(x)").unwrap();
    let value = &root.children()[0].children()[1];
    assert!(value.is(Rule::Expression));
}

#[test]
fn concatenated_expressions_become_a_list() {
    let root = parse_str("a: $(x) + \"s\" + $(y)").unwrap();
    let value = &root.children()[0].children()[1];
    assert!(value.is(Rule::ExpressionList));
    let rules: Vec<_> = value.children().iter().map(|n| n.rule().unwrap()).collect();
    assert_eq!(rules, vec![Rule::Expression, Rule::String, Rule::Expression]);
}

#[test]
fn member_span_excludes_trailing_whitespace() {
    let input = "a.b: [1, 2]   # done";
    let root = parse_str(input).unwrap();
    let member = &root.children()[0];
    let span = member.span();
    assert_eq!(&input[span.start..span.end], "a.b: [1, 2]");
}

#[test]
fn keyword_values_are_structural() {
    let input = "k: null";
    let root = parse_str(input).unwrap();
    let value = &root.children()[0].children()[1];
    assert!(value.is(Rule::Null));
    assert!(!value.has_content());
    assert!(value.children().is_empty());
    assert_eq!(&input[value.span().start..value.span().end], "null");
}
