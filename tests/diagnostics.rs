use jaxn_config::parse_str;
use rstest::rstest;

#[rstest]
#[case::first_line("a: nope", "expected value at 1:4\na: nope\n   ^")]
#[case::later_line("a: 1\nb: +\nc: 2", "incomplete number at 2:5\nb: +\n    ^")]
#[case::crlf_input("a: 1\r\nb: ?\r\n", "expected value at 2:4\nb: ?\n   ^")]
fn render_points_at_the_failure(#[case] input: &str, #[case] expected: &str) {
    let err = parse_str(input).unwrap_err();
    assert_eq!(err.render(input), expected);
}

#[test]
fn errors_without_a_position_render_as_plain_messages() {
    let err = jaxn_config::reduce(parse_str("include \"x.conf\"").unwrap()).unwrap_err();
    assert_eq!(err.render(""), err.to_string());
    assert!(!err.render("").contains('^'));
}
