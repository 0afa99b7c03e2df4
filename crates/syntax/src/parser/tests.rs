use indoc::indoc;

use super::parse;

#[test]
fn parses_minimal_function() {
  let src = indoc! {"
    def f(x):
        return x
  "};
  let program = parse(src).unwrap();
  assert_eq!(program.body.len(), 1);
}

#[test]
fn parses_if_elif_else() {
  let src = indoc! {"
    def f(x):
        if x:
            return 1
        elif x:
            return 2
        else:
            return 3
  "};
  let program = parse(src).unwrap();
  assert_eq!(program.body.len(), 1);
}

#[test]
fn parses_for_and_while() {
  let src = indoc! {"
    def f(n):
        i = 0
        while i < n:
            i += 1
        for x in n:
            pass
        return i
  "};
  parse(src).unwrap();
}

#[test]
fn parses_bitwise_expression() {
  let src = "def f(a, b):\n    return (a & b) | (a ^ b) << 1\n";
  parse(src).unwrap();
}

#[test]
fn reports_multiple_errors_without_aborting() {
  let src = indoc! {"
    def f(:
        pass
    def g(:
        pass
  "};
  let errors = parse(src).unwrap_err();
  assert!(errors.len() >= 2);
}

#[test]
fn rejects_empty_block() {
  let src = "def f():\n";
  assert!(parse(src).is_err());
}

#[test]
fn call_expression_with_arguments() {
  let src = "def f():\n    return g(1, 2, 3)\n";
  parse(src).unwrap();
}
