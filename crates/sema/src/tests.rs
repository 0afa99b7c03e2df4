use indoc::indoc;
use syntax::parser::parse;

use super::*;

fn check(src: &str) -> Result<(), Vec<SemaError>> {
  let program = parse(src).unwrap();
  analyze(&program)
}

#[test]
fn params_and_locals_resolve() {
  assert!(check("def f(a, b):\n    c = a + b\n    return c\n").is_ok());
}

#[test]
fn use_before_assignment_is_an_error() {
  let errors = check("def f():\n    return x\n").unwrap_err();
  assert_eq!(errors.len(), 1);
  assert!(errors[0].message.contains("used before assignment"));
}

#[test]
fn aug_assign_to_unseen_name_is_an_error() {
  let errors = check("def f():\n    x += 1\n    return x\n").unwrap_err();
  assert!(errors.iter().any(|e| e.message.contains("used before assignment")));
}

#[test]
fn calling_an_earlier_defined_function_is_fine() {
  assert!(check(indoc! {"
    def g():
        return 1

    def f():
        return g()
  "}).is_ok());
}

#[test]
fn calling_a_later_defined_function_is_fine() {
  // `visit_program` pre-registers every top-level function name before
  // visiting any body, so forward references work regardless of source
  // order. The Python original has no such prepass and would reject this.
  assert!(check(indoc! {"
    def f():
        return g()

    def g():
        return 1
  "}).is_ok());
}

#[test]
fn calling_an_undefined_function_is_an_error() {
  let errors = check("def f():\n    return nope()\n").unwrap_err();
  assert!(errors.iter().any(|e| e.message.contains("is not defined")));
}

#[test]
fn builtin_calls_never_error() {
  assert!(check("def f():\n    return print(1)\n").is_ok());
}

#[test]
fn for_loop_target_is_visible_inside_the_body_only() {
  assert!(check("def f(xs):\n    for x in xs:\n        y = x\n    return 0\n").is_ok());
}

#[test]
fn if_branches_each_get_their_own_scope() {
  let errors = check(indoc! {"
    def f(c):
        if c:
            a = 1
        else:
            b = a
        return 0
  "}).unwrap_err();
  assert!(errors.iter().any(|e| e.message.contains("used before assignment")));
}

#[test]
fn assigning_an_already_visible_name_does_not_redefine_it() {
  assert!(check("def f(a):\n    a = a + 1\n    return a\n").is_ok());
}
