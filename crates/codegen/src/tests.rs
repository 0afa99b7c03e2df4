use indoc::indoc;
use ir::gen::generate;
use ir::{BasicBlock, IrFunction, IrInstruction, IrOp, IrProgram, IrValue, Literal};
use syntax::parser::parse;

use super::generate as codegen;

fn compile(src: &str) -> String {
  let program = parse(src).unwrap();
  let ir = generate(&program).unwrap();
  codegen(&ir)
}

#[test]
fn header_declares_intel_syntax_and_global_main() {
  let asm = compile("def f():\n    return 1\n");
  assert!(asm.contains(".intel_syntax noprefix"));
  assert!(asm.contains(".global main"));
  assert!(asm.contains(".text"));
}

#[test]
fn prologue_and_epilogue_bracket_the_function_body() {
  let asm = compile("def f():\n    return 1\n");
  assert!(asm.contains("push rbp"));
  assert!(asm.contains("mov rbp, rsp"));
  assert!(asm.contains("leave"));
  assert!(asm.contains("ret"));
}

#[test]
fn constant_return_loads_the_immediate_into_rax() {
  let asm = compile("def f():\n    return 3\n");
  assert!(asm.contains("mov rax, 3"));
}

#[test]
fn params_come_from_argument_registers() {
  let asm = compile("def f(a, b, c):\n    return a\n");
  // First three params are materialized from rdi, rsi, rdx per System V.
  assert!(asm.contains("rdi"));
  assert!(asm.contains("rsi"));
  assert!(asm.contains("rdx"));
}

#[test]
fn seventh_param_is_read_from_the_stack() {
  let asm = compile("def seven(a, b, c, d, e, f, g):\n    return g\n");
  // arg index 6 (the 7th param) is read from [rbp+16] per the (i-6+2)*8 rule.
  assert!(asm.contains("QWORD PTR [rbp+16]"));
}

#[test]
fn call_with_seven_arguments_pushes_the_seventh_and_pads_for_alignment() {
  let asm = compile(indoc! {"
    def g(a, b, c, d, e, f, h):
        return a
    def f():
        return g(1, 2, 3, 4, 5, 6, 7)
  "});
  assert!(asm.contains("push rax"));
  assert!(asm.contains("sub rsp, 8"));
  assert!(asm.contains("call g"));
  assert!(asm.contains("add rsp, 16"));
}

#[test]
fn call_with_one_register_argument_does_not_pad_the_stack() {
  // All args fit in registers (nothing pushed), so the odd *total* argument
  // count must not be mistaken for an odd *pushed* count: no `sub rsp, 8`
  // should be emitted around the call, and there must be nothing left to
  // clean up afterwards. Regression test for the one-arg recursive call in
  // `demos/factorial.py`.
  let asm = compile(indoc! {"
    def factorial(n):
        if n < 1:
            return 1
        return n * factorial(n - 1)
  "});
  assert!(asm.contains("call factorial"));
  assert!(!asm.contains("sub rsp, 8"));
  assert!(!asm.contains("add rsp"));
}

#[test]
fn call_with_five_register_arguments_does_not_pad_the_stack() {
  let asm = compile(indoc! {"
    def g(a, b, c, d, e):
        return a
    def f():
        return g(1, 2, 3, 4, 5)
  "});
  assert!(asm.contains("call g"));
  assert!(!asm.contains("sub rsp, 8"));
  assert!(!asm.contains("add rsp"));
}

#[test]
fn call_with_eight_arguments_pads_only_the_pushed_pair() {
  // 8 total args: 6 in registers, 2 pushed (an even pushed-count), so no
  // alignment padding is needed even though the total argument count (8) is
  // even too — this pins the pushed-count computation, not just parity of
  // the total.
  let asm = compile(indoc! {"
    def g(a, b, c, d, e, f, h, i):
        return a
    def f():
        return g(1, 2, 3, 4, 5, 6, 7, 8)
  "});
  assert!(asm.contains("call g"));
  assert!(!asm.contains("sub rsp, 8"));
  assert!(asm.contains("add rsp, 16"));
}

#[test]
fn division_emits_cqo_and_idiv() {
  let asm = compile("def f(a, b):\n    return a / b\n");
  assert!(asm.contains("cqo"));
  assert!(asm.contains("idiv rcx"));
}

#[test]
fn modulo_reads_the_remainder_out_of_rdx() {
  let asm = compile("def f(a, b):\n    return a % b\n");
  assert!(asm.contains("idiv rcx"));
  assert!(asm.contains("mov rax, rdx"));
}

#[test]
fn comparison_sets_and_zero_extends_the_flag() {
  let asm = compile("def f(a, b):\n    return a < b\n");
  assert!(asm.contains("cmp rax, rcx"));
  assert!(asm.contains("setl al"));
  assert!(asm.contains("movzx rax, al"));
}

#[test]
fn len_and_getitem_call_the_runtime_helpers() {
  let asm = compile(indoc! {"
    def f(xs):
        for x in xs:
            pass
        return 0
  "});
  assert!(asm.contains("call _py_len"));
  assert!(asm.contains("call _py_getitem"));
}

#[test]
fn string_literal_is_interned_once_in_rodata() {
  let asm = compile(indoc! {r#"
    def f():
        print("hi")
        print("hi")
        return 0
  "#});
  assert_eq!(asm.matches(".string \"hi\"").count(), 1);
  assert!(asm.contains(".section .rodata"));
}

#[test]
fn rodata_section_is_absent_without_literals() {
  let asm = compile("def f():\n    return 1 + 2\n");
  assert!(!asm.contains(".rodata"));
}

#[test]
fn string_escaping_round_trips_through_rodata() {
  let asm = compile("def f():\n    return print(\"a\\nb\\tc\\\"d\")\n");
  assert!(asm.contains(".string \"a\\nb\\tc\\\"d\""));
}

#[test]
fn stack_slots_cover_exactly_locals_and_instruction_results() {
  let program = parse("def f(a):\n    x = a + 1\n    return x\n").unwrap();
  let prog = generate(&program).unwrap();
  let func = &prog.functions[0];

  let mut expected: std::collections::HashSet<String> = func.local_vars.iter().cloned().collect();
  for block in &func.blocks {
    for instr in &block.instructions {
      if let Some(result) = &instr.result {
        if result.starts_with('%') {
          expected.insert(result.clone());
        }
      }
    }
  }

  // The assembly must contain exactly one stack store/load site per expected
  // slot; we can't observe the private slot map directly from outside the
  // crate, so instead assert the emitted text mentions the frame is large
  // enough: each slot is 8 bytes, rounded up to 16.
  let asm = codegen(&prog);
  let expected_bytes = (expected.len() as i64 * 8 + 15) / 16 * 16;
  if expected_bytes > 0 {
    assert!(asm.contains(&format!("sub rsp, {expected_bytes}")));
  }
}

#[test]
fn unreferenced_global_vars_do_not_affect_function_frames() {
  // global_vars is part of IrProgram's shape but nothing in this language's
  // grammar ever populates it (spec.md §3); codegen should still compile a
  // program whose IR has an explicit (empty in practice) global list.
  let mut prog = IrProgram::default();
  prog.functions.push(IrFunction {
    name: "f".into(),
    params: vec![],
    entry_block: 0,
    blocks: vec![BasicBlock {
      label: "f_entry".into(),
      instructions: vec![IrInstruction::new(
        IrOp::Const,
        vec![IrValue::Const(Literal::Int(1))],
        Some("%t0".into()),
      ), IrInstruction::new(IrOp::Ret, vec![IrValue::reg("%t0")], None)],
      next_block: None,
      branch_target: None,
    }],
    local_vars: vec![],
  });
  let asm = codegen(&prog);
  assert!(asm.contains("f:"));
}

#[test]
fn bitwise_and_shift_binops_lower_to_the_matching_instruction() {
  let asm = compile("def f(a, b):\n    return (a & b) | (a ^ b) << 1\n");
  assert!(asm.contains("and rax, rcx"));
  assert!(asm.contains("or rax, rcx"));
  assert!(asm.contains("xor rax, rcx"));
  assert!(asm.contains("shl rax, cl"));
}

#[test]
fn unary_neg_and_bitnot_lower_correctly() {
  let asm = compile("def f(a):\n    return -a\n");
  assert!(asm.contains("neg rax"));
  let asm2 = compile("def f(a):\n    return ~a\n");
  assert!(asm2.contains("not rax"));
}
