use indoc::indoc;
use syntax::parser::parse;

use super::*;

fn lower(src: &str) -> IrProgram {
  let program = parse(src).unwrap();
  generate(&program).unwrap()
}

#[test]
fn return_literal_sum_emits_binop_then_ret() {
  let prog = lower("def f():\n    return 1 + 2\n");
  let func = &prog.functions[0];
  let entry = &func.blocks[func.entry_block];
  let ops: Vec<_> = entry.instructions.iter().map(|i| &i.op).collect();
  assert!(ops.iter().any(|op| matches!(op, IrOp::BinOp(BinOp::Add))));
  assert!(matches!(entry.instructions.last().unwrap().op, IrOp::Ret));
}

#[test]
fn small_int_literal_gets_specialized_temp_name() {
  let prog = lower("def f():\n    return 5\n");
  let func = &prog.functions[0];
  let entry = &func.blocks[func.entry_block];
  let const_instr = entry
    .instructions
    .iter()
    .find(|i| matches!(i.op, IrOp::Const))
    .unwrap();
  assert_eq!(const_instr.result.as_deref(), Some("%t5"));
}

#[test]
fn large_int_literal_uses_monotonic_temp() {
  let prog = lower("def f():\n    return 500\n");
  let func = &prog.functions[0];
  let entry = &func.blocks[func.entry_block];
  let const_instr = entry
    .instructions
    .iter()
    .find(|i| matches!(i.op, IrOp::Const))
    .unwrap();
  assert_eq!(const_instr.result.as_deref(), Some("%t0"));
}

#[test]
fn missing_terminator_gets_empty_ret_appended() {
  let prog = lower("def f():\n    pass\n");
  let func = &prog.functions[0];
  let entry = &func.blocks[func.entry_block];
  let last = entry.instructions.last().unwrap();
  assert!(matches!(last.op, IrOp::Ret));
  assert!(last.args.is_empty());
}

#[test]
fn if_else_produces_then_else_merge_blocks() {
  let prog = lower(indoc! {"
    def f(x):
        if x < 0:
            return 0
        else:
            return x
  "});
  let func = &prog.functions[0];
  // entry + then + else + merge
  assert_eq!(func.blocks.len(), 4);
  let labels: Vec<&str> = func.blocks.iter().map(|b| b.label.as_str()).collect();
  assert!(labels.iter().any(|l| l.starts_with("if_then")));
  assert!(labels.iter().any(|l| l.starts_with("if_else")));
  assert!(labels.iter().any(|l| l.starts_with("if_merge")));
}

#[test]
fn while_loop_produces_cond_body_exit_blocks() {
  let prog = lower(indoc! {"
    def f(n):
        while n:
            n = n - 1
        return n
  "});
  let func = &prog.functions[0];
  let labels: Vec<&str> = func.blocks.iter().map(|b| b.label.as_str()).collect();
  assert!(labels.iter().any(|l| l.starts_with("while_cond")));
  assert!(labels.iter().any(|l| l.starts_with("while_body")));
  assert!(labels.iter().any(|l| l.starts_with("while_exit")));
}

#[test]
fn for_loop_lowers_len_getitem_and_index_increment() {
  let prog = lower("def f(xs):\n    for x in xs:\n        pass\n    return 0\n");
  let func = &prog.functions[0];
  let has_len = func
    .blocks
    .iter()
    .any(|b| b.instructions.iter().any(|i| matches!(i.op, IrOp::Len)));
  let has_getitem = func
    .blocks
    .iter()
    .any(|b| b.instructions.iter().any(|i| matches!(i.op, IrOp::GetItem)));
  assert!(has_len);
  assert!(has_getitem);
}

#[test]
fn aug_assign_lowers_to_load_binop_store() {
  let prog = lower("def f():\n    x = 1\n    x += 2\n    return x\n");
  let func = &prog.functions[0];
  let entry = &func.blocks[func.entry_block];
  let stores = entry
    .instructions
    .iter()
    .filter(|i| matches!(i.op, IrOp::Store))
    .count();
  assert_eq!(stores, 2);
  assert!(entry.instructions.iter().any(|i| matches!(i.op, IrOp::BinOp(BinOp::Add))));
}

#[test]
fn assign_to_non_name_target_is_a_lowering_error() {
  // `f(x) = 1` parses (target is a Call expression) but must fail lowering.
  let program = parse("def f(x):\n    f(x) = 1\n    return 1\n").unwrap();
  assert!(generate(&program).is_err());
}

#[test]
fn multi_comparator_chain_is_a_lowering_error() {
  let program = parse("def f(a, b, c):\n    return a < b < c\n").unwrap();
  assert!(generate(&program).is_err());
}

#[test]
fn call_to_non_name_target_is_a_lowering_error() {
  let program = parse("def f():\n    return (1)(2)\n").unwrap();
  assert!(generate(&program).is_err());
}

#[test]
fn statements_outside_a_function_produce_no_ir() {
  let program = parse("x = 1\n").unwrap();
  let prog = generate(&program).unwrap();
  assert!(prog.functions.is_empty());
}
