use ir::{BasicBlock, BinOp, CmpOp, IrFunction, IrInstruction, IrOp, IrProgram, IrValue, Literal};

use super::*;

fn one_block_function(instructions: Vec<IrInstruction>) -> IrProgram {
  IrProgram {
    functions: vec![IrFunction {
      name: "f".into(),
      params: vec![],
      entry_block: 0,
      blocks: vec![BasicBlock {
        label: "f_entry".into(),
        instructions,
        next_block: None,
        branch_target: None,
      }],
      local_vars: vec![],
    }],
    global_vars: vec![],
  }
}

#[test]
fn folds_constant_binop_down_to_a_literal_return() {
  let mut prog = one_block_function(vec![
    IrInstruction::new(IrOp::Const, vec![IrValue::int(1)], Some("%t1".into())),
    IrInstruction::new(IrOp::Const, vec![IrValue::int(2)], Some("%t2".into())),
    IrInstruction::new(
      IrOp::BinOp(BinOp::Add),
      vec![IrValue::reg("%t1"), IrValue::reg("%t2")],
      Some("%t3".into()),
    ),
    IrInstruction::new(IrOp::Ret, vec![IrValue::reg("%t3")], None),
  ]);

  Optimizer::new(5).optimize(&mut prog);

  // At a fixed point, constant propagation has inlined the folded sum
  // straight into `ret`'s argument and dead-code elimination has dropped
  // every producer instruction nothing references anymore.
  let instrs = &prog.functions[0].blocks[0].instructions;
  assert_eq!(instrs.len(), 1);
  assert_eq!(instrs[0].op, IrOp::Ret);
  assert_eq!(instrs[0].args, vec![IrValue::Const(Literal::Int(3))]);
}

#[test]
fn division_by_zero_is_not_folded() {
  let mut prog = one_block_function(vec![
    IrInstruction::new(IrOp::Const, vec![IrValue::int(5)], Some("%t1".into())),
    IrInstruction::new(IrOp::Const, vec![IrValue::int(0)], Some("%t2".into())),
    IrInstruction::new(
      IrOp::BinOp(BinOp::Div),
      vec![IrValue::reg("%t1"), IrValue::reg("%t2")],
      Some("%t3".into()),
    ),
    IrInstruction::new(IrOp::Ret, vec![IrValue::reg("%t3")], None),
  ]);

  Optimizer::new(5).optimize(&mut prog);

  let instrs = &prog.functions[0].blocks[0].instructions;
  assert!(instrs.iter().any(|i| matches!(i.op, IrOp::BinOp(BinOp::Div))));
}

#[test]
fn dead_unused_temp_is_removed_but_store_source_is_kept_alive() {
  let mut prog = one_block_function(vec![
    IrInstruction::new(IrOp::Const, vec![IrValue::int(7)], Some("%t1".into())),
    IrInstruction::new(IrOp::Store, vec![IrValue::reg("%t1"), IrValue::var("x")], None),
    IrInstruction::new(IrOp::Ret, vec![], None),
  ]);

  Optimizer::new(1).optimize(&mut prog);

  let instrs = &prog.functions[0].blocks[0].instructions;
  // The producer of %t1 must survive: only `store` reads it, and `store`'s
  // source operand counts as a use.
  assert!(instrs.iter().any(|i| i.result.as_deref() == Some("%t1")));
}

#[test]
fn unreachable_block_is_dropped() {
  let mut prog = IrProgram {
    functions: vec![IrFunction {
      name: "f".into(),
      params: vec![],
      entry_block: 0,
      blocks: vec![
        BasicBlock {
          label: "entry".into(),
          instructions: vec![IrInstruction::new(IrOp::Ret, vec![], None)],
          next_block: None,
          branch_target: None,
        },
        BasicBlock {
          label: "dead".into(),
          instructions: vec![IrInstruction::new(IrOp::Ret, vec![], None)],
          next_block: None,
          branch_target: None,
        },
      ],
      local_vars: vec![],
    }],
    global_vars: vec![],
  };

  Optimizer::new(4).optimize(&mut prog);

  assert_eq!(prog.functions[0].blocks.len(), 1);
  assert_eq!(prog.functions[0].blocks[0].label, "entry");
}

#[test]
fn blocks_joined_by_a_sole_jump_are_merged() {
  let mut prog = IrProgram {
    functions: vec![IrFunction {
      name: "f".into(),
      params: vec![],
      entry_block: 0,
      blocks: vec![
        BasicBlock {
          label: "entry".into(),
          instructions: vec![IrInstruction::new(IrOp::Jump, vec![IrValue::label("next")], None)],
          next_block: Some(1),
          branch_target: None,
        },
        BasicBlock {
          label: "next".into(),
          instructions: vec![IrInstruction::new(IrOp::Ret, vec![], None)],
          next_block: None,
          branch_target: None,
        },
      ],
      local_vars: vec![],
    }],
    global_vars: vec![],
  };

  Optimizer::new(5).optimize(&mut prog);

  assert_eq!(prog.functions[0].blocks.len(), 1);
  assert!(matches!(
    prog.functions[0].blocks[0].instructions.last().unwrap().op,
    IrOp::Ret
  ));
}

#[test]
fn level_zero_is_a_no_op() {
  let mut prog = one_block_function(vec![
    IrInstruction::new(IrOp::Const, vec![IrValue::int(1)], Some("%t1".into())),
    IrInstruction::new(IrOp::Ret, vec![], None),
  ]);
  let before = prog.clone();
  Optimizer::new(0).optimize(&mut prog);
  assert_eq!(prog, before);
}

#[test]
fn compare_of_constants_folds_to_bool() {
  let mut prog = one_block_function(vec![
    IrInstruction::new(IrOp::Const, vec![IrValue::int(1)], Some("%t1".into())),
    IrInstruction::new(IrOp::Const, vec![IrValue::int(2)], Some("%t2".into())),
    IrInstruction::new(
      IrOp::Compare(CmpOp::Less),
      vec![IrValue::reg("%t1"), IrValue::reg("%t2")],
      Some("%t3".into()),
    ),
    IrInstruction::new(IrOp::Ret, vec![IrValue::reg("%t3")], None),
  ]);

  Optimizer::new(5).optimize(&mut prog);

  let instrs = &prog.functions[0].blocks[0].instructions;
  assert_eq!(instrs.len(), 1);
  assert_eq!(instrs[0].op, IrOp::Ret);
  assert_eq!(instrs[0].args, vec![IrValue::Const(Literal::Bool(true))]);
}
