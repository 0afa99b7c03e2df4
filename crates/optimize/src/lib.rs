//! Fixed-point IR optimization, ported pass-for-pass from
//! `original_source/pytox86/optim.py`'s `Optimizer`. The Python original's
//! fifth "pass" — `is_constant_value`, which re-derives a literal by parsing
//! strings — has no counterpart here: [`ir::IrValue`] already distinguishes
//! `Const` from `Reg`/`Var`/`Label`, so constant recognition is a single
//! `matches!` instead of a parse-int-then-parse-float-then-string-compare
//! ladder (Design Notes §9.3/§9.5).

use std::collections::HashMap;

use ir::{BasicBlock, BinOp, CmpOp, IrFunction, IrInstruction, IrOp, IrProgram, IrValue, Literal, UnOp};

/// Runs the optimizer's five passes to a fixed point, the same loop
/// `Optimizer.optimize` runs, gated by `level` the same way: `0` is a no-op,
/// `N` runs only the first `N` passes in the fixed list below.
pub struct Optimizer {
  level: usize,
}

type Pass = fn(&mut IrProgram) -> bool;

const PASSES: [Pass; 5] = [
  eliminate_dead_code,
  constant_folding,
  constant_propagation,
  eliminate_unreachable_code,
  merge_blocks,
];

impl Optimizer {
  pub fn new(level: usize) -> Self {
    Self { level }
  }

  pub fn optimize(&self, program: &mut IrProgram) {
    if self.level == 0 {
      return;
    }
    let active = &PASSES[..self.level.min(PASSES.len())];
    let mut changed = true;
    while changed {
      changed = false;
      for pass in active {
        if pass(program) {
          changed = true;
        }
      }
    }
  }
}

fn is_register_name(v: &IrValue) -> Option<&str> {
  match v {
    IrValue::Reg(name) => Some(name.as_str()),
    _ => None,
  }
}

/// Unlike `eliminate_dead_code` in the Python original, `store`'s source
/// operand counts as a use. The original never scanned `store` args when
/// building `used_vars`, which meant a value produced solely to be stored
/// into a variable looked dead and could be stripped out from under the
/// `store` that still referenced it — a correctness bug, not an
/// optimization. This rework counts it.
fn eliminate_dead_code(program: &mut IrProgram) -> bool {
  let mut changed = false;

  for function in &mut program.functions {
    let mut used: std::collections::HashSet<String> = std::collections::HashSet::new();

    for block in &function.blocks {
      for instr in &block.instructions {
        match &instr.op {
          IrOp::Load | IrOp::BinOp(_) | IrOp::UnOp(_) | IrOp::Compare(_) | IrOp::Call | IrOp::GetItem | IrOp::Store => {
            for arg in &instr.args {
              if let Some(name) = is_register_name(arg) {
                used.insert(name.to_string());
              }
            }
          }
          IrOp::Ret => {
            for arg in &instr.args {
              if let Some(name) = is_register_name(arg) {
                used.insert(name.to_string());
              }
            }
          }
          IrOp::Branch => {
            if let Some(cond) = instr.args.first() {
              if let Some(name) = is_register_name(cond) {
                used.insert(name.to_string());
              }
            }
          }
          IrOp::Const | IrOp::Jump | IrOp::Len => {}
        }
      }
    }

    for block in &mut function.blocks {
      let before = block.instructions.len();
      block.instructions.retain(|instr| {
        let Some(result) = &instr.result else {
          return true;
        };
        if !result.starts_with('%') || used.contains(result) {
          return true;
        }
        matches!(&instr.op, IrOp::Store | IrOp::Jump | IrOp::Branch | IrOp::Ret)
      });
      if block.instructions.len() != before {
        changed = true;
      }
    }
  }

  changed
}

fn literal_of(v: &IrValue) -> Option<&Literal> {
  match v {
    IrValue::Const(lit) => Some(lit),
    _ => None,
  }
}

fn fold_binop(op: BinOp, left: &Literal, right: &Literal) -> Option<Literal> {
  use Literal::*;
  match (left, right) {
    (Int(a), Int(b)) => {
      let a = *a;
      let b = *b;
      match op {
        BinOp::Add => Some(Int(a.wrapping_add(b))),
        BinOp::Sub => Some(Int(a.wrapping_sub(b))),
        BinOp::Mul => Some(Int(a.wrapping_mul(b))),
        // Truncating division, matching the `idiv` lowering this value will
        // eventually hit in codegen — a deliberate split from the Python
        // original's true (float) division. See Design Notes §9.4.
        BinOp::Div if b != 0 => Some(Int(a.wrapping_div(b))),
        BinOp::Mod if b != 0 => Some(Int(a.wrapping_rem(b))),
        BinOp::BitAnd => Some(Int(a & b)),
        BinOp::BitOr => Some(Int(a | b)),
        BinOp::BitXor => Some(Int(a ^ b)),
        BinOp::Shl => Some(Int(a.wrapping_shl(b as u32))),
        BinOp::Shr => Some(Int(a.wrapping_shr(b as u32))),
        _ => None,
      }
    }
    (Float(a), Float(b)) => {
      let (a, b) = (*a, *b);
      match op {
        BinOp::Add => Some(Float(a + b)),
        BinOp::Sub => Some(Float(a - b)),
        BinOp::Mul => Some(Float(a * b)),
        BinOp::Div if b != 0.0 => Some(Float(a / b)),
        _ => None,
      }
    }
    _ => None,
  }
}

fn fold_unop(op: UnOp, operand: &Literal) -> Option<Literal> {
  match (op, operand) {
    (UnOp::Pos, Literal::Int(v)) => Some(Literal::Int(*v)),
    (UnOp::Pos, Literal::Float(v)) => Some(Literal::Float(*v)),
    (UnOp::Neg, Literal::Int(v)) => Some(Literal::Int(v.wrapping_neg())),
    (UnOp::Neg, Literal::Float(v)) => Some(Literal::Float(-v)),
    (UnOp::BitNot, Literal::Int(v)) => Some(Literal::Int(!v)),
    _ => None,
  }
}

fn fold_compare(op: CmpOp, left: &Literal, right: &Literal) -> Option<Literal> {
  use Literal::*;
  let ordering = match (left, right) {
    (Int(a), Int(b)) => a.partial_cmp(b),
    (Float(a), Float(b)) => a.partial_cmp(b),
    (Bool(a), Bool(b)) => a.partial_cmp(b),
    _ => return None,
  }?;
  let result = match op {
    CmpOp::Eq => ordering.is_eq(),
    CmpOp::NotEq => !ordering.is_eq(),
    CmpOp::Less => ordering.is_lt(),
    CmpOp::Greater => ordering.is_gt(),
    CmpOp::LessEq => ordering.is_le(),
    CmpOp::GreaterEq => ordering.is_ge(),
  };
  Some(Bool(result))
}

fn constant_folding(program: &mut IrProgram) -> bool {
  let mut changed = false;

  for function in &mut program.functions {
    for block in &mut function.blocks {
      for instr in &mut block.instructions {
        let folded = match (&instr.op, instr.args.as_slice()) {
          (IrOp::BinOp(op), [left, right]) => literal_of(left)
            .zip(literal_of(right))
            .and_then(|(l, r)| fold_binop(*op, l, r)),
          (IrOp::UnOp(op), [operand]) => literal_of(operand).and_then(|v| fold_unop(*op, v)),
          (IrOp::Compare(op), [left, right]) => literal_of(left)
            .zip(literal_of(right))
            .and_then(|(l, r)| fold_compare(*op, l, r)),
          _ => None,
        };
        if let Some(lit) = folded {
          instr.op = IrOp::Const;
          instr.args = vec![IrValue::Const(lit)];
          changed = true;
        }
      }
    }
  }

  changed
}

fn constant_propagation(program: &mut IrProgram) -> bool {
  let mut changed = false;

  for function in &mut program.functions {
    for block in &mut function.blocks {
      let mut constants: HashMap<String, Literal> = HashMap::new();

      for instr in &mut block.instructions {
        if instr.op == IrOp::Const {
          if let (Some(result), Some(IrValue::Const(lit))) = (&instr.result, instr.args.first()) {
            constants.insert(result.clone(), lit.clone());
          }
        }

        let propagates = matches!(
          &instr.op,
          IrOp::BinOp(_) | IrOp::UnOp(_) | IrOp::Compare(_) | IrOp::Load | IrOp::GetItem | IrOp::Store | IrOp::Branch | IrOp::Ret
        );
        if !propagates {
          continue;
        }

        for arg in &mut instr.args {
          if let Some(name) = is_register_name(arg) {
            if let Some(lit) = constants.get(name) {
              *arg = IrValue::Const(lit.clone());
              changed = true;
            }
          }
        }
      }
    }
  }

  changed
}

fn eliminate_unreachable_code(program: &mut IrProgram) -> bool {
  let mut changed = false;

  for function in &mut program.functions {
    let mut reachable = vec![false; function.blocks.len()];
    let mut worklist = vec![function.entry_block];

    while let Some(idx) = worklist.pop() {
      if reachable[idx] {
        continue;
      }
      reachable[idx] = true;

      let block = &function.blocks[idx];
      let mut successors = Vec::new();
      if let Some(last) = block.instructions.last() {
        match &last.op {
          IrOp::Jump => {
            if let Some(IrValue::Label(target)) = last.args.first() {
              if let Some(i) = function.find_label(target) {
                successors.push(i);
              }
            }
          }
          IrOp::Branch => {
            if let (Some(IrValue::Label(t)), Some(IrValue::Label(f))) = (last.args.get(1), last.args.get(2)) {
              if let Some(i) = function.find_label(t) {
                successors.push(i);
              }
              if let Some(i) = function.find_label(f) {
                successors.push(i);
              }
            }
          }
          _ => {}
        }
      }
      if let Some(n) = block.next_block {
        successors.push(n);
      }
      if let Some(b) = block.branch_target {
        successors.push(b);
      }

      for s in successors {
        if !reachable[s] {
          worklist.push(s);
        }
      }
    }

    if reachable.iter().any(|r| !r) {
      changed = true;
      retain_blocks(function, &reachable);
    }
  }

  changed
}

/// Drops unreachable blocks and remaps every index-based cross-reference
/// (`entry_block`, `next_block`, `branch_target`) to match the compacted
/// `blocks` vector — the bookkeeping this rework's arena representation
/// needs in place of the original's drop-from-a-list-of-objects approach.
fn retain_blocks(function: &mut IrFunction, reachable: &[bool]) {
  let mut remap = vec![None; function.blocks.len()];
  let mut next_idx = 0;
  for (old, keep) in reachable.iter().enumerate() {
    if *keep {
      remap[old] = Some(next_idx);
      next_idx += 1;
    }
  }

  let old_blocks = std::mem::take(&mut function.blocks);
  function.blocks = old_blocks
    .into_iter()
    .enumerate()
    .filter(|(i, _)| reachable[*i])
    .map(|(_, mut b)| {
      b.next_block = b.next_block.and_then(|n| remap[n]);
      b.branch_target = b.branch_target.and_then(|n| remap[n]);
      b
    })
    .collect();

  function.entry_block = remap[function.entry_block].expect("entry block is always reachable");
}

fn predecessor_count(function: &IrFunction, target: usize) -> usize {
  function
    .blocks
    .iter()
    .filter(|b| b.next_block == Some(target) || b.branch_target == Some(target))
    .count()
}

fn merge_blocks(program: &mut IrProgram) -> bool {
  let mut changed = false;

  for function in &mut program.functions {
    let mut i = 0;
    while i < function.blocks.len() {
      let Some(target_label) = ends_in_single_jump(&function.blocks[i]) else {
        i += 1;
        continue;
      };
      let Some(target_idx) = function.find_label(&target_label) else {
        i += 1;
        continue;
      };
      if target_idx == i || predecessor_count(function, target_idx) != 1 {
        i += 1;
        continue;
      }

      function.blocks[i].instructions.pop();
      let target_instructions = function.blocks[target_idx].instructions.clone();
      function.blocks[i].instructions.extend(target_instructions);
      let target_next = function.blocks[target_idx].next_block;
      let target_branch = function.blocks[target_idx].branch_target;
      function.blocks[i].next_block = target_next;
      function.blocks[i].branch_target = target_branch;

      for block in &mut function.blocks {
        if block.next_block == Some(target_idx) {
          block.next_block = Some(i);
        }
        if block.branch_target == Some(target_idx) {
          block.branch_target = Some(i);
        }
      }

      remove_block(function, target_idx);
      if target_idx < i {
        i -= 1;
      }
      changed = true;
      // Don't advance `i`: the merged block may itself end in a jump to
      // another uniquely-targeted block.
    }
  }

  changed
}

fn ends_in_single_jump(block: &BasicBlock) -> Option<String> {
  match block.instructions.last() {
    Some(IrInstruction {
      op: IrOp::Jump,
      args,
      ..
    }) if args.len() == 1 => match &args[0] {
      IrValue::Label(l) => Some(l.clone()),
      _ => None,
    },
    _ => None,
  }
}

fn remove_block(function: &mut IrFunction, idx: usize) {
  function.blocks.remove(idx);
  let remap = |n: usize| -> usize {
    match n.cmp(&idx) {
      std::cmp::Ordering::Less => n,
      _ => n - 1,
    }
  };
  for block in &mut function.blocks {
    block.next_block = block.next_block.map(remap);
    block.branch_target = block.branch_target.map(remap);
  }
  function.entry_block = remap(function.entry_block);
}

#[cfg(test)]
mod tests;
