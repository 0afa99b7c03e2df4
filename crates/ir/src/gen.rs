//! Lowers a [`syntax::ast::Program`] into an [`IrProgram`], mirroring the
//! visitor-per-node-type shape of `original_source/pytox86/irgen.py` but as
//! an exhaustive `match` over the closed `StmtKind`/`ExprKind` unions
//! instead of `getattr(self, "visit_" + name)` (Design Notes §9.1).

use span::Span;
use syntax::ast::{self, ExprKind, StmtKind};

use crate::{
  BasicBlock, BinOp, CmpOp, IrFunction, IrInstruction, IrOp, IrProgram, IrValue, Literal,
  LoweringError, UnOp,
};

/// Integer literals in `0..=100` get the codegen-visible temp name `%t<v>`
/// instead of a monotonic counter value — the specialized-temp contract
/// spec.md §4.4 calls out and the code generator's `load_value` relies on
/// exactly. See Design Notes §9.5.
const SPECIALIZED_TEMP_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

pub fn generate(program: &ast::Program) -> Result<IrProgram, LoweringError> {
  let mut gen = IrGen::new();
  for stmt in &program.body {
    // Only statements inside function definitions lower to IR; anything
    // else at module scope is accepted syntactically but produces no IR
    // (spec.md §4.4).
    if let StmtKind::FunctionDef(def) = &**stmt {
      gen.lower_function(def)?;
    }
  }
  Ok(gen.program)
}

struct IrGen {
  program: IrProgram,
  temp_counter: u64,
  label_counter: u64,
  cur_fn: Option<usize>,
  cur_block: Option<usize>,
  /// Exit-block labels for enclosing loops. No `break`/`continue` production
  /// exists in the grammar, so nothing ever pops a value off of this except
  /// the loop lowering that pushed it — kept as the forward-compatible hook
  /// spec.md §4.4 describes, per Design Notes' "open questions" resolution.
  loop_exit_stack: Vec<String>,
}

impl IrGen {
  fn new() -> Self {
    Self {
      program: IrProgram::default(),
      temp_counter: 0,
      label_counter: 0,
      cur_fn: None,
      cur_block: None,
      loop_exit_stack: Vec::new(),
    }
  }

  fn temp(&mut self) -> String {
    let name = format!("%t{}", self.temp_counter);
    self.temp_counter += 1;
    name
  }

  fn label(&mut self, prefix: &str) -> String {
    let name = format!("{prefix}_{}", self.label_counter);
    self.label_counter += 1;
    name
  }

  fn func_mut(&mut self) -> &mut IrFunction {
    &mut self.program.functions[self.cur_fn.expect("lowering outside a function")]
  }

  fn block_mut(&mut self) -> &mut BasicBlock {
    let bi = self.cur_block.expect("lowering with no current block");
    &mut self.func_mut().blocks[bi]
  }

  fn push_block(&mut self, block: BasicBlock) -> usize {
    let func = self.func_mut();
    func.blocks.push(block);
    func.blocks.len() - 1
  }

  fn emit(&mut self, op: IrOp, args: Vec<IrValue>, result: Option<String>) {
    self
      .block_mut()
      .instructions
      .push(IrInstruction::new(op, args, result));
  }

  fn last_op_is_ret(&mut self) -> bool {
    matches!(
      self.block_mut().instructions.last().map(|i| &i.op),
      Some(IrOp::Ret)
    )
  }

  fn define_local(&mut self, name: &str) {
    let func = self.func_mut();
    if !func.local_vars.iter().any(|v| v == name) {
      func.local_vars.push(name.to_string());
    }
  }

  fn lower_function(&mut self, def: &ast::FunctionDef) -> Result<(), LoweringError> {
    if self.cur_fn.is_some() {
      return Err(LoweringError::new(
        "nested function definitions are not supported",
        def.name.span,
      ));
    }

    let name = def.name.to_string();
    let params: Vec<String> = def.params.iter().map(|p| p.to_string()).collect();
    let entry = BasicBlock::new(format!("{name}_entry"));

    let func = IrFunction {
      name,
      params: params.clone(),
      entry_block: 0,
      blocks: vec![entry],
      local_vars: params,
    };
    self.program.functions.push(func);
    self.cur_fn = Some(self.program.functions.len() - 1);
    self.cur_block = Some(0);

    for stmt in &def.body {
      self.lower_stmt(stmt)?;
    }

    if !self.last_op_is_ret() {
      self.emit(IrOp::Ret, vec![], None);
    }

    self.cur_fn = None;
    self.cur_block = None;
    Ok(())
  }

  fn lower_stmt(&mut self, stmt: &ast::Stmt) -> Result<(), LoweringError> {
    match &**stmt {
      StmtKind::FunctionDef(def) => self.lower_function(def),
      StmtKind::Return(ret) => self.lower_return(ret),
      StmtKind::Assign(a) => self.lower_assign(a),
      StmtKind::AugAssign(a) => self.lower_aug_assign(a),
      StmtKind::For(f) => self.lower_for(f),
      StmtKind::While(w) => self.lower_while(w),
      StmtKind::If(i) => self.lower_if(i),
      StmtKind::Expr(e) => {
        self.lower_expr(e)?;
        Ok(())
      }
      StmtKind::Pass => Ok(()),
    }
  }

  fn lower_return(&mut self, ret: &ast::Return) -> Result<(), LoweringError> {
    match &ret.value {
      Some(value) => {
        let v = self.lower_expr(value)?;
        self.emit(IrOp::Ret, vec![v], None);
      }
      None => self.emit(IrOp::Ret, vec![], None),
    }
    Ok(())
  }

  fn lower_assign(&mut self, a: &ast::Assign) -> Result<(), LoweringError> {
    let value = self.lower_expr(&a.value)?;
    for target in &a.targets {
      match &**target {
        ExprKind::Name(n) => {
          let name = n.id.to_string();
          self.define_local(&name);
          self.emit(IrOp::Store, vec![value.clone(), IrValue::var(name.clone())], None);
        }
        _ => {
          return Err(LoweringError::new(
            "assignment target must be a name",
            target.span,
          ))
        }
      }
    }
    Ok(())
  }

  fn lower_aug_assign(&mut self, a: &ast::AugAssign) -> Result<(), LoweringError> {
    let ExprKind::Name(n) = &*a.target else {
      return Err(LoweringError::new(
        "augmented-assignment target must be a name",
        a.target.span,
      ));
    };
    let name = n.id.to_string();
    let target_value = self.lower_expr(&a.target)?;
    let right_value = self.lower_expr(&a.value)?;
    let result = self.temp();
    self.emit(
      IrOp::BinOp(to_ir_binop(a.op)),
      vec![target_value, right_value],
      Some(result.clone()),
    );
    self.define_local(&name);
    self.emit(IrOp::Store, vec![IrValue::reg(result), IrValue::var(name)], None);
    Ok(())
  }

  fn lower_for(&mut self, f: &ast::For) -> Result<(), LoweringError> {
    let ExprKind::Name(target_name) = &*f.target else {
      return Err(LoweringError::new("for-loop target must be a name", f.target.span));
    };
    let target = target_name.id.to_string();

    let iter_value = self.lower_expr(&f.iter)?;

    let init_block = self.cur_block.unwrap();
    let cond_label = self.label("for_cond");
    let body_label = self.label("for_body");
    let exit_label = self.label("for_exit");
    let cond_block = self.push_block(BasicBlock::new(cond_label.clone()));
    let body_block = self.push_block(BasicBlock::new(body_label.clone()));
    let exit_block = self.push_block(BasicBlock::new(exit_label.clone()));

    self.func_mut().blocks[init_block].next_block = Some(cond_block);
    self.func_mut().blocks[cond_block].next_block = Some(body_block);
    self.func_mut().blocks[cond_block].branch_target = Some(exit_block);
    self.func_mut().blocks[body_block].next_block = Some(cond_block);

    self.loop_exit_stack.push(exit_label.clone());

    let index_var = self.temp();
    self.define_local(&target);
    self.emit(IrOp::Const, vec![IrValue::int(0)], Some(index_var.clone()));

    self.cur_block = Some(cond_block);
    let iter_len = self.temp();
    self.emit(IrOp::Len, vec![iter_value.clone()], Some(iter_len.clone()));
    let cond_result = self.temp();
    self.emit(
      IrOp::Compare(CmpOp::Less),
      vec![IrValue::reg(index_var.clone()), IrValue::reg(iter_len)],
      Some(cond_result.clone()),
    );
    self.emit(
      IrOp::Branch,
      vec![
        IrValue::reg(cond_result),
        IrValue::label(body_label),
        IrValue::label(exit_label),
      ],
      None,
    );

    self.cur_block = Some(body_block);
    let item = self.temp();
    self.emit(
      IrOp::GetItem,
      vec![iter_value, IrValue::reg(index_var.clone())],
      Some(item.clone()),
    );
    self.emit(IrOp::Store, vec![IrValue::reg(item), IrValue::var(target)], None);

    for stmt in &f.body {
      self.lower_stmt(stmt)?;
    }

    self.emit(
      IrOp::BinOp(BinOp::Add),
      vec![IrValue::reg(index_var.clone()), IrValue::int(1)],
      Some(index_var),
    );
    self.emit(IrOp::Jump, vec![IrValue::label(cond_label)], None);

    self.loop_exit_stack.pop();
    self.cur_block = Some(exit_block);
    Ok(())
  }

  fn lower_while(&mut self, w: &ast::While) -> Result<(), LoweringError> {
    let cond_label = self.label("while_cond");
    let body_label = self.label("while_body");
    let exit_label = self.label("while_exit");
    let cond_block = self.push_block(BasicBlock::new(cond_label.clone()));
    let body_block = self.push_block(BasicBlock::new(body_label.clone()));
    let exit_block = self.push_block(BasicBlock::new(exit_label.clone()));

    let prev_block = self.cur_block.unwrap();
    self.func_mut().blocks[prev_block].next_block = Some(cond_block);
    self.func_mut().blocks[cond_block].next_block = Some(body_block);
    self.func_mut().blocks[cond_block].branch_target = Some(exit_block);
    self.func_mut().blocks[body_block].next_block = Some(cond_block);

    self.loop_exit_stack.push(exit_label.clone());

    self.cur_block = Some(cond_block);
    let cond_result = self.lower_expr(&w.test)?;
    self.emit(
      IrOp::Branch,
      vec![cond_result, IrValue::label(body_label), IrValue::label(exit_label)],
      None,
    );

    self.cur_block = Some(body_block);
    for stmt in &w.body {
      self.lower_stmt(stmt)?;
    }
    self.emit(IrOp::Jump, vec![IrValue::label(cond_label)], None);

    self.loop_exit_stack.pop();
    self.cur_block = Some(exit_block);
    Ok(())
  }

  fn lower_if(&mut self, i: &ast::If) -> Result<(), LoweringError> {
    let cond_result = self.lower_expr(&i.test)?;

    let then_label = self.label("if_then");
    let merge_label = self.label("if_merge");
    let then_block = self.push_block(BasicBlock::new(then_label.clone()));
    let merge_block = self.push_block(BasicBlock::new(merge_label.clone()));

    let prev_block = self.cur_block.unwrap();

    if !i.orelse.is_empty() {
      let else_label = self.label("if_else");
      let else_block = self.push_block(BasicBlock::new(else_label.clone()));
      self.emit(
        IrOp::Branch,
        vec![cond_result, IrValue::label(then_label), IrValue::label(else_label)],
        None,
      );
      self.func_mut().blocks[prev_block].next_block = Some(then_block);
      self.func_mut().blocks[prev_block].branch_target = Some(else_block);

      self.cur_block = Some(then_block);
      for stmt in &i.body {
        self.lower_stmt(stmt)?;
      }
      self.emit(IrOp::Jump, vec![IrValue::label(merge_label.clone())], None);

      self.cur_block = Some(else_block);
      for stmt in &i.orelse {
        self.lower_stmt(stmt)?;
      }
      self.emit(IrOp::Jump, vec![IrValue::label(merge_label)], None);
    } else {
      self.emit(
        IrOp::Branch,
        vec![cond_result, IrValue::label(then_label), IrValue::label(merge_label.clone())],
        None,
      );
      self.func_mut().blocks[prev_block].next_block = Some(then_block);
      self.func_mut().blocks[prev_block].branch_target = Some(merge_block);

      self.cur_block = Some(then_block);
      for stmt in &i.body {
        self.lower_stmt(stmt)?;
      }
      self.emit(IrOp::Jump, vec![IrValue::label(merge_label)], None);
    }

    self.cur_block = Some(merge_block);
    Ok(())
  }

  fn lower_expr(&mut self, expr: &ast::Expr) -> Result<IrValue, LoweringError> {
    match &**expr {
      ExprKind::Constant(c) => Ok(self.lower_constant(c)),
      ExprKind::BinOp(b) => {
        let left = self.lower_expr(&b.left)?;
        let right = self.lower_expr(&b.right)?;
        let result = self.temp();
        self.emit(
          IrOp::BinOp(to_ir_binop(b.op)),
          vec![left, right],
          Some(result.clone()),
        );
        Ok(IrValue::reg(result))
      }
      ExprKind::UnaryOp(u) => {
        let operand = self.lower_expr(&u.operand)?;
        let result = self.temp();
        self.emit(IrOp::UnOp(to_ir_unop(u.op)), vec![operand], Some(result.clone()));
        Ok(IrValue::reg(result))
      }
      ExprKind::Compare(c) => self.lower_compare(c, expr.span),
      ExprKind::Name(n) => {
        let result = self.temp();
        self.emit(IrOp::Load, vec![IrValue::var(n.id.to_string())], Some(result.clone()));
        Ok(IrValue::reg(result))
      }
      ExprKind::Call(c) => self.lower_call(c, expr.span),
    }
  }

  fn lower_constant(&mut self, c: &ast::Constant) -> IrValue {
    let (literal, specialize_as_int) = match c {
      ast::Constant::Int(v) => (Literal::Int(*v), SPECIALIZED_TEMP_RANGE.contains(v).then_some(*v)),
      ast::Constant::Float(v) => (Literal::Float(*v), None),
      ast::Constant::Bool(v) => (Literal::Bool(*v), None),
      ast::Constant::Str(s) => (Literal::Str(s.to_string()), None),
      ast::Constant::None => (Literal::Int(0), None),
    };
    let result = match specialize_as_int {
      Some(v) => format!("%t{v}"),
      None => self.temp(),
    };
    self.emit(IrOp::Const, vec![IrValue::Const(literal)], Some(result.clone()));
    IrValue::reg(result)
  }

  fn lower_compare(&mut self, c: &ast::Compare, span: Span) -> Result<IrValue, LoweringError> {
    if c.ops.len() != 1 || c.comparators.len() != 1 {
      return Err(LoweringError::new("multi-way comparisons are not implemented", span));
    }
    let left = self.lower_expr(&c.left)?;
    let right = self.lower_expr(&c.comparators[0])?;
    let result = self.temp();
    self.emit(
      IrOp::Compare(to_ir_cmpop(c.ops[0])),
      vec![left, right],
      Some(result.clone()),
    );
    Ok(IrValue::reg(result))
  }

  fn lower_call(&mut self, c: &ast::Call, span: Span) -> Result<IrValue, LoweringError> {
    let ExprKind::Name(func) = &*c.func else {
      return Err(LoweringError::new("call target must be a name", span));
    };
    let mut args = vec![IrValue::var(func.id.to_string())];
    for arg in &c.args {
      args.push(self.lower_expr(arg)?);
    }
    let result = self.temp();
    self.emit(IrOp::Call, args, Some(result.clone()));
    Ok(IrValue::reg(result))
  }
}

fn to_ir_binop(op: ast::BinaryOp) -> BinOp {
  match op {
    ast::BinaryOp::Add => BinOp::Add,
    ast::BinaryOp::Sub => BinOp::Sub,
    ast::BinaryOp::Mul => BinOp::Mul,
    ast::BinaryOp::Div => BinOp::Div,
    ast::BinaryOp::Mod => BinOp::Mod,
    ast::BinaryOp::BitAnd => BinOp::BitAnd,
    ast::BinaryOp::BitOr => BinOp::BitOr,
    ast::BinaryOp::BitXor => BinOp::BitXor,
    ast::BinaryOp::Shl => BinOp::Shl,
    ast::BinaryOp::Shr => BinOp::Shr,
  }
}

fn to_ir_unop(op: ast::UnaryOpKind) -> UnOp {
  match op {
    ast::UnaryOpKind::Plus => UnOp::Pos,
    ast::UnaryOpKind::Minus => UnOp::Neg,
    ast::UnaryOpKind::BitNot => UnOp::BitNot,
  }
}

fn to_ir_cmpop(op: ast::CompareOp) -> CmpOp {
  match op {
    ast::CompareOp::Eq => CmpOp::Eq,
    ast::CompareOp::NotEq => CmpOp::NotEq,
    ast::CompareOp::Less => CmpOp::Less,
    ast::CompareOp::Greater => CmpOp::Greater,
    ast::CompareOp::LessEq => CmpOp::LessEq,
    ast::CompareOp::GreaterEq => CmpOp::GreaterEq,
  }
}

#[cfg(test)]
mod tests;
