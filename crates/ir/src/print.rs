//! A textual rendering of the IR, the `--dump-ir` counterpart to
//! `staticpy_codegen`'s assembly output — same idea as the teacher's
//! `Chunk::disassemble`/`Instruction::disassemble`, just for this crate's
//! three-address form instead of a bytecode stream.

use std::fmt;

use crate::{BasicBlock, BinOp, CmpOp, IrFunction, IrInstruction, IrOp, IrProgram, IrValue, Literal, UnOp};

impl fmt::Display for IrProgram {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !self.global_vars.is_empty() {
      writeln!(f, "globals: {}", self.global_vars.join(", "))?;
    }
    for (i, func) in self.functions.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{func}")?;
    }
    Ok(())
  }
}

impl fmt::Display for IrFunction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "function {}({}):", self.name, self.params.join(", "))?;
    for block in &self.blocks {
      write!(f, "{block}")?;
    }
    Ok(())
  }
}

impl fmt::Display for BasicBlock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}:", self.label)?;
    for instr in &self.instructions {
      writeln!(f, "    {instr}")?;
    }
    Ok(())
  }
}

impl fmt::Display for IrInstruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
    let rhs = format!("{}({})", self.op.mnemonic(), args.join(", "));
    match &self.result {
      Some(result) => write!(f, "{result} = {rhs}"),
      None => write!(f, "{rhs}"),
    }
  }
}

impl IrOp {
  fn mnemonic(&self) -> String {
    match self {
      IrOp::Const => "const".to_string(),
      IrOp::Load => "load".to_string(),
      IrOp::Store => "store".to_string(),
      IrOp::BinOp(op) => format!("binop.{}", op.symbol()),
      IrOp::UnOp(op) => format!("unop.{}", op.symbol()),
      IrOp::Compare(op) => format!("compare.{}", op.symbol()),
      IrOp::Branch => "branch".to_string(),
      IrOp::Jump => "jump".to_string(),
      IrOp::Call => "call".to_string(),
      IrOp::Len => "len".to_string(),
      IrOp::GetItem => "getitem".to_string(),
      IrOp::Ret => "ret".to_string(),
    }
  }
}

impl BinOp {
  fn symbol(&self) -> &'static str {
    match self {
      BinOp::Add => "+",
      BinOp::Sub => "-",
      BinOp::Mul => "*",
      BinOp::Div => "/",
      BinOp::Mod => "%",
      BinOp::BitAnd => "&",
      BinOp::BitOr => "|",
      BinOp::BitXor => "^",
      BinOp::Shl => "<<",
      BinOp::Shr => ">>",
    }
  }
}

impl UnOp {
  fn symbol(&self) -> &'static str {
    match self {
      UnOp::Pos => "+",
      UnOp::Neg => "-",
      UnOp::BitNot => "~",
    }
  }
}

impl CmpOp {
  fn symbol(&self) -> &'static str {
    match self {
      CmpOp::Eq => "==",
      CmpOp::NotEq => "!=",
      CmpOp::Less => "<",
      CmpOp::Greater => ">",
      CmpOp::LessEq => "<=",
      CmpOp::GreaterEq => ">=",
    }
  }
}

impl fmt::Display for IrValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      IrValue::Reg(name) | IrValue::Var(name) | IrValue::Label(name) => write!(f, "{name}"),
      IrValue::Const(lit) => write!(f, "{lit}"),
    }
  }
}

impl fmt::Display for Literal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Literal::Int(v) => write!(f, "{v}"),
      Literal::Float(v) => write!(f, "{v}"),
      Literal::Bool(v) => write!(f, "{v}"),
      Literal::Str(s) => write!(f, "{s:?}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use syntax::parser::parse;

  use crate::gen::generate;

  #[test]
  fn renders_function_with_labeled_blocks() {
    let program = parse("def f():\n    return 1 + 2\n").unwrap();
    let ir = generate(&program).unwrap();
    let text = ir.to_string();
    assert!(text.contains("function f():"));
    assert!(text.contains("f_entry:"));
    assert!(text.contains("binop.+"));
    assert!(text.contains("ret("));
  }
}
