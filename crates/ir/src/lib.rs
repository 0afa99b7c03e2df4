//! The three-address IR that sits between the AST and the code generator.
//!
//! Types here are shared, unmodified, by both [`gen`] (which builds them)
//! and `staticpy_optimize` (which mutates them in place) and
//! `staticpy_codegen` (which consumes them), the same way `hebi_op`'s
//! opcode/operand types are shared between `hebi_emit` and the VM
//! dispatcher.

pub mod gen;
mod print;

use span::Span;

/// An immediate value known at compile time. Spec's `const` opcode carries
/// exactly one of these; `Str` covers string literals without forcing the
/// rest of the IR to be stringly typed.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
  Int(i64),
  Float(f64),
  Bool(bool),
  Str(String),
}

/// One operand slot in an [`IrInstruction`]'s `args`. A closed enum instead
/// of the Python original's "whatever type the arg happens to be" convention
/// — see SPEC_FULL.md §3.
#[derive(Clone, Debug, PartialEq)]
pub enum IrValue {
  /// A virtual register, e.g. `%t3`. Produced by exactly one instruction's
  /// `result`.
  Reg(String),
  /// A bare local variable, parameter, or (for `call`) callee name.
  Var(String),
  /// A basic-block label, used only by `jump`/`branch` arguments.
  Label(String),
  /// An immediate known at lowering or folding time.
  Const(Literal),
}

impl IrValue {
  pub fn reg(name: impl Into<String>) -> Self {
    IrValue::Reg(name.into())
  }

  pub fn var(name: impl Into<String>) -> Self {
    IrValue::Var(name.into())
  }

  pub fn label(name: impl Into<String>) -> Self {
    IrValue::Label(name.into())
  }

  pub fn int(v: i64) -> Self {
    IrValue::Const(Literal::Int(v))
  }

  pub fn as_reg_name(&self) -> Option<&str> {
    match self {
      IrValue::Reg(name) => Some(name),
      _ => None,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  BitAnd,
  BitOr,
  BitXor,
  Shl,
  Shr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
  Pos,
  Neg,
  BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
  Eq,
  NotEq,
  Less,
  Greater,
  LessEq,
  GreaterEq,
}

/// The opcode tag. Operand shapes for each variant are fixed by spec.md §3's
/// table and enforced by how [`gen`] constructs instructions; the operator
/// itself lives on the tag (`BinOp(BinOp::Add)`) rather than as an `args[0]`
/// string, which is this rework's typed-contract rather than stringly-typed
/// take on the same shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum IrOp {
  /// args: `[Const(value)]`
  Const,
  /// args: `[Var(var_name)]`
  Load,
  /// args: `[source, Var(dest_var)]`
  Store,
  /// args: `[left, right]`
  BinOp(BinOp),
  /// args: `[operand]`
  UnOp(UnOp),
  /// args: `[left, right]`
  Compare(CmpOp),
  /// args: `[cond, Label(true), Label(false)]`
  Branch,
  /// args: `[Label(target)]`
  Jump,
  /// args: `[Var(func_name), arg0, arg1, ...]`
  Call,
  /// args: `[value]`
  Len,
  /// args: `[value, index]`
  GetItem,
  /// args: `[]` or `[value]`
  Ret,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrInstruction {
  pub op: IrOp,
  pub args: Vec<IrValue>,
  pub result: Option<String>,
}

impl IrInstruction {
  pub fn new(op: IrOp, args: Vec<IrValue>, result: Option<String>) -> Self {
    Self { op, args, result }
  }

  /// True for the three opcodes spec.md calls terminators.
  pub fn is_terminator(&self) -> bool {
    matches!(self.op, IrOp::Branch | IrOp::Jump | IrOp::Ret)
  }
}

/// A maximal straight-line run of instructions. `next_block`/`branch_target`
/// are advisory indices into the owning function's `blocks`, per Design
/// Notes §9 — the optimizer treats the terminator instruction as the
/// authoritative source of control flow and these as hints only.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicBlock {
  pub label: String,
  pub instructions: Vec<IrInstruction>,
  pub next_block: Option<usize>,
  pub branch_target: Option<usize>,
}

impl BasicBlock {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      instructions: Vec::new(),
      next_block: None,
      branch_target: None,
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrFunction {
  pub name: String,
  pub params: Vec<String>,
  pub entry_block: usize,
  pub blocks: Vec<BasicBlock>,
  pub local_vars: Vec<String>,
}

impl IrFunction {
  pub fn block(&self, idx: usize) -> &BasicBlock {
    &self.blocks[idx]
  }

  pub fn find_label(&self, label: &str) -> Option<usize> {
    self.blocks.iter().position(|b| b.label == label)
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IrProgram {
  pub functions: Vec<IrFunction>,
  pub global_vars: Vec<String>,
}

/// Lowering failed in a way the spec treats as fatal (§7): an assignment
/// target that isn't a `Name`, a chained (multi-way) comparison, or a call
/// whose callee isn't a bare name.
#[derive(Clone, Debug, PartialEq)]
pub struct LoweringError {
  pub message: String,
  pub span: Span,
}

impl LoweringError {
  pub fn new(message: impl Into<String>, span: impl Into<Span>) -> Self {
    Self {
      message: message.into(),
      span: span.into(),
    }
  }
}

impl std::fmt::Display for LoweringError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "error at {}: {}", self.span, self.message)
  }
}

impl std::error::Error for LoweringError {}
