//! Emits AT&T-free (`.intel_syntax noprefix`) x86-64 assembly from
//! [`ir::IrProgram`], mirroring `original_source/pytox86/codegen.py`'s
//! `X86Generator` instruction-by-instruction, register-poor approach: every
//! value round-trips through an 8-byte stack slot rather than living in a
//! register across instructions.
//!
//! Corrections from the Python reference, documented in DESIGN.md: floats
//! are materialized as their IEEE-754 bit pattern in a general-purpose
//! register instead of through a `.string`-typed rodata entry fed to
//! `movsd` (which never produced a valid double); argument marshaling is
//! driven by the typed [`ir::IrValue`] enum instead of runtime `isinstance`
//! checks; and `call`'s stack-alignment padding is computed from the
//! pushed-argument count rather than the total argument count, so calls
//! with six or fewer (all-register) arguments never emit an unrestored
//! `sub rsp, 8`.

mod writer;

use indexmap::{IndexMap, IndexSet};
use ir::{BinOp, CmpOp, IrFunction, IrInstruction, IrOp, IrProgram, IrValue, Literal, UnOp};
use writer::AsmWriter;

const ARG_REGISTERS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Generates a complete assembly listing for `program`.
pub fn generate(program: &IrProgram) -> String {
  let mut gen = CodeGenerator::new();
  gen.generate(program)
}

struct CodeGenerator {
  out: AsmWriter,
  rodata: IndexSet<String>,
  stack_vars: IndexMap<String, i64>,
}

impl CodeGenerator {
  fn new() -> Self {
    Self {
      out: AsmWriter::new(),
      rodata: IndexSet::new(),
      stack_vars: IndexMap::new(),
    }
  }

  fn generate(&mut self, program: &IrProgram) -> String {
    self.emit_header();
    for func in &program.functions {
      self.generate_function(func);
    }
    self.emit_footer();
    std::mem::replace(&mut self.out, AsmWriter::new()).finish()
  }

  fn emit_header(&mut self) {
    self.out.line(".intel_syntax noprefix");
    self.out.line(".global main");
    self.out.line(".text");
  }

  fn emit_footer(&mut self) {
    if self.rodata.is_empty() {
      return;
    }
    self.out.line(".section .rodata");
    for (i, value) in self.rodata.clone().iter().enumerate() {
      self.out.line(format!(".LC{i}:"));
      self.out.indent();
      self.out.line(format!(".string \"{}\"", escape_string(value)));
      self.out.dedent();
    }
  }

  /// Assigns every local/parameter and every `%`-prefixed instruction result
  /// a stack slot, in first-appearance order. A plain `HashSet` (as the
  /// Python original uses for both collections) has no stable iteration
  /// order; using [`IndexSet`] instead makes slot assignment — and so the
  /// emitted assembly — deterministic across runs. See DESIGN.md.
  fn assign_stack_slots(&mut self, func: &IrFunction) -> i64 {
    let mut vars: IndexSet<String> = IndexSet::new();
    for local in &func.local_vars {
      vars.insert(local.clone());
    }
    for block in &func.blocks {
      for instr in &block.instructions {
        if let Some(result) = &instr.result {
          if result.starts_with('%') {
            vars.insert(result.clone());
          }
        }
      }
    }

    self.stack_vars.clear();
    for (i, name) in vars.iter().enumerate() {
      self.stack_vars.insert(name.clone(), i as i64 * 8);
    }

    let mut stack_size = vars.len() as i64 * 8;
    if stack_size % 16 != 0 {
      stack_size += 8;
    }
    stack_size
  }

  fn generate_function(&mut self, func: &IrFunction) {
    let stack_size = self.assign_stack_slots(func);

    self.out.blank();
    self.out.line(format!("{}:", func.name));
    self.out.indent();

    self.out.line("push rbp");
    self.out.line("mov rbp, rsp");
    if stack_size > 0 {
      self.out.line(format!("sub rsp, {stack_size}"));
    }

    for (i, param) in func.params.iter().enumerate() {
      let offset = self.stack_vars[param] + 8;
      if i < 6 {
        self.out.line(format!("mov QWORD PTR [rbp-{offset}], {}", ARG_REGISTERS[i]));
      } else {
        let incoming = (i - 6 + 2) * 8;
        self.out.line(format!("mov rax, QWORD PTR [rbp+{incoming}]"));
        self.out.line(format!("mov QWORD PTR [rbp-{offset}], rax"));
      }
    }

    for block in &func.blocks {
      self.out.blank();
      self.out.line(format!("{}:", block.label));
      for instr in &block.instructions {
        self.generate_instruction(instr);
      }
    }

    self.out.dedent();
  }

  fn generate_instruction(&mut self, instr: &IrInstruction) {
    match &instr.op {
      IrOp::Const => {
        self.load_value(&instr.args[0], "rax");
        self.store_result(instr);
      }
      IrOp::Load => {
        let IrValue::Var(name) = &instr.args[0] else {
          unreachable!("load's operand is always a Var");
        };
        self.load_var(name, "rax");
        self.store_result(instr);
      }
      IrOp::Store => {
        self.load_value(&instr.args[0], "rax");
        let IrValue::Var(dest) = &instr.args[1] else {
          unreachable!("store's destination is always a Var");
        };
        self.store_var(dest, "rax");
      }
      IrOp::BinOp(op) => {
        self.load_value(&instr.args[0], "rax");
        self.load_value(&instr.args[1], "rcx");
        self.emit_binop(*op);
        self.store_result(instr);
      }
      IrOp::UnOp(op) => {
        self.load_value(&instr.args[0], "rax");
        match op {
          UnOp::Neg => self.out.line("neg rax"),
          UnOp::BitNot => self.out.line("not rax"),
          UnOp::Pos => {}
        }
        self.store_result(instr);
      }
      IrOp::Compare(op) => {
        self.load_value(&instr.args[0], "rax");
        self.load_value(&instr.args[1], "rcx");
        self.out.line("cmp rax, rcx");
        let set = match op {
          CmpOp::Eq => "sete al",
          CmpOp::NotEq => "setne al",
          CmpOp::Less => "setl al",
          CmpOp::Greater => "setg al",
          CmpOp::LessEq => "setle al",
          CmpOp::GreaterEq => "setge al",
        };
        self.out.line(set);
        self.out.line("movzx rax, al");
        self.store_result(instr);
      }
      IrOp::Branch => {
        self.load_value(&instr.args[0], "rax");
        self.out.line("cmp rax, 0");
        let (true_label, false_label) = match (&instr.args[1], &instr.args[2]) {
          (IrValue::Label(t), IrValue::Label(f)) => (t, f),
          _ => unreachable!("branch targets are always labels"),
        };
        self.out.line(format!("je {false_label}"));
        self.out.line(format!("jmp {true_label}"));
      }
      IrOp::Jump => {
        let IrValue::Label(target) = &instr.args[0] else {
          unreachable!("jump's target is always a label");
        };
        self.out.line(format!("jmp {target}"));
      }
      IrOp::Call => self.generate_call(instr),
      IrOp::Len => {
        self.load_value(&instr.args[0], "rdi");
        self.out.line("call _py_len");
        self.store_result(instr);
      }
      IrOp::GetItem => {
        self.load_value(&instr.args[0], "rdi");
        self.load_value(&instr.args[1], "rsi");
        self.out.line("call _py_getitem");
        self.store_result(instr);
      }
      IrOp::Ret => {
        match instr.args.first() {
          Some(value) => self.load_value(value, "rax"),
          None => self.out.line("xor rax, rax"),
        }
        self.out.line("leave");
        self.out.line("ret");
      }
    }
  }

  fn emit_binop(&mut self, op: BinOp) {
    match op {
      BinOp::Add => self.out.line("add rax, rcx"),
      BinOp::Sub => self.out.line("sub rax, rcx"),
      BinOp::Mul => self.out.line("imul rax, rcx"),
      BinOp::Div => {
        self.out.line("cqo");
        self.out.line("idiv rcx");
      }
      BinOp::Mod => {
        self.out.line("cqo");
        self.out.line("idiv rcx");
        self.out.line("mov rax, rdx");
      }
      BinOp::Shl => {
        self.out.line("mov rdx, rcx");
        self.out.line("shl rax, cl");
      }
      BinOp::Shr => {
        self.out.line("mov rdx, rcx");
        self.out.line("shr rax, cl");
      }
      BinOp::BitAnd => self.out.line("and rax, rcx"),
      BinOp::BitOr => self.out.line("or rax, rcx"),
      BinOp::BitXor => self.out.line("xor rax, rcx"),
    }
  }

  fn generate_call(&mut self, instr: &IrInstruction) {
    let IrValue::Var(func_name) = &instr.args[0] else {
      unreachable!("call's callee is always a Var");
    };
    let func_name = func_name.clone();
    let args = &instr.args[1..];

    for (i, arg) in args.iter().enumerate() {
      if i < 6 {
        self.load_value(arg, ARG_REGISTERS[i]);
      } else {
        self.load_value(arg, "rax");
        self.out.line("push rax");
      }
    }

    let pushed = args.len().saturating_sub(6);
    let padded = pushed % 2 == 1;
    if padded {
      self.out.line("sub rsp, 8");
    }

    self.out.line(format!("call {func_name}"));

    if pushed > 0 {
      let mut cleanup = pushed * 8;
      if padded {
        cleanup += 8;
      }
      self.out.line(format!("add rsp, {cleanup}"));
    }

    self.store_result(instr);
  }

  fn store_result(&mut self, instr: &IrInstruction) {
    if let Some(result) = &instr.result {
      self.store_var(result, "rax");
    }
  }

  fn load_var(&mut self, name: &str, dest: &str) {
    match self.stack_vars.get(name) {
      Some(offset) => self.out.line(format!("mov {dest}, QWORD PTR [rbp-{}]", offset + 8)),
      None => self.out.line(format!("mov {dest}, QWORD PTR [{name}]")),
    }
  }

  fn store_var(&mut self, name: &str, src: &str) {
    match self.stack_vars.get(name) {
      Some(offset) => self.out.line(format!("mov QWORD PTR [rbp-{}], {src}", offset + 8)),
      None => self.out.line(format!("mov QWORD PTR [{name}], {src}")),
    }
  }

  fn load_value(&mut self, value: &IrValue, dest: &str) {
    match value {
      IrValue::Const(Literal::Int(v)) => self.out.line(format!("mov {dest}, {v}")),
      IrValue::Const(Literal::Bool(b)) => self.out.line(format!("mov {dest}, {}", *b as i64)),
      IrValue::Const(Literal::Float(f)) => self.out.line(format!("mov {dest}, {}", f.to_bits())),
      IrValue::Const(Literal::Str(s)) => {
        let label = self.add_string_literal(s);
        self.out.line(format!("lea {dest}, [{label}]"));
      }
      IrValue::Reg(name) | IrValue::Var(name) => self.load_var(name, dest),
      IrValue::Label(_) => unreachable!("labels never flow through load_value"),
    }
  }

  fn add_string_literal(&mut self, value: &str) -> String {
    let (idx, _) = self.rodata.insert_full(value.to_string());
    format!(".LC{idx}")
  }
}

fn escape_string(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      '\r' => out.push_str("\\r"),
      other => out.push(other),
    }
  }
  out
}

#[cfg(test)]
mod tests;
