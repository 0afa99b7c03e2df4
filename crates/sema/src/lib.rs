//! Scope-based semantic analysis: resolves every name and call target
//! against a chain of lexical scopes, mirroring
//! `original_source/pytox86/analyzer.py`'s `SymbolTable`/`SemanticAnalyzer`
//! but over the closed AST instead of `visit_<ClassName>` dispatch.
//!
//! The Python original threads scopes together as a parent-pointer chain of
//! heap objects; here the chain is an arena (`Vec<Scope>`) addressed by
//! index, the same trade the IR makes for basic blocks (Design Notes §9.2).

use std::collections::HashSet;

use span::Span;
use syntax::ast::{self, ExprKind, StmtKind};

const BUILTIN_FUNCTIONS: &[&str] = &["print", "len", "int", "float", "str", "range", "input"];

#[derive(Clone, Copy, PartialEq, Eq)]
enum SymbolKind {
  Function,
  Parameter,
  Variable,
}

struct Scope {
  symbols: Vec<(String, SymbolKind)>,
  parent: Option<usize>,
}

impl Scope {
  fn root() -> Self {
    Self {
      symbols: Vec::new(),
      parent: None,
    }
  }

  fn child(parent: usize) -> Self {
    Self {
      symbols: Vec::new(),
      parent: Some(parent),
    }
  }
}

/// One resolution failure. Carries a [`Span`] so a caller can render it
/// through `diag::Report` the way the rest of the pipeline does; this crate
/// stays independent of `diag` itself, the same separation `staticpy_syntax`
/// keeps between lexing/parsing errors and how they're eventually printed.
#[derive(Clone, Debug, PartialEq)]
pub struct SemaError {
  pub message: String,
  pub span: Span,
}

impl SemaError {
  fn new(message: impl Into<String>, span: impl Into<Span>) -> Self {
    Self {
      message: message.into(),
      span: span.into(),
    }
  }
}

impl std::fmt::Display for SemaError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "error at {}: {}", self.span, self.message)
  }
}

impl std::error::Error for SemaError {}

/// Checks every name load, augmented-assignment target, and call target in
/// `program` resolves. Errors accumulate across the whole program rather
/// than aborting on the first one, matching the parser's error-recovery
/// posture.
pub fn analyze(program: &ast::Program) -> Result<(), Vec<SemaError>> {
  let mut a = Analyzer::new();
  a.visit_program(program);
  if a.errors.is_empty() {
    Ok(())
  } else {
    Err(a.errors)
  }
}

struct Analyzer {
  scopes: Vec<Scope>,
  global: usize,
  current: usize,
  errors: Vec<SemaError>,
}

impl Analyzer {
  fn new() -> Self {
    Self {
      scopes: vec![Scope::root()],
      global: 0,
      current: 0,
      errors: Vec::new(),
    }
  }

  fn define(&mut self, scope: usize, name: &str, kind: SymbolKind) {
    self.scopes[scope].symbols.push((name.to_string(), kind));
  }

  fn contains_local(&self, scope: usize, name: &str) -> bool {
    self.scopes[scope].symbols.iter().any(|(n, _)| n == name)
  }

  /// Walks `scope`'s parent chain, matching `SymbolTable.contains` with
  /// `local_only=False`.
  fn contains(&self, scope: usize, name: &str) -> bool {
    let mut cur = Some(scope);
    while let Some(s) = cur {
      if self.contains_local(s, name) {
        return true;
      }
      cur = self.scopes[s].parent;
    }
    false
  }

  fn push_child(&mut self) -> usize {
    self.scopes.push(Scope::child(self.current));
    let idx = self.scopes.len() - 1;
    self.current = idx;
    idx
  }

  fn pop_to(&mut self, previous: usize) {
    self.current = previous;
  }

  fn visit_program(&mut self, program: &ast::Program) {
    // Pre-register every top-level function name before visiting any body,
    // so a function can call one defined later in the same file. The
    // Python original has no such prepass (`visit_FunctionDef` defines the
    // name only when that definition is reached), which makes forward
    // references fail there; this rework adds it as a deliberate
    // improvement, the same kind of correctness fix `staticpy_optimize`'s
    // DCE pass documents for `store` operands (DESIGN.md).
    for stmt in &program.body {
      if let StmtKind::FunctionDef(def) = &**stmt {
        if !self.contains_local(self.global, &def.name) {
          self.define(self.global, &def.name, SymbolKind::Function);
        }
      }
    }
    for stmt in &program.body {
      self.visit_stmt(stmt);
    }
  }

  fn visit_stmt(&mut self, stmt: &ast::Stmt) {
    match &**stmt {
      StmtKind::FunctionDef(def) => self.visit_function_def(def),
      StmtKind::Return(r) => {
        if let Some(value) = &r.value {
          self.visit_expr(value);
        }
      }
      StmtKind::Assign(a) => self.visit_assign(a),
      StmtKind::AugAssign(a) => self.visit_aug_assign(a),
      StmtKind::For(f) => self.visit_for(f),
      StmtKind::While(w) => self.visit_while(w),
      StmtKind::If(i) => self.visit_if(i),
      StmtKind::Expr(e) => self.visit_expr(e),
      StmtKind::Pass => {}
    }
  }

  fn visit_function_def(&mut self, def: &ast::FunctionDef) {
    if !self.contains_local(self.global, &def.name) {
      self.define(self.global, &def.name, SymbolKind::Function);
    }

    let previous = self.current;
    let scope = self.push_child();
    for param in &def.params {
      self.define(scope, param, SymbolKind::Parameter);
    }
    for stmt in &def.body {
      self.visit_stmt(stmt);
    }
    self.pop_to(previous);
  }

  fn visit_assign(&mut self, a: &ast::Assign) {
    self.visit_expr(&a.value);
    for target in &a.targets {
      match &**target {
        ExprKind::Name(n) => {
          if !self.contains(self.current, &n.id) {
            self.define(self.current, &n.id, SymbolKind::Variable);
          }
        }
        _ => self.visit_expr(target),
      }
    }
  }

  fn visit_aug_assign(&mut self, a: &ast::AugAssign) {
    self.visit_expr(&a.value);
    match &*a.target {
      ExprKind::Name(n) => {
        if !self.contains(self.current, &n.id) {
          self.errors.push(SemaError::new(
            format!("Variable '{}' used before assignment", n.id),
            a.target.span,
          ));
        }
      }
      _ => self.visit_expr(&a.target),
    }
  }

  fn visit_for(&mut self, f: &ast::For) {
    self.visit_expr(&f.iter);

    let previous = self.current;
    let scope = self.push_child();
    match &*f.target {
      ExprKind::Name(n) => self.define(scope, &n.id, SymbolKind::Variable),
      _ => self.visit_expr(&f.target),
    }
    for stmt in &f.body {
      self.visit_stmt(stmt);
    }
    self.pop_to(previous);
  }

  fn visit_while(&mut self, w: &ast::While) {
    self.visit_expr(&w.test);

    let previous = self.current;
    self.push_child();
    for stmt in &w.body {
      self.visit_stmt(stmt);
    }
    self.pop_to(previous);
  }

  fn visit_if(&mut self, i: &ast::If) {
    self.visit_expr(&i.test);

    let previous = self.current;
    self.push_child();
    for stmt in &i.body {
      self.visit_stmt(stmt);
    }
    self.pop_to(previous);

    if !i.orelse.is_empty() {
      let previous = self.current;
      self.push_child();
      for stmt in &i.orelse {
        self.visit_stmt(stmt);
      }
      self.pop_to(previous);
    }
  }

  fn visit_expr(&mut self, expr: &ast::Expr) {
    match &**expr {
      ExprKind::Constant(_) => {}
      ExprKind::BinOp(b) => {
        self.visit_expr(&b.left);
        self.visit_expr(&b.right);
      }
      ExprKind::UnaryOp(u) => self.visit_expr(&u.operand),
      ExprKind::Compare(c) => {
        self.visit_expr(&c.left);
        for comparator in &c.comparators {
          self.visit_expr(comparator);
        }
      }
      ExprKind::Name(n) => {
        if !self.contains(self.current, &n.id) {
          self.errors.push(SemaError::new(
            format!("Variable '{}' used before assignment", n.id),
            expr.span,
          ));
        }
      }
      ExprKind::Call(c) => self.visit_call(c, expr.span),
    }
  }

  fn visit_call(&mut self, c: &ast::Call, _span: Span) {
    match &*c.func {
      ExprKind::Name(n) => {
        let id: &str = &n.id;
        let visible = self.contains(self.global, id) || self.contains(self.current, id);
        if !visible && !is_builtin_function(id) {
          self
            .errors
            .push(SemaError::new(format!("Function '{id}' is not defined"), c.func.span));
        }
      }
      _ => self.visit_expr(&c.func),
    }
    for arg in &c.args {
      self.visit_expr(arg);
    }
  }
}

fn is_builtin_function(name: &str) -> bool {
  BUILTIN_FUNCTIONS.contains(&name)
}

/// `True`/`False`/`None` never surface as `Name` loads from this grammar's
/// parser (they parse straight to `Constant`), unlike the Python original
/// where they're represented as `Name` nodes checked against a
/// `builtin_constants` set. Kept here only as a documented non-event: no
/// caller needs it, but it records why `visit_Name`'s analogue above has no
/// matching special case.
#[allow(dead_code)]
fn builtin_constants() -> HashSet<&'static str> {
  ["True", "False", "None"].into_iter().collect()
}

#[cfg(test)]
mod tests;
