//! Wires the five pipeline stages (lexer, parser, semantic analyzer, IR
//! generator, optimizer, code generator) into a single [`Transpiler`] entry
//! point, so callers never have to drive each stage by hand.
//!
//! Every public method here constructs its own counters from scratch (the
//! temp/label counters live inside `ir::gen`'s `IrGen`, the stack-slot map
//! and rodata table inside `codegen`'s `CodeGenerator`) so that two calls on
//! the same `Transpiler` never share state.

use span::line_col;

/// One compiler diagnostic, already rendered as a human-readable, optionally
/// ANSI-colored multi-line report through `staticpy_diag::Report`. The
/// driver decides *whether* to print these and what exit code to use; it
/// never has to know how to lay out a source snippet itself (SPEC_FULL.md
/// §6).
pub type Diagnostics = Vec<String>;

fn render(name: &str, src: &str, color: bool, span: span::Span, message: impl Into<String>) -> String {
  let message = message.into();
  diag::Report::error()
    .source(diag::Source::file(name.to_string(), src.to_string()))
    .message(message)
    .span(span)
    .color(color)
    .build()
    .emit_to_string()
    .unwrap_or_else(|e| format!("{name}: failed to render diagnostic: {e}"))
}

/// The default in-process entry point. Stateless: every method is `&self`
/// and starts its own pipeline state, so one `Transpiler` can be reused
/// (or shared, or left at `Transpiler::new()` default) across many calls.
#[derive(Default)]
pub struct Transpiler {
  pub color: bool,
}

impl Transpiler {
  pub fn new() -> Self {
    Self { color: false }
  }

  /// Runs the full pipeline and returns the generated assembly text, or the
  /// rendered diagnostics from whichever stage failed first (lex, parse,
  /// semantic analysis, or lowering — §7's taxonomy).
  pub fn transpile(&self, name: &str, src: &str, opt_level: usize) -> Result<String, Diagnostics> {
    let program = self.parse(name, src)?;
    self.check(name, src, &program)?;
    let mut ir = self.lower(name, src, &program)?;
    self.optimize(&mut ir, opt_level);
    Ok(self.codegen(&ir))
  }

  /// Lexes `src` and renders the token stream one-per-line, or the lex
  /// errors if tokenizing failed. Backs `--dump-tokens`.
  pub fn dump_tokens(&self, name: &str, src: &str) -> Result<String, Diagnostics> {
    let lexer = syntax::lexer::Lexer::lex(src).map_err(|errors| {
      errors
        .into_iter()
        .map(|e| render(name, src, self.color, e.span, e.message))
        .collect::<Vec<_>>()
    })?;
    let mut out = String::new();
    for token in lexer.tokens() {
      let (line, col) = line_col(src, token.span.start);
      out.push_str(&format!(
        "{line}:{col}  {:<10} {:?}\n",
        token.kind.name(),
        token.lexeme
      ));
    }
    Ok(out)
  }

  /// Parses `src` and renders the AST with `{:#?}`. Backs `--dump-ast`.
  pub fn dump_ast(&self, name: &str, src: &str) -> Result<String, Diagnostics> {
    let program = self.parse(name, src)?;
    Ok(format!("{program:#?}"))
  }

  /// Parses, analyzes, lowers, and (if `opt_level > 0`) optimizes `src`,
  /// then renders the resulting IR in its textual form. Backs `--dump-ir`.
  pub fn dump_ir(&self, name: &str, src: &str, opt_level: usize) -> Result<String, Diagnostics> {
    let program = self.parse(name, src)?;
    self.check(name, src, &program)?;
    let mut ir = self.lower(name, src, &program)?;
    self.optimize(&mut ir, opt_level);
    Ok(ir.to_string())
  }

  fn parse<'src>(&self, name: &str, src: &'src str) -> Result<syntax::ast::Program<'src>, Diagnostics> {
    let span = tracing::debug_span!("lex_and_parse", file = name);
    let _enter = span.enter();
    syntax::parser::parse(src).map_err(|errors| {
      tracing::debug!(count = errors.len(), "parse failed");
      errors
        .into_iter()
        .map(|e| render(name, src, self.color, e.span, e.message))
        .collect()
    })
  }

  fn check(&self, name: &str, src: &str, program: &syntax::ast::Program) -> Result<(), Diagnostics> {
    let span = tracing::debug_span!("analyze", file = name, statements = program.body.len());
    let _enter = span.enter();
    sema::analyze(program).map_err(|errors| {
      tracing::debug!(count = errors.len(), "semantic analysis failed");
      errors
        .into_iter()
        .map(|e| render(name, src, self.color, e.span, e.message))
        .collect()
    })
  }

  fn lower(&self, name: &str, src: &str, program: &syntax::ast::Program) -> Result<ir::IrProgram, Diagnostics> {
    let span = tracing::debug_span!("lower", file = name);
    let _enter = span.enter();
    ir::gen::generate(program).map_err(|e| {
      tracing::debug!(%e, "lowering failed");
      vec![render(name, src, self.color, e.span, e.message)]
    })
  }

  fn optimize(&self, program: &mut ir::IrProgram, opt_level: usize) {
    let span = tracing::debug_span!("optimize", level = opt_level);
    let _enter = span.enter();
    let before: usize = instruction_count(program);
    optimize::Optimizer::new(opt_level).optimize(program);
    tracing::debug!(before, after = instruction_count(program), "optimized");
  }

  fn codegen(&self, program: &ir::IrProgram) -> String {
    let span = tracing::debug_span!("codegen", functions = program.functions.len());
    let _enter = span.enter();
    codegen::generate(program)
  }
}

fn instruction_count(program: &ir::IrProgram) -> usize {
  program
    .functions
    .iter()
    .flat_map(|f| f.blocks.iter())
    .map(|b| b.instructions.len())
    .sum()
}

#[cfg(test)]
mod tests;
