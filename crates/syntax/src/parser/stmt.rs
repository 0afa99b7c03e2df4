use span::Spanned;

use super::{check_recursion_limit, Parser};
use crate::ast;
use crate::ast::BinaryOp;
use crate::lexer::TokenKind::*;
use crate::Result;

impl<'src> Parser<'src> {
  pub(super) fn statement(&mut self) -> Result<ast::Stmt<'src>> {
    check_recursion_limit(self.current().span)?;
    match self.current().kind {
      Kw_Def => self.function_def(),
      Kw_If => self.if_stmt(),
      Kw_For => self.for_stmt(),
      Kw_While => self.while_stmt(),
      Kw_Return => self.return_stmt(),
      Kw_Pass => self.pass_stmt(),
      _ => self.simple_stmt(),
    }
  }

  fn ident(&mut self) -> Result<ast::Ident<'src>> {
    let token = self.current().clone();
    self.expect(Lit_Ident)?;
    Ok(Spanned::new(token.span, token.lexeme))
  }

  fn function_def(&mut self) -> Result<ast::Stmt<'src>> {
    self.span(|p| {
      p.bump(); // def
      let name = p.ident()?;
      p.expect(Brk_ParenL)?;
      let mut params = Vec::new();
      if !p.current().is(Brk_ParenR) {
        params.push(p.ident()?);
        while p.bump_if(Tok_Comma) {
          if p.current().is(Brk_ParenR) {
            break;
          }
          params.push(p.ident()?);
        }
      }
      p.expect(Brk_ParenR)?;
      let body = p.block()?;
      Ok(ast::StmtKind::FunctionDef(Box::new(ast::FunctionDef {
        name,
        params,
        body,
      })))
    })
  }

  /// `if_stmt := 'if' expression ':' block ( 'else' ':' block )?`. `elif`
  /// is accepted as sugar for `else: if ...`, producing a nested `If` in
  /// the `orelse` arm, matching Python's own desugaring.
  fn if_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    let start = self.current().span;
    self.bump(); // if
    let test = self.expr()?;
    let body = self.block()?;
    let orelse = self.else_clause()?;
    let end = self.previous().span;
    Ok(ast::if_stmt(start.join(end), test, body, orelse))
  }

  fn else_clause(&mut self) -> Result<Vec<ast::Stmt<'src>>> {
    if self.current().is(Kw_Elif) {
      let start = self.current().span;
      self.bump(); // elif
      let test = self.expr()?;
      let body = self.block()?;
      let orelse = self.else_clause()?;
      let end = self.previous().span;
      Ok(vec![ast::if_stmt(start.join(end), test, body, orelse)])
    } else if self.bump_if(Kw_Else) {
      self.block()
    } else {
      Ok(Vec::new())
    }
  }

  fn for_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    let start = self.current().span;
    self.bump(); // for
    let target = self.expr()?;
    self.expect(Kw_In)?;
    let iter = self.expr()?;
    self.loop_depth += 1;
    let body = self.block();
    self.loop_depth -= 1;
    let body = body?;
    let end = self.previous().span;
    Ok(ast::for_stmt(start.join(end), target, iter, body))
  }

  fn while_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    let start = self.current().span;
    self.bump(); // while
    let test = self.expr()?;
    self.loop_depth += 1;
    let body = self.block();
    self.loop_depth -= 1;
    let body = body?;
    let end = self.previous().span;
    Ok(ast::while_stmt(start.join(end), test, body))
  }

  fn return_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    let start = self.current().span;
    self.bump(); // return
    let value = if self.current().is(Newline) || self.current().is(Eof) {
      None
    } else {
      Some(self.expr()?)
    };
    self.end_of_simple_stmt()?;
    let end = self.previous().span;
    Ok(ast::return_stmt(start.join(end), value))
  }

  fn pass_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    let start = self.current().span;
    self.bump(); // pass
    self.end_of_simple_stmt()?;
    Ok(ast::pass_stmt(start.join(self.previous().span)))
  }

  /// `expr_stmt := expression ( '=' expression | AUGOP expression )? NEWLINE`
  fn simple_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    let start = self.current().span;
    let target = self.expr()?;
    let stmt = if let Some(op) = self.aug_assign_op() {
      self.bump();
      let value = self.expr()?;
      ast::aug_assign_stmt(start.join(self.previous().span), target, op, value)
    } else if self.bump_if(Op_Equal) {
      let value = self.expr()?;
      ast::assign_stmt(start.join(self.previous().span), vec![target], value)
    } else {
      ast::expr_stmt(target)
    };
    self.end_of_simple_stmt()?;
    Ok(stmt)
  }

  fn aug_assign_op(&self) -> Option<BinaryOp> {
    match self.current().kind {
      Op_PlusEqual => Some(BinaryOp::Add),
      Op_MinusEqual => Some(BinaryOp::Sub),
      Op_StarEqual => Some(BinaryOp::Mul),
      Op_SlashEqual => Some(BinaryOp::Div),
      Op_PercentEqual => Some(BinaryOp::Mod),
      Op_AmpEqual => Some(BinaryOp::BitAnd),
      Op_PipeEqual => Some(BinaryOp::BitOr),
      Op_CaretEqual => Some(BinaryOp::BitXor),
      Op_ShlEqual => Some(BinaryOp::Shl),
      Op_ShrEqual => Some(BinaryOp::Shr),
      _ => None,
    }
  }

  fn end_of_simple_stmt(&mut self) -> Result<()> {
    if self.current().is(Eof) {
      Ok(())
    } else {
      self.expect(Newline)
    }
  }
}

