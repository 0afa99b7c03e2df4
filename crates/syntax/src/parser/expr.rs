//! Expression grammar, precedence-climbing from lowest to highest binding
//! power: comparison, then (this rework's addition) bitwise-or/xor/and and
//! shift, then additive, then multiplicative, then unary, then primary.

use span::Spanned;

use super::{check_recursion_limit, Parser};
use crate::ast::{self, CompareOp};
use crate::lexer::TokenKind::*;
use crate::{Error, Result};

impl<'src> Parser<'src> {
  pub(super) fn expr(&mut self) -> Result<ast::Expr<'src>> {
    check_recursion_limit(self.current().span)?;
    self.comparison()
  }

  /// `comparison := term ( CMPOP term )+ | term`, producing one `Compare`
  /// node for the whole chain rather than a tree of binary comparisons.
  fn comparison(&mut self) -> Result<ast::Expr<'src>> {
    let left = self.bitor()?;
    let mut ops = Vec::new();
    let mut comparators = Vec::new();
    loop {
      let op = match self.current().kind {
        Op_EqualEqual => CompareOp::Eq,
        Op_BangEqual => CompareOp::NotEq,
        Op_Less => CompareOp::Less,
        Op_More => CompareOp::Greater,
        Op_LessEqual => CompareOp::LessEq,
        Op_MoreEqual => CompareOp::GreaterEq,
        _ => break,
      };
      self.bump();
      ops.push(op);
      comparators.push(self.bitor()?);
    }
    if ops.is_empty() {
      Ok(left)
    } else {
      let span = left.span.join(comparators.last().unwrap().span);
      Ok(ast::expr_compare(span, left, ops, comparators))
    }
  }

  fn bitor(&mut self) -> Result<ast::Expr<'src>> {
    let mut left = self.bitxor()?;
    while self.current().is(Op_Pipe) {
      self.bump();
      let right = self.bitxor()?;
      let span = left.span.join(right.span);
      left = ast::expr_binop(span, ast::BinaryOp::BitOr, left, right);
    }
    Ok(left)
  }

  fn bitxor(&mut self) -> Result<ast::Expr<'src>> {
    let mut left = self.bitand()?;
    while self.current().is(Op_Caret) {
      self.bump();
      let right = self.bitand()?;
      let span = left.span.join(right.span);
      left = ast::expr_binop(span, ast::BinaryOp::BitXor, left, right);
    }
    Ok(left)
  }

  fn bitand(&mut self) -> Result<ast::Expr<'src>> {
    let mut left = self.shift()?;
    while self.current().is(Op_Amp) {
      self.bump();
      let right = self.shift()?;
      let span = left.span.join(right.span);
      left = ast::expr_binop(span, ast::BinaryOp::BitAnd, left, right);
    }
    Ok(left)
  }

  fn shift(&mut self) -> Result<ast::Expr<'src>> {
    let mut left = self.term()?;
    loop {
      let op = match self.current().kind {
        Op_Shl => ast::BinaryOp::Shl,
        Op_Shr => ast::BinaryOp::Shr,
        _ => break,
      };
      self.bump();
      let right = self.term()?;
      let span = left.span.join(right.span);
      left = ast::expr_binop(span, op, left, right);
    }
    Ok(left)
  }

  /// `term := factor ( ('+'|'-') factor )*`
  fn term(&mut self) -> Result<ast::Expr<'src>> {
    let mut left = self.factor()?;
    loop {
      let op = match self.current().kind {
        Op_Plus => ast::BinaryOp::Add,
        Op_Minus => ast::BinaryOp::Sub,
        _ => break,
      };
      self.bump();
      let right = self.factor()?;
      let span = left.span.join(right.span);
      left = ast::expr_binop(span, op, left, right);
    }
    Ok(left)
  }

  /// `factor := unary ( ('*'|'/'|'%') unary )*`
  fn factor(&mut self) -> Result<ast::Expr<'src>> {
    let mut left = self.unary()?;
    loop {
      let op = match self.current().kind {
        Op_Star => ast::BinaryOp::Mul,
        Op_Slash => ast::BinaryOp::Div,
        Op_Percent => ast::BinaryOp::Mod,
        _ => break,
      };
      self.bump();
      let right = self.unary()?;
      let span = left.span.join(right.span);
      left = ast::expr_binop(span, op, left, right);
    }
    Ok(left)
  }

  /// `unary := ('+'|'-') unary | primary`, extended with `~` for bit-not.
  fn unary(&mut self) -> Result<ast::Expr<'src>> {
    let op = match self.current().kind {
      Op_Plus => Some(ast::UnaryOpKind::Plus),
      Op_Minus => Some(ast::UnaryOpKind::Minus),
      Op_Tilde => Some(ast::UnaryOpKind::BitNot),
      _ => None,
    };
    match op {
      Some(op) => {
        let start = self.current().span;
        self.bump();
        let operand = self.unary()?;
        let span = start.join(operand.span);
        Ok(ast::expr_unary(span, op, operand))
      }
      None => self.primary(),
    }
  }

  /// `primary := INTEGER | FLOAT | STRING | '(' expression ')'
  ///           | IDENT ( '(' args? ')' )?`
  fn primary(&mut self) -> Result<ast::Expr<'src>> {
    let token = self.current().clone();
    match token.kind {
      Lit_Int => {
        self.bump();
        ast::lit::int(token.span, &token.lexeme)
      }
      Lit_Float => {
        self.bump();
        ast::lit::float(token.span, &token.lexeme)
      }
      Lit_Bool => {
        self.bump();
        Ok(ast::lit::bool(token.span, &token.lexeme))
      }
      Lit_None => {
        self.bump();
        Ok(ast::lit::none(token.span))
      }
      Lit_Str => {
        self.bump();
        ast::lit::str(token.span, token.lexeme)
      }
      Lit_Ident => {
        self.bump();
        let name = Spanned::new(token.span, token.lexeme);
        if self.current().is(Brk_ParenL) {
          self.bump();
          let args = self.call_args()?;
          let span = token.span.join(self.previous().span);
          let func = ast::expr_name(name, ast::NameCtx::Load);
          Ok(ast::expr_call(span, func, args))
        } else {
          Ok(ast::expr_name(name, ast::NameCtx::Load))
        }
      }
      Brk_ParenL => {
        self.bump();
        let inner = self.expr()?;
        self.expect(Brk_ParenR)?;
        Ok(inner)
      }
      _ => Err(Error::new(
        format!("expected an expression, found {}", token.kind.name()),
        token.span,
      )),
    }
  }

  fn call_args(&mut self) -> Result<Vec<ast::Expr<'src>>> {
    let mut args = Vec::new();
    if !self.current().is(Brk_ParenR) {
      args.push(self.expr()?);
      while self.bump_if(Tok_Comma) {
        if self.current().is(Brk_ParenR) {
          break;
        }
        args.push(self.expr()?);
      }
    }
    self.expect(Brk_ParenR)?;
    Ok(args)
  }
}
