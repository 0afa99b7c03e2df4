#![deny(unused_must_use)]
#![allow(dead_code, clippy::needless_update)]

use span::{Span, Spanned};

use crate::lexer::TokenKind::*;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::{ast, Error, Result};

/// Parses a complete source file into a [`ast::Program`].
///
/// Errors accumulate rather than aborting on the first one: a caller gets
/// back every statement-level error the source contains in one pass.
pub fn parse(src: &str) -> std::result::Result<ast::Program, Vec<Error>> {
  let lexer = match Lexer::lex(src) {
    Ok(lexer) => lexer,
    Err(errors) => {
      return Err(
        errors
          .into_iter()
          .map(|e| Error::new(e.message, e.span))
          .collect(),
      )
    }
  };
  let mut parser = Parser::new(lexer);
  let body = parser.program_body();
  if parser.errors.is_empty() {
    Ok(ast::Program::new(body))
  } else {
    Err(parser.errors)
  }
}

struct Parser<'src> {
  lex: Lexer<'src>,
  errors: Vec<Error>,
  /// Tracks whether we're directly inside a loop body, to validate that
  /// loop-only constructs aren't used elsewhere. Not currently load-bearing
  /// since `break`/`continue` aren't part of the grammar, but kept as the
  /// hook a future loop-control feature would extend.
  loop_depth: u32,
}

impl<'src> Parser<'src> {
  fn new(lex: Lexer<'src>) -> Self {
    Self {
      lex,
      errors: Vec::new(),
      loop_depth: 0,
    }
  }

  fn program_body(&mut self) -> Vec<ast::Stmt<'src>> {
    let mut body = Vec::new();
    while !self.current().is(Eof) {
      if self.bump_if(Newline) {
        continue;
      }
      match self.statement() {
        Ok(stmt) => body.push(stmt),
        Err(e) => {
          self.errors.push(e);
          self.sync();
        }
      }
    }
    body
  }

  #[inline]
  fn previous(&self) -> &Token<'src> {
    self.lex.previous()
  }

  #[inline]
  fn current(&self) -> &Token<'src> {
    self.lex.current()
  }

  #[inline]
  fn expect(&mut self, kind: TokenKind) -> Result<()> {
    if self.bump_if(kind) {
      Ok(())
    } else {
      Err(Error::new(
        format!("expected {}, found {}", kind.name(), self.current().kind.name()),
        self.current().span,
      ))
    }
  }

  #[inline]
  fn bump_if(&mut self, kind: TokenKind) -> bool {
    if self.current().is(kind) {
      self.bump();
      true
    } else {
      false
    }
  }

  /// Move forward by one token, returning the previous one.
  #[inline]
  fn bump(&mut self) -> &Token<'src> {
    self.lex.bump();
    while self.current().is(_Error) {
      self.errors.push(Error::new(
        format!("invalid token `{}`", self.current().lexeme),
        self.current().span,
      ));
      self.lex.bump();
    }
    self.previous()
  }

  /// Calls `f` and wraps the returned value in a span that encompasses the
  /// entire sequence of tokens parsed within `f`.
  #[inline]
  fn span<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<Spanned<T>> {
    let start = self.current().span;
    f(self).map(|value| {
      let end = self.previous().span;
      Spanned::new(start.join(end), value)
    })
  }

  /// Parses a block: `:` `Newline` `Indent` stmt+ `Dedent`.
  fn block(&mut self) -> Result<Vec<ast::Stmt<'src>>> {
    self.expect(Tok_Colon)?;
    self.expect(Newline)?;
    self.expect(Indent)?;
    let mut body = Vec::new();
    loop {
      if self.bump_if(Newline) {
        continue;
      }
      if self.current().is(Dedent) || self.current().is(Eof) {
        break;
      }
      match self.statement() {
        Ok(stmt) => body.push(stmt),
        Err(e) => {
          self.errors.push(e);
          self.sync();
          if self.current().is(Dedent) || self.current().is(Eof) {
            break;
          }
        }
      }
    }
    self.expect(Dedent)?;
    if body.is_empty() {
      return Err(Error::new("block must contain at least one statement", self.current().span));
    }
    Ok(body)
  }

  /// Resynchronizes after a statement-level error: skip to the next
  /// `Newline`/`Dedent`/`Eof` so a later statement can still be parsed.
  fn sync(&mut self) {
    loop {
      match self.current().kind {
        Eof | Dedent => break,
        Newline => {
          self.bump();
          break;
        }
        _Error => {
          self.errors.push(Error::new(
            format!("invalid token `{}`", self.current().lexeme),
            self.current().span,
          ));
          self.bump();
        }
        _ => {
          self.bump();
        }
      }
    }
  }
}

mod expr;
mod stmt;

// On average, a single parse_XXX() method consumes a modest amount of stack
// space. Assuming ~50 recursive calls per dive and a few hundred bytes per
// call, we require tens of kilobytes of stack to dive. We round up to 64k.
const MINIMUM_STACK_REQUIRED: usize = 64_000;

#[cfg(target_family = "wasm")]
fn check_recursion_limit(_span: Span) -> Result<(), Error> {
  Ok(())
}

#[cfg(not(target_family = "wasm"))]
fn check_recursion_limit(span: Span) -> Result<()> {
  if stacker::remaining_stack()
    .map(|available| available > MINIMUM_STACK_REQUIRED)
    .unwrap_or(true)
  {
    Ok(())
  } else {
    Err(Error::new("nesting limit reached", span))
  }
}

impl<'src> Token<'src> {
  #[inline]
  fn is(&self, kind: TokenKind) -> bool {
    self.kind == kind
  }
}

#[cfg(test)]
mod tests;
