#![allow(clippy::needless_lifetimes)]

use beef::lean::Cow;
use span::{Span, Spanned};

pub type Ident<'src> = Spanned<Cow<'src, str>>;

#[derive(Debug)]
pub struct Program<'src> {
  pub body: Vec<Stmt<'src>>,
}

impl<'src> Program<'src> {
  pub fn new(body: Vec<Stmt<'src>>) -> Self {
    Self { body }
  }
}

pub type Stmt<'src> = Spanned<StmtKind<'src>>;

#[derive(Debug)]
pub enum StmtKind<'src> {
  FunctionDef(Box<FunctionDef<'src>>),
  Return(Box<Return<'src>>),
  Assign(Box<Assign<'src>>),
  AugAssign(Box<AugAssign<'src>>),
  For(Box<For<'src>>),
  While(Box<While<'src>>),
  If(Box<If<'src>>),
  Expr(Box<Expr<'src>>),
  Pass,
}

#[derive(Debug)]
pub struct FunctionDef<'src> {
  pub name: Ident<'src>,
  pub params: Vec<Ident<'src>>,
  pub body: Vec<Stmt<'src>>,
}

#[derive(Debug)]
pub struct Return<'src> {
  pub value: Option<Expr<'src>>,
}

/// `targets` is an ordered sequence per the data model; this grammar's
/// `expr_stmt` production only ever produces one, but lowering treats it
/// generically rather than assuming arity one.
#[derive(Debug)]
pub struct Assign<'src> {
  pub targets: Vec<Expr<'src>>,
  pub value: Expr<'src>,
}

#[derive(Debug)]
pub struct AugAssign<'src> {
  pub target: Expr<'src>,
  pub op: BinaryOp,
  pub value: Expr<'src>,
}

#[derive(Debug)]
pub struct For<'src> {
  pub target: Expr<'src>,
  pub iter: Expr<'src>,
  pub body: Vec<Stmt<'src>>,
}

#[derive(Debug)]
pub struct While<'src> {
  pub test: Expr<'src>,
  pub body: Vec<Stmt<'src>>,
}

#[derive(Debug)]
pub struct If<'src> {
  pub test: Expr<'src>,
  pub body: Vec<Stmt<'src>>,
  pub orelse: Vec<Stmt<'src>>,
}

pub type Expr<'src> = Spanned<ExprKind<'src>>;

#[derive(Debug)]
pub enum ExprKind<'src> {
  Constant(Box<Constant<'src>>),
  BinOp(Box<BinOp<'src>>),
  UnaryOp(Box<UnaryOp<'src>>),
  Compare(Box<Compare<'src>>),
  Name(Box<Name<'src>>),
  Call(Box<Call<'src>>),
}

#[derive(Debug)]
pub enum Constant<'src> {
  Int(i64),
  Float(f64),
  Bool(bool),
  Str(Cow<'src, str>),
  None,
}

#[derive(Debug)]
pub struct BinOp<'src> {
  pub op: BinaryOp,
  pub left: Expr<'src>,
  pub right: Expr<'src>,
}

/// `+ - * / %` are the spec's grammar; the bit operators are this rework's
/// addition, closing the gap between the original lexer/codegen (which
/// already handled them) and its parser (which never produced them).
#[derive(Debug)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
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

/// A single `Compare` node holds the entire chained comparison
/// (`a < b <= c`), matching the data model's `ops`/`comparators` sequences
/// rather than a tree of binary nodes.
#[derive(Debug)]
pub struct Compare<'src> {
  pub left: Expr<'src>,
  pub ops: Vec<CompareOp>,
  pub comparators: Vec<Expr<'src>>,
}

#[derive(Debug)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
  Eq,
  NotEq,
  Less,
  Greater,
  LessEq,
  GreaterEq,
}

#[derive(Debug)]
pub struct UnaryOp<'src> {
  pub op: UnaryOpKind,
  pub operand: Expr<'src>,
}

/// `+ -` are the spec's grammar; `~` is this rework's bit-operator addition.
#[derive(Debug)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
  Plus,
  Minus,
  BitNot,
}

#[derive(Debug)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum NameCtx {
  Load,
  Store,
}

#[derive(Debug)]
pub struct Name<'src> {
  pub id: Ident<'src>,
  pub ctx: NameCtx,
}

#[derive(Debug)]
pub struct Call<'src> {
  pub func: Expr<'src>,
  pub args: Vec<Expr<'src>>,
}

// --- constructors, mirroring the teacher's free-function AST builders ---

pub fn function_def<'src>(
  s: impl Into<Span>,
  name: Ident<'src>,
  params: Vec<Ident<'src>>,
  body: Vec<Stmt<'src>>,
) -> Stmt<'src> {
  Stmt::new(
    s,
    StmtKind::FunctionDef(Box::new(FunctionDef { name, params, body })),
  )
}

pub fn return_stmt(s: impl Into<Span>, value: Option<Expr>) -> Stmt {
  Stmt::new(s, StmtKind::Return(Box::new(Return { value })))
}

pub fn assign_stmt<'src>(s: impl Into<Span>, targets: Vec<Expr<'src>>, value: Expr<'src>) -> Stmt<'src> {
  Stmt::new(s, StmtKind::Assign(Box::new(Assign { targets, value })))
}

pub fn aug_assign_stmt<'src>(
  s: impl Into<Span>,
  target: Expr<'src>,
  op: BinaryOp,
  value: Expr<'src>,
) -> Stmt<'src> {
  Stmt::new(
    s,
    StmtKind::AugAssign(Box::new(AugAssign { target, op, value })),
  )
}

pub fn for_stmt<'src>(
  s: impl Into<Span>,
  target: Expr<'src>,
  iter: Expr<'src>,
  body: Vec<Stmt<'src>>,
) -> Stmt<'src> {
  Stmt::new(s, StmtKind::For(Box::new(For { target, iter, body })))
}

pub fn while_stmt<'src>(s: impl Into<Span>, test: Expr<'src>, body: Vec<Stmt<'src>>) -> Stmt<'src> {
  Stmt::new(s, StmtKind::While(Box::new(While { test, body })))
}

pub fn if_stmt<'src>(
  s: impl Into<Span>,
  test: Expr<'src>,
  body: Vec<Stmt<'src>>,
  orelse: Vec<Stmt<'src>>,
) -> Stmt<'src> {
  Stmt::new(s, StmtKind::If(Box::new(If { test, body, orelse })))
}

pub fn pass_stmt<'src>(s: impl Into<Span>) -> Stmt<'src> {
  Stmt::new(s, StmtKind::Pass)
}

pub fn expr_stmt(expr: Expr) -> Stmt {
  Stmt::new(expr.span, StmtKind::Expr(Box::new(expr)))
}

pub fn expr_binop<'src>(s: impl Into<Span>, op: BinaryOp, left: Expr<'src>, right: Expr<'src>) -> Expr<'src> {
  Expr::new(s, ExprKind::BinOp(Box::new(BinOp { op, left, right })))
}

pub fn expr_compare<'src>(
  s: impl Into<Span>,
  left: Expr<'src>,
  ops: Vec<CompareOp>,
  comparators: Vec<Expr<'src>>,
) -> Expr<'src> {
  Expr::new(
    s,
    ExprKind::Compare(Box::new(Compare {
      left,
      ops,
      comparators,
    })),
  )
}

pub fn expr_unary(s: impl Into<Span>, op: UnaryOpKind, operand: Expr) -> Expr {
  Expr::new(s, ExprKind::UnaryOp(Box::new(UnaryOp { op, operand })))
}

pub fn expr_name(id: Ident, ctx: NameCtx) -> Expr {
  Expr::new(id.span, ExprKind::Name(Box::new(Name { id, ctx })))
}

pub fn expr_call<'src>(s: impl Into<Span>, func: Expr<'src>, args: Vec<Expr<'src>>) -> Expr<'src> {
  Expr::new(s, ExprKind::Call(Box::new(Call { func, args })))
}

pub mod lit {
  use super::*;
  use crate::{Error, Result};

  pub fn none<'src>(s: impl Into<Span>) -> Expr<'src> {
    Expr::new(s, ExprKind::Constant(Box::new(Constant::None)))
  }

  pub fn bool<'src>(s: impl Into<Span>, lexeme: &str) -> Expr<'src> {
    let v = match lexeme {
      "True" => true,
      "False" => false,
      _ => unreachable!("bool is only ever `True` or `False`"),
    };
    Expr::new(s, ExprKind::Constant(Box::new(Constant::Bool(v))))
  }

  pub fn int<'src>(s: impl Into<Span>, lexeme: &str) -> Result<Expr<'src>> {
    let s = s.into();
    let value = lexeme
      .parse::<i64>()
      .map_err(|e| Error::new(format!("invalid integer literal: {e}"), s))?;
    Ok(Expr::new(s, ExprKind::Constant(Box::new(Constant::Int(value)))))
  }

  pub fn float<'src>(s: impl Into<Span>, lexeme: &str) -> Result<Expr<'src>> {
    let s = s.into();
    let value = lexeme
      .parse::<f64>()
      .map_err(|e| Error::new(format!("invalid float literal: {e}"), s))?;
    Ok(Expr::new(s, ExprKind::Constant(Box::new(Constant::Float(value)))))
  }

  pub fn str<'src>(s: impl Into<Span>, lexeme: Cow<'src, str>) -> Result<Expr<'src>> {
    let s = s.into();
    let raw = lexeme.into_owned();
    let inner = &raw[1..raw.len() - 1];
    let unescaped = unescape(inner).ok_or_else(|| Error::new("invalid escape sequence in string literal", s))?;
    Ok(Expr::new(s, ExprKind::Constant(Box::new(Constant::Str(Cow::from(unescaped))))))
  }

  /// Unescapes `\n \t \r \\ \" \'` plus `\xHH` and `\u{H+}`, matching
  /// `hebi_syntax::ast::lit2::unescape_in_place`'s escape set, applied to
  /// this language's double- and single-quoted strings.
  fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
      if ch != '\\' {
        out.push(ch);
        continue;
      }
      let next = chars.next()?;
      match next {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        '\'' => out.push('\''),
        '"' => out.push('"'),
        '\\' => out.push('\\'),
        'x' => out.push(parse_hex_code(&mut chars)?),
        'u' => out.push(parse_unicode(&mut chars)?),
        other => {
          out.push('\\');
          out.push(other);
        }
      }
    }
    Some(out)
  }

  fn parse_hex_code<I: Iterator<Item = char>>(chars: &mut I) -> Option<char> {
    let digits: String = [chars.next()?, chars.next()?].into_iter().collect();
    let c = u32::from_str_radix(&digits, 16).ok()?;
    char::from_u32(c)
  }

  fn parse_unicode<I: Iterator<Item = char>>(chars: &mut I) -> Option<char> {
    if chars.next() != Some('{') {
      return None;
    }
    let digits: String = chars.take_while(|&c| c != '}').collect();
    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
  }
}
