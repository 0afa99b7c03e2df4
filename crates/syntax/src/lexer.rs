//! Line-oriented lexer for the staticpy language subset.
//!
//! Indentation carries structural meaning, so tokenizing can't be a single
//! whole-file pass: each physical line is classified first (blank,
//! comment-only, or real), and only real lines measure indentation and
//! touch the indent stack. The remainder of a real line is handed to
//! `logos` for regular tokenization, the same way the teacher's lexer
//! dispatches on a `Logos`-derived `TokenKind`, just scoped to one line
//! at a time instead of the whole source.

use std::fmt;

use beef::lean::Cow;
use logos::Logos;
use span::Span;

#[derive(Clone, Debug)]
pub struct Token<'src> {
  pub lexeme: Cow<'src, str>,
  pub kind: TokenKind,
  pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Error {
  pub span: Span,
  pub message: String,
}

pub struct Lexer<'src> {
  src: &'src str,
  tokens: Vec<Token<'src>>,
  cursor: usize,
  eof: Span,
}


impl<'src> Lexer<'src> {
  pub fn lex(src: &'src str) -> Result<Self, Vec<Error>> {
    let eof: Span = (src.len()..src.len()).into();

    let mut errors = Vec::new();
    let mut tokens = Vec::new();
    let mut indents: Vec<usize> = vec![0];

    let mut offset = 0usize;
    for raw_line in src.split_inclusive('\n') {
      let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);
      let line = line.strip_suffix('\r').unwrap_or(line);
      let line_start = offset;
      offset += raw_line.len();

      let content_start = leading_whitespace_width(line);
      let rest = &line[byte_len_of_width(line, content_start)..];
      let is_blank_or_comment = rest.is_empty() || rest.starts_with('#');

      if !is_blank_or_comment {
        let indent = content_start;
        let current = *indents.last().unwrap();
        if indent > current {
          indents.push(indent);
          tokens.push(Token {
            lexeme: Cow::borrowed(""),
            kind: TokenKind::Indent,
            span: (line_start..line_start).into(),
          });
        } else if indent < current {
          while *indents.last().unwrap() > indent {
            indents.pop();
            tokens.push(Token {
              lexeme: Cow::borrowed(""),
              kind: TokenKind::Dedent,
              span: (line_start..line_start).into(),
            });
          }
          if *indents.last().unwrap() != indent {
            errors.push(Error {
              span: (line_start..line_start + line.len()).into(),
              message: "inconsistent indentation".into(),
            });
            indents.push(indent);
          }
        }
      }

      if !is_blank_or_comment {
        let body_start = line_start + byte_len_of_width(line, content_start);
        let body = &line[byte_len_of_width(line, content_start)..];
        let mut lex = logos::Lexer::<'src, TokenKind>::new(body);
        // SAFETY-free re-slice: `body` borrows from `src` through `line`,
        // which itself is a subslice of `src`, so re-deriving the absolute
        // offset by pointer arithmetic is unnecessary; we track it directly.
        let mut local = 0usize;
        while let Some(kind) = lex.next() {
          let lexeme = lex.slice();
          let lspan = lex.span();
          let abs: Span = (body_start + lspan.start..body_start + lspan.end).into();
          local = lspan.end;
          match kind {
            TokenKind::_Whitespace => continue,
            TokenKind::_Comment => break,
            TokenKind::_Error => {
              errors.push(Error {
                span: abs,
                message: format!("unrecognized token `{lexeme}`"),
              });
            }
            _ => tokens.push(Token {
              lexeme: lexeme.into(),
              kind,
              span: abs,
            }),
          }
        }
        let _ = local;
      }

      if !is_blank_or_comment {
        tokens.push(Token {
          lexeme: Cow::borrowed(""),
          kind: TokenKind::Newline,
          span: (offset.saturating_sub(1)..offset).into(),
        });
      }
    }

    while indents.len() > 1 {
      indents.pop();
      tokens.push(Token {
        lexeme: Cow::borrowed(""),
        kind: TokenKind::Dedent,
        span: eof,
      });
    }
    tokens.push(Token {
      lexeme: Cow::borrowed(""),
      kind: TokenKind::Eof,
      span: eof,
    });

    if !errors.is_empty() {
      Err(errors)
    } else {
      Ok(Lexer {
        src,
        tokens,
        cursor: 0,
        eof,
      })
    }
  }

  pub fn src(&self) -> &'src str {
    self.src
  }

  pub fn current(&self) -> &Token<'src> {
    &self.tokens[self.cursor.min(self.tokens.len() - 1)]
  }

  pub fn previous(&self) -> &Token<'src> {
    let idx = self.cursor.saturating_sub(1);
    &self.tokens[idx]
  }

  pub fn bump(&mut self) -> &Token<'src> {
    if self.cursor + 1 < self.tokens.len() {
      self.cursor += 1;
    }
    self.previous()
  }

  pub fn lexeme(&self) -> &'src str {
    match &self.current().lexeme {
      Cow::Borrowed(s) => s,
      Cow::Owned(_) => "",
    }
  }

  pub fn eof_span(&self) -> Span {
    self.eof
  }

  /// The complete token stream, in source order, ending in exactly one
  /// [`TokenKind::Eof`]. Used by the `--dump-tokens` driver option; parsing
  /// itself only ever looks at `current`/`previous`.
  pub fn tokens(&self) -> &[Token<'src>] {
    &self.tokens
  }
}

/// Width of leading whitespace in columns. Per spec.md §4.1, tabs and
/// spaces are counted identically as one column each — no tab-expansion,
/// unlike Python's own tokenizer.
fn leading_whitespace_width(line: &str) -> usize {
  line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

/// Byte length of the prefix of `line` whose column width is `width`
/// (assumes `width` was produced by [`leading_whitespace_width`] on the
/// same line). Since indentation is ASCII space/tab, width equals byte
/// count here, but we walk chars to stay correct if that ever changes.
fn byte_len_of_width(line: &str, width: usize) -> usize {
  line.chars().take(width).map(|c| c.len_utf8()).sum()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Logos)]
pub enum TokenKind {
  // Keywords
  #[token("def")]
  Kw_Def,
  #[token("return")]
  Kw_Return,
  #[token("if")]
  Kw_If,
  #[token("elif")]
  Kw_Elif,
  #[token("else")]
  Kw_Else,
  #[token("for")]
  Kw_For,
  #[token("while")]
  Kw_While,
  #[token("in")]
  Kw_In,
  #[token("pass")]
  Kw_Pass,

  // Brackets
  #[token("(")]
  Brk_ParenL,
  #[token(")")]
  Brk_ParenR,
  #[token("[")]
  Brk_SquareL,
  #[token("]")]
  Brk_SquareR,

  // Punctuation
  #[token(",")]
  Tok_Comma,
  #[token(":")]
  Tok_Colon,

  // Assignment / augmented-assignment operators
  #[token("=")]
  Op_Equal,
  #[token("+=")]
  Op_PlusEqual,
  #[token("-=")]
  Op_MinusEqual,
  #[token("*=")]
  Op_StarEqual,
  #[token("/=")]
  Op_SlashEqual,
  #[token("%=")]
  Op_PercentEqual,
  #[token("**=")]
  Op_StarStarEqual,
  #[token("//=")]
  Op_SlashSlashEqual,
  #[token("&=")]
  Op_AmpEqual,
  #[token("|=")]
  Op_PipeEqual,
  #[token("^=")]
  Op_CaretEqual,
  #[token("<<=")]
  Op_ShlEqual,
  #[token(">>=")]
  Op_ShrEqual,

  // Comparison operators
  #[token("==")]
  Op_EqualEqual,
  #[token("!=")]
  Op_BangEqual,
  #[token("<=")]
  Op_LessEqual,
  #[token(">=")]
  Op_MoreEqual,
  #[token("<<")]
  Op_Shl,
  #[token(">>")]
  Op_Shr,
  #[token("<")]
  Op_Less,
  #[token(">")]
  Op_More,

  // Arithmetic / bitwise operators
  #[token("+")]
  Op_Plus,
  #[token("-")]
  Op_Minus,
  #[token("**")]
  Op_StarStar,
  #[token("*")]
  Op_Star,
  #[token("//")]
  Op_SlashSlash,
  #[token("/")]
  Op_Slash,
  #[token("%")]
  Op_Percent,
  #[token("&")]
  Op_Amp,
  #[token("|")]
  Op_Pipe,
  #[token("^")]
  Op_Caret,
  #[token("~")]
  Op_Tilde,

  // Literals
  #[token("None")]
  Lit_None,
  #[token("True")]
  #[token("False")]
  Lit_Bool,
  #[regex(r"[0-9]+")]
  Lit_Int,
  #[regex(r"[0-9]+\.[0-9]+")]
  Lit_Float,
  #[regex(r#""([^"\\]|\\.)*""#)]
  #[regex(r"'([^'\\]|\\.)*'")]
  Lit_Str,
  #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
  Lit_Ident,

  #[doc(hidden)]
  #[regex(r"[ \t]+", logos::skip)]
  _Whitespace,
  #[doc(hidden)]
  #[regex(r"#[^\n]*")]
  _Comment,

  #[doc(hidden)]
  #[error]
  _Error,

  /// Synthesized, never produced by the `Logos` regex table: emitted by
  /// [`Lexer::lex`] itself when the indent stack grows.
  Indent,
  /// Synthesized: emitted when the indent stack shrinks.
  Dedent,
  /// Synthesized: emitted at the end of each logical line.
  Newline,
  /// Synthesized: emitted once after the final pending `Dedent`s.
  Eof,
}

impl TokenKind {
  pub fn name(&self) -> &'static str {
    use TokenKind::*;
    match self {
      Kw_Def => "'def'",
      Kw_Return => "'return'",
      Kw_If => "'if'",
      Kw_Elif => "'elif'",
      Kw_Else => "'else'",
      Kw_For => "'for'",
      Kw_While => "'while'",
      Kw_In => "'in'",
      Kw_Pass => "'pass'",
      Brk_ParenL => "'('",
      Brk_ParenR => "')'",
      Brk_SquareL => "'['",
      Brk_SquareR => "']'",
      Tok_Comma => "','",
      Tok_Colon => "':'",
      Op_Equal => "'='",
      Op_PlusEqual => "'+='",
      Op_MinusEqual => "'-='",
      Op_StarEqual => "'*='",
      Op_SlashEqual => "'/='",
      Op_PercentEqual => "'%='",
      Op_StarStarEqual => "'**='",
      Op_SlashSlashEqual => "'//='",
      Op_AmpEqual => "'&='",
      Op_PipeEqual => "'|='",
      Op_CaretEqual => "'^='",
      Op_ShlEqual => "'<<='",
      Op_ShrEqual => "'>>='",
      Op_EqualEqual => "'=='",
      Op_BangEqual => "'!='",
      Op_LessEqual => "'<='",
      Op_MoreEqual => "'>='",
      Op_Shl => "'<<'",
      Op_Shr => "'>>'",
      Op_Less => "'<'",
      Op_More => "'>'",
      Op_Plus => "'+'",
      Op_Minus => "'-'",
      Op_StarStar => "'**'",
      Op_Star => "'*'",
      Op_SlashSlash => "'//'",
      Op_Slash => "'/'",
      Op_Percent => "'%'",
      Op_Amp => "'&'",
      Op_Pipe => "'|'",
      Op_Caret => "'^'",
      Op_Tilde => "'~'",
      Lit_None => "'None'",
      Lit_Bool => "boolean literal",
      Lit_Int => "integer literal",
      Lit_Float => "float literal",
      Lit_Str => "string literal",
      Lit_Ident => "identifier",
      _Whitespace => "whitespace",
      _Comment => "comment",
      _Error => "invalid token",
      Indent => "indent",
      Dedent => "dedent",
      Newline => "newline",
      Eof => "end of file",
    }
  }
}

impl<'src> fmt::Debug for Lexer<'src> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.tokens.fmt(f)
  }
}
