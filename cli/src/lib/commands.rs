use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::common::InputArgs;

/// The flat argument set spec.md §6 describes: one input, an optional
/// output path, an optimization level, and three mutually-independent dump
/// flags. There is no subcommand here (unlike the teacher's `run` /
/// `disassemble` / `repl` split) because the whole driver surface is a
/// single batch invocation: read one file, write one file.
#[derive(Clone, Debug, Parser)]
#[command(name = "staticpyc", version)]
pub struct Cli {
  #[command(flatten)]
  pub input: InputArgs,

  /// Where to write the generated assembly. Defaults to standard output.
  #[arg(short = 'o', long = "output", value_name = "FILE")]
  pub output: Option<PathBuf>,

  /// Optimization level.
  #[arg(short = 'O', long = "opt", value_name = "LEVEL", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
  pub opt_level: u8,

  /// Print the parsed AST instead of compiling.
  #[arg(long)]
  pub dump_ast: bool,

  /// Print the token stream instead of compiling.
  #[arg(long)]
  pub dump_tokens: bool,

  /// Print the (optimized, if `-O` > 0) IR instead of emitting assembly.
  #[arg(long)]
  pub dump_ir: bool,
}

/// Distinguishes "your program is wrong" from "the filesystem is wrong" so
/// `main` can map each to its own exit code.
pub enum Failure {
  Diagnostics(Vec<String>),
  Io(anyhow::Error),
}

impl Failure {
  pub fn exit_code(&self) -> i32 {
    match self {
      Failure::Diagnostics(_) => 1,
      Failure::Io(_) => 2,
    }
  }

  pub fn report(&self) {
    match self {
      Failure::Diagnostics(reports) => {
        for report in reports {
          eprintln!("{report}");
        }
      }
      Failure::Io(e) => eprintln!("error: {e:#}"),
    }
  }
}

impl Cli {
  pub fn execute(self) -> Result<(), Failure> {
    let span = tracing::debug_span!("cli", opt_level = self.opt_level);
    let _enter = span.enter();

    let source = self.input.source().map_err(Failure::Io)?;
    let name = self.input.name();
    let color = self.output.is_none() && atty::is(atty::Stream::Stdout);
    let compiler = staticpy::Transpiler { color };
    let opt_level = self.opt_level as usize;

    let text = if self.dump_tokens {
      compiler.dump_tokens(&name, &source)
    } else if self.dump_ast {
      compiler.dump_ast(&name, &source)
    } else if self.dump_ir {
      compiler.dump_ir(&name, &source, opt_level)
    } else {
      compiler.transpile(&name, &source, opt_level)
    }
    .map_err(Failure::Diagnostics)?;

    self.write_output(&text).map_err(Failure::Io)
  }

  fn write_output(&self, text: &str) -> anyhow::Result<()> {
    match &self.output {
      Some(path) => {
        std::fs::write(path, text).with_context(|| format!("failed to write output file at {}", path.display()))
      }
      None => write!(std::io::stdout(), "{text}").context("failed to write to stdout"),
    }
  }
}
