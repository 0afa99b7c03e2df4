use clap::Parser;
use staticpy_cli::commands::Cli;

fn main() -> std::process::ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  match cli.execute() {
    Ok(()) => std::process::ExitCode::SUCCESS,
    Err(failure) => {
      failure.report();
      std::process::ExitCode::from(failure.exit_code() as u8)
    }
  }
}
