use std::env;
use std::process;

use stackcc::{Config, generate_assembly_with};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  init_logging();

  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("stackcc");
    eprintln!("usage: {program} <program>");
    process::exit(1);
  }

  let config = Config::from_env();
  debug!(entry = %config.entry_symbol, "compiling");

  match generate_assembly_with(&args[1], &config) {
    Ok(asm) => print!("{asm}"),
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
