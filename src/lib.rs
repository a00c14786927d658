//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns a function AST with locals.
//! - `codegen` lays out the stack frame and lowers the function into
//!   Intel-syntax x86-64 assembly.
//! - `error` centralises reporting utilities shared by the other modules.
//! - `config` holds the few knobs that differ between toolchains.

pub mod config;
pub mod error;
pub mod parser;
pub mod tokenizer;

mod codegen;

pub use config::Config;
pub use error::{CompileError, CompileResult};

/// Compile a source string into assembly with the default settings.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  generate_assembly_with(source, &Config::default())
}

/// Compile a source string into assembly.
pub fn generate_assembly_with(source: &str, config: &Config) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let mut program = parser::parse(tokens, source)?;
  codegen::generate(&mut program, config)
}
