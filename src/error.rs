//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – lexical and syntax errors
//! echo the source line and point at the offending character with a caret,
//! chibicc style. Code generation errors carry no position, only a message.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  /// A character that cannot begin any token.
  #[snafu(display("{source_line}\n{marker} {message}"))]
  Lex {
    source_line: String,
    marker: String,
    message: String,
    loc: usize,
  },

  /// A grammar rule did not find the token it expected.
  #[snafu(display("{source_line}\n{marker} {message}"))]
  Syntax {
    source_line: String,
    marker: String,
    message: String,
    loc: usize,
  },

  /// An assignment target that has no address.
  #[snafu(display("not an lvalue"))]
  NotAnLvalue,

  /// The push/pop bookkeeping of the code generator went out of balance.
  #[snafu(display("internal error: stack depth is {depth} after a statement"))]
  StackImbalance { depth: usize },
}

impl CompileError {
  /// Construct a lexical error anchored at a byte offset in the source.
  pub fn lex(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (source_line, marker) = caret_line(source, loc);
    Self::Lex {
      source_line,
      marker,
      message: message.into(),
      loc,
    }
  }

  /// Construct a syntax error anchored at a byte offset in the source.
  pub fn syntax(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (source_line, marker) = caret_line(source, loc);
    Self::Syntax {
      source_line,
      marker,
      message: message.into(),
      loc,
    }
  }

  /// Byte offset the diagnostic points at, if it has one.
  pub fn loc(&self) -> Option<usize> {
    match self {
      Self::Lex { loc, .. } | Self::Syntax { loc, .. } => Some(*loc),
      Self::NotAnLvalue | Self::StackImbalance { .. } => None,
    }
  }

  /// The bare message without the source excerpt.
  pub fn message(&self) -> String {
    match self {
      Self::Lex { message, .. } | Self::Syntax { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }
}

fn caret_line(source: &str, loc: usize) -> (String, String) {
  let mut safe_loc = loc.min(source.len());
  while !source.is_char_boundary(safe_loc) {
    safe_loc -= 1;
  }
  let char_offset = source[..safe_loc].chars().count();
  (source.to_string(), format!("{}^", " ".repeat(char_offset)))
}
