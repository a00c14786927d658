//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about semantics
//! beyond recognising punctuators, identifiers and numeric literals.
//! Multi-character punctuators are matched before single-character ones to
//! avoid ambiguity, and keywords are reclassified in a separate pass.

use tracing::{debug, trace};

use crate::error::{CompileError, CompileResult};

const KEYWORDS: [&str; 1] = ["return"];

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  /// Keywords and punctuators.
  Reserved,
  Ident,
  Num,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<i64>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize, value: Option<i64>) -> Self {
    Self {
      kind,
      value,
      loc,
      len,
    }
  }
}

fn is_ident1(c: u8) -> bool {
  c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident2(c: u8) -> bool {
  is_ident1(c) || c.is_ascii_digit()
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      let mut value: i64 = 0;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        // Out-of-range literals wrap instead of failing.
        value = value
          .wrapping_mul(10)
          .wrapping_add(i64::from(bytes[i] - b'0'));
        i += 1;
      }
      tokens.push(Token::new(TokenKind::Num, start, i - start, Some(value)));
      continue;
    }

    if is_ident1(c) {
      let start = i;
      i += 1;
      while i < bytes.len() && is_ident2(bytes[i]) {
        i += 1;
      }
      tokens.push(Token::new(TokenKind::Ident, start, i - start, None));
      continue;
    }

    if let Some(op) = ["==", "!=", "<=", ">="]
      .into_iter()
      .find(|op| input[i..].starts_with(op))
    {
      tokens.push(Token::new(TokenKind::Reserved, i, op.len(), None));
      i += op.len();
      continue;
    }

    if c.is_ascii_punctuation() {
      tokens.push(Token::new(TokenKind::Reserved, i, 1, None));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lex(
      input,
      i,
      format!("invalid token: '{invalid_char}'"),
    ));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, None));
  convert_keywords(&mut tokens, input);

  debug!(count = tokens.len(), "tokenized input");
  for token in &tokens {
    trace!(kind = ?token.kind, loc = token.loc, text = token_text(token, input), "token");
  }
  Ok(tokens)
}

fn convert_keywords(tokens: &mut [Token], source: &str) {
  for token in tokens
    .iter_mut()
    .filter(|token| token.kind == TokenKind::Ident)
  {
    if KEYWORDS.contains(&token_text(token, source)) {
      token.kind = TokenKind::Reserved;
    }
  }
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}
