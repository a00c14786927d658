//! Recursive-descent parser producing a statement list and expression AST.
//!
//! The parser mirrors the classic chibicc structure: we maintain a
//! precedence-climbing set of helpers and expose a thin statement layer so
//! sequencing lives outside the expression tree. Local variables are
//! collected into a parse context that every rule threads through, and
//! end up in the returned [`Function`].

use tracing::{debug, trace};

use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Binary operators recognised by the language.
///
/// `>` and `>=` have no variant of their own: the parser swaps the operands
/// and emits `Lt`/`Le` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  /// Reference to `Function::locals[obj]`.
  Var {
    obj: usize,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  Assign {
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn var(obj: usize) -> Self {
    Self::Var { obj }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn assign(lhs: AstNode, rhs: AstNode) -> Self {
    Self::Assign {
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
  Expr(AstNode),
  Return(AstNode),
  Block(Vec<Stmt>),
}

/// A local variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obj {
  pub name: String,
  /// Offset from `rbp`; zero until the frame layout has been computed.
  pub offset: i64,
}

/// The compiled unit: top-level statements plus every local they mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
  pub body: Vec<Stmt>,
  pub locals: Vec<Obj>,
  pub stack_size: i64,
}

/// Parse a whole program from the token stream.
///
/// A program is either a single `{ ... }` block or a bare sequence of
/// statements; in both cases it must be followed by the end of input.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Function> {
  let mut ctx = ParseContext::new(TokenStream::new(tokens, source));

  if ctx.stream.is_eof() {
    return Err(CompileError::syntax(source, 0, "program is empty"));
  }

  let body = if ctx.stream.equal("{") {
    let block = parse_compound_stmt(&mut ctx)?;
    if let Some(token) = ctx.stream.peek()
      && token.kind != TokenKind::Eof
    {
      let got = describe_token(Some(token), source);
      return Err(CompileError::syntax(
        source,
        token.loc,
        format!("extra token \"{got}\""),
      ));
    }
    vec![block]
  } else {
    let mut body = Vec::new();
    while !ctx.stream.is_eof() {
      body.push(parse_stmt(&mut ctx)?);
    }
    body
  };

  debug!(
    statements = body.len(),
    locals = ctx.locals.len(),
    "parsed program"
  );

  Ok(Function {
    body,
    locals: ctx.locals,
    stack_size: 0,
  })
}

/// Mutable state shared by every grammar rule.
struct ParseContext<'a> {
  stream: TokenStream<'a>,
  locals: Vec<Obj>,
}

impl<'a> ParseContext<'a> {
  fn new(stream: TokenStream<'a>) -> Self {
    Self {
      stream,
      locals: Vec::new(),
    }
  }

  fn find_var(&self, name: &str) -> Option<usize> {
    self.locals.iter().position(|var| var.name == name)
  }

  /// Resolve `name`, binding a fresh local on first mention.
  fn var_index(&mut self, name: &str) -> usize {
    if let Some(idx) = self.find_var(name) {
      return idx;
    }
    trace!(var = name, index = self.locals.len(), "new local");
    self.locals.push(Obj {
      name: name.to_string(),
      offset: 0,
    });
    self.locals.len() - 1
  }
}

// stmt = "return" expr ";" | "{" compound-stmt | expr ";"
fn parse_stmt(ctx: &mut ParseContext) -> CompileResult<Stmt> {
  if ctx.stream.equal("return") {
    let expr = parse_expr(ctx)?;
    ctx.stream.skip(";")?;
    return Ok(Stmt::Return(expr));
  }

  if ctx.stream.equal("{") {
    return parse_compound_stmt(ctx);
  }

  parse_expr_stmt(ctx)
}

// compound-stmt = stmt* "}"
fn parse_compound_stmt(ctx: &mut ParseContext) -> CompileResult<Stmt> {
  let mut body = Vec::new();
  while !ctx.stream.equal("}") {
    body.push(parse_stmt(ctx)?);
  }
  Ok(Stmt::Block(body))
}

fn parse_expr_stmt(ctx: &mut ParseContext) -> CompileResult<Stmt> {
  let expr = parse_expr(ctx)?;
  ctx.stream.skip(";")?;
  Ok(Stmt::Expr(expr))
}

fn parse_expr(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  parse_assign(ctx)
}

// Right-associative: `a = b = 3` is `a = (b = 3)`.
fn parse_assign(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  let node = parse_equality(ctx)?;

  if ctx.stream.equal("=") {
    let rhs = parse_assign(ctx)?;
    return Ok(AstNode::assign(node, rhs));
  }

  Ok(node)
}

fn parse_equality(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  let mut node = parse_relational(ctx)?;

  loop {
    let op = match ctx.stream.peek_reserved() {
      Some("==") => BinaryOp::Eq,
      Some("!=") => BinaryOp::Ne,
      _ => break,
    };

    ctx.stream.advance();
    let rhs = parse_relational(ctx)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_relational(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  let mut node = parse_add(ctx)?;

  loop {
    // The bool marks the mirrored forms, which swap their operands.
    let (op, swap) = match ctx.stream.peek_reserved() {
      Some("<") => (BinaryOp::Lt, false),
      Some("<=") => (BinaryOp::Le, false),
      Some(">") => (BinaryOp::Lt, true),
      Some(">=") => (BinaryOp::Le, true),
      _ => break,
    };

    ctx.stream.advance();
    let rhs = parse_add(ctx)?;
    node = if swap {
      AstNode::binary(op, rhs, node)
    } else {
      AstNode::binary(op, node, rhs)
    };
  }

  Ok(node)
}

fn parse_add(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  let mut node = parse_mul(ctx)?;

  loop {
    let op = match ctx.stream.peek_reserved() {
      Some("+") => BinaryOp::Add,
      Some("-") => BinaryOp::Sub,
      _ => break,
    };

    ctx.stream.advance();
    let rhs = parse_mul(ctx)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_mul(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  let mut node = parse_unary(ctx)?;

  loop {
    let op = match ctx.stream.peek_reserved() {
      Some("*") => BinaryOp::Mul,
      Some("/") => BinaryOp::Div,
      _ => break,
    };

    ctx.stream.advance();
    let rhs = parse_unary(ctx)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_unary(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  if ctx.stream.equal("+") {
    return parse_unary(ctx);
  }

  if ctx.stream.equal("-") {
    let operand = parse_unary(ctx)?;
    return Ok(AstNode::binary(BinaryOp::Sub, AstNode::number(0), operand));
  }

  parse_primary(ctx)
}

fn parse_primary(ctx: &mut ParseContext) -> CompileResult<AstNode> {
  if ctx.stream.equal("(") {
    let node = parse_expr(ctx)?;
    ctx.stream.skip(")")?;
    return Ok(node);
  }

  if let Some(name) = ctx.stream.get_ident() {
    let obj = ctx.var_index(name);
    return Ok(AstNode::var(obj));
  }

  if let Some(value) = ctx.stream.get_number() {
    return Ok(AstNode::number(value));
  }

  Err(ctx.stream.error_here("expected an expression"))
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Text of the current token if it is a keyword or punctuator.
  fn peek_reserved(&self) -> Option<&'a str> {
    self
      .peek()
      .filter(|token| token.kind == TokenKind::Reserved)
      .map(|token| token_text(token, self.source))
  }

  fn advance(&mut self) {
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
  }

  /// Consume the current token if it matches the provided keyword or punctuator.
  fn equal(&mut self, op: &str) -> bool {
    if self.peek_reserved() == Some(op) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      Ok(())
    } else {
      Err(self.error_here(&format!("expected \"{s}\"")))
    }
  }

  /// Consume the current token if it is an integer literal.
  fn get_number(&mut self) -> Option<i64> {
    let token = self.peek().filter(|token| token.kind == TokenKind::Num)?;
    let value = token.value?;
    self.pos += 1;
    Some(value)
  }

  /// Consume the current token if it is an identifier.
  fn get_ident(&mut self) -> Option<&'a str> {
    let token = self.peek().filter(|token| token.kind == TokenKind::Ident)?;
    let name = token_text(token, self.source);
    self.pos += 1;
    Some(name)
  }

  /// Build a syntax error pointing at the current token.
  fn error_here(&self, expected: &str) -> CompileError {
    let (loc, got) = match self.peek() {
      Some(token) => (token.loc, describe_token(Some(token), self.source)),
      None => (self.source.len(), "EOF".to_string()),
    };
    CompileError::syntax(self.source, loc, format!("{expected}, but got \"{got}\""))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }
}
