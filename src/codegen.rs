//! Code generation: lower the parsed AST into Intel-syntax x86-64 assembly.
//!
//! The emitter is a simple stack machine around `rax`: every expression
//! leaves its value in `rax`, and binary operators stage their right operand
//! on the machine stack while the left one is computed. Locals live in the
//! stack frame and are addressed relative to `rbp`.

use snafu::ensure;
use tracing::debug;

use crate::config::Config;
use crate::error::{CompileResult, NotAnLvalueSnafu, StackImbalanceSnafu};
use crate::parser::{AstNode, BinaryOp, Function, Stmt};

const SLOT_SIZE: i64 = 8;
const STACK_ALIGN: i64 = 16;
const RETURN_LABEL: &str = ".L.return";

/// Lay out the frame, then emit assembly for the whole program.
pub fn generate(func: &mut Function, config: &Config) -> CompileResult<String> {
  assign_lvar_offsets(func);
  debug!(
    locals = func.locals.len(),
    stack_size = func.stack_size,
    "laid out stack frame"
  );

  let mut cg = Codegen::new(func);
  cg.emit(&format!(".global {}", config.entry_symbol));
  cg.emit(&format!("{}:", config.entry_symbol));

  cg.emit_ins("push rbp");
  cg.emit_ins("mov rbp, rsp");
  if func.stack_size > 0 {
    cg.emit_ins(&format!("sub rsp, {}", func.stack_size));
  }

  for stmt in &func.body {
    cg.gen_stmt(stmt)?;
    ensure!(cg.depth == 0, StackImbalanceSnafu { depth: cg.depth });
  }

  cg.emit(&format!("{RETURN_LABEL}:"));
  cg.emit_ins("mov rsp, rbp");
  cg.emit_ins("pop rbp");
  cg.emit_ins("ret");

  debug!(bytes = cg.asm.len(), "emitted assembly");
  Ok(cg.asm)
}

/// Give every local its own 8-byte slot below `rbp`, in declaration order,
/// and size the frame to keep `rsp` 16-byte aligned.
pub fn assign_lvar_offsets(func: &mut Function) {
  let mut offset = 0;
  for var in &mut func.locals {
    offset += SLOT_SIZE;
    var.offset = -offset;
  }
  func.stack_size = align_to(offset, STACK_ALIGN);
}

/// Round `n` up to the nearest multiple of `align`.
pub fn align_to(n: i64, align: i64) -> i64 {
  (n + align - 1) / align * align
}

struct Codegen<'a> {
  func: &'a Function,
  asm: String,
  /// Values currently pushed by expression evaluation.
  depth: usize,
}

impl<'a> Codegen<'a> {
  fn new(func: &'a Function) -> Self {
    let mut asm = String::new();
    asm.push_str(".intel_syntax noprefix\n");
    Self {
      func,
      asm,
      depth: 0,
    }
  }

  fn emit(&mut self, line: &str) {
    self.asm.push_str(line);
    self.asm.push('\n');
  }

  fn emit_ins(&mut self, ins: &str) {
    self.asm.push_str("    ");
    self.emit(ins);
  }

  fn push(&mut self) {
    self.emit_ins("push rax");
    self.depth += 1;
  }

  fn pop(&mut self, reg: &str) {
    self.emit_ins(&format!("pop {reg}"));
    self.depth -= 1;
  }

  fn gen_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
    match stmt {
      Stmt::Expr(node) => self.gen_expr(node),
      Stmt::Return(node) => {
        self.gen_expr(node)?;
        self.emit_ins(&format!("jmp {RETURN_LABEL}"));
        Ok(())
      }
      Stmt::Block(body) => body.iter().try_for_each(|stmt| self.gen_stmt(stmt)),
    }
  }

  /// Load the address of an lvalue into `rax`.
  fn gen_addr(&mut self, node: &AstNode) -> CompileResult<()> {
    match node {
      AstNode::Var { obj } => {
        let offset = self.func.locals[*obj].offset;
        self.emit_ins(&format!("lea rax, [rbp{offset:+}]"));
        Ok(())
      }
      _ => NotAnLvalueSnafu.fail(),
    }
  }

  /// Emit code leaving the value of `node` in `rax`.
  fn gen_expr(&mut self, node: &AstNode) -> CompileResult<()> {
    match node {
      AstNode::Num { value } => {
        self.emit_ins(&format!("mov rax, {value}"));
        Ok(())
      }
      AstNode::Var { .. } => {
        self.gen_addr(node)?;
        self.emit_ins("mov rax, [rax]");
        Ok(())
      }
      AstNode::Assign { lhs, rhs } => {
        self.gen_addr(lhs)?;
        self.push();
        self.gen_expr(rhs)?;
        self.pop("rdi");
        self.emit_ins("mov [rdi], rax");
        Ok(())
      }
      AstNode::Binary { op, lhs, rhs } => {
        // Right first, so popping it into `rdi` leaves `rax op rdi` in source order.
        self.gen_expr(rhs)?;
        self.push();
        self.gen_expr(lhs)?;
        self.pop("rdi");
        self.gen_binary(*op);
        Ok(())
      }
    }
  }

  fn gen_binary(&mut self, op: BinaryOp) {
    match op {
      BinaryOp::Add => self.emit_ins("add rax, rdi"),
      BinaryOp::Sub => self.emit_ins("sub rax, rdi"),
      BinaryOp::Mul => self.emit_ins("imul rax, rdi"),
      BinaryOp::Div => {
        self.emit_ins("cqo");
        self.emit_ins("idiv rdi");
      }
      BinaryOp::Eq => self.gen_cmp("sete"),
      BinaryOp::Ne => self.gen_cmp("setne"),
      BinaryOp::Lt => self.gen_cmp("setl"),
      BinaryOp::Le => self.gen_cmp("setle"),
    }
  }

  fn gen_cmp(&mut self, set: &str) {
    self.emit_ins("cmp rax, rdi");
    self.emit_ins(&format!("{set} al"));
    self.emit_ins("movzx rax, al");
  }
}
