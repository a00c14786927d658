//! End-to-end tests of the public pipeline: source text in, assembly or a
//! diagnostic out.

use stackcc::parser::{AstNode, BinaryOp, Stmt, parse};
use stackcc::tokenizer::tokenize;
use stackcc::{CompileError, Config, generate_assembly, generate_assembly_with};

#[test]
fn single_number_produces_full_listing() {
  let asm = generate_assembly("42;").unwrap();
  assert_eq!(
    asm,
    "\
.intel_syntax noprefix
.global main
main:
    push rbp
    mov rbp, rsp
    mov rax, 42
.L.return:
    mov rsp, rbp
    pop rbp
    ret
"
  );
}

#[test]
fn locals_reserve_an_aligned_frame() {
  let asm = generate_assembly("a=1; b=2; c=3;").unwrap();
  assert!(asm.contains("    sub rsp, 32\n"));
  assert!(asm.contains("lea rax, [rbp-24]"));
  assert!(!asm.contains("rbp-32"));
}

#[test]
fn greater_than_compiles_like_mirrored_less_than() {
  assert_eq!(
    generate_assembly("3>7;").unwrap(),
    generate_assembly("7<3;").unwrap()
  );
  assert_eq!(
    generate_assembly("a; b; a>=b;").unwrap(),
    generate_assembly("a; b; b<=a;").unwrap()
  );
}

#[test]
fn variable_keeps_one_slot_across_statements() {
  let asm = generate_assembly("x=1; x=x+1; return x;").unwrap();
  assert_eq!(asm.matches("lea rax, [rbp-8]").count(), 4);
  assert!(!asm.contains("rbp-16"));
  assert!(asm.contains("    sub rsp, 16\n"));
}

#[test]
fn braced_and_bare_programs_generate_the_same_code() {
  assert_eq!(
    generate_assembly("{ a=1; return a; }").unwrap(),
    generate_assembly("a=1; return a;").unwrap()
  );
}

#[test]
fn chained_assignment_parses_to_nested_assign() {
  let source = "a=b=3;";
  let func = parse(tokenize(source).unwrap(), source).unwrap();
  assert_eq!(
    func.body,
    vec![Stmt::Expr(AstNode::assign(
      AstNode::var(0),
      AstNode::assign(AstNode::var(1), AstNode::number(3))
    ))]
  );
}

#[test]
fn unary_minus_is_zero_minus_operand() {
  let source = "-x;";
  let func = parse(tokenize(source).unwrap(), source).unwrap();
  assert_eq!(
    func.body,
    vec![Stmt::Expr(AstNode::binary(
      BinaryOp::Sub,
      AstNode::number(0),
      AstNode::var(0)
    ))]
  );
}

#[test]
fn division_by_zero_is_not_a_compile_error() {
  let asm = generate_assembly("1/0;").unwrap();
  assert!(asm.contains("    idiv rdi\n"));
}

#[test]
fn custom_entry_symbol() {
  let config = Config {
    entry_symbol: "_main".to_string(),
  };
  let asm = generate_assembly_with("0;", &config).unwrap();
  assert!(asm.contains(".global _main\n_main:\n"));
  assert!(!asm.contains(".global main\n"));
}

#[test]
fn invalid_character_is_a_lexical_error() {
  let err = generate_assembly("1 € 2;").unwrap_err();
  assert!(matches!(err, CompileError::Lex { loc: 2, .. }));
  assert_eq!(err.to_string(), "1 € 2;\n  ^ invalid token: '€'");
}

#[test]
fn unknown_punctuation_is_a_syntax_error() {
  let err = generate_assembly("1 @ 2;").unwrap_err();
  assert!(matches!(err, CompileError::Syntax { loc: 2, .. }));
  assert_eq!(err.message(), "expected \";\", but got \"@\"");
}

#[test]
fn dangling_operator_is_a_syntax_error() {
  let err = generate_assembly("1 + ").unwrap_err();
  assert!(matches!(err, CompileError::Syntax { loc: 4, .. }));
  assert_eq!(
    err.to_string(),
    "1 + \n    ^ expected an expression, but got \"EOF\""
  );
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
  let err = generate_assembly("1+1").unwrap_err();
  assert_eq!(err.to_string(), "1+1\n   ^ expected \";\", but got \"EOF\"");
}

#[test]
fn trailing_input_after_block_is_an_extra_token() {
  let err = generate_assembly("{ return 1; } }").unwrap_err();
  assert_eq!(err.loc(), Some(14));
  assert_eq!(err.message(), "extra token \"}\"");
}

#[test]
fn assigning_to_an_rvalue_is_rejected() {
  let err = generate_assembly("a+1=2;").unwrap_err();
  assert!(matches!(err, CompileError::NotAnLvalue));
  assert_eq!(err.to_string(), "not an lvalue");
}
