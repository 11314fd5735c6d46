use formwork_condition::{BinaryOp, Expr, ParseError, Token, parse};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn ident(name: &str) -> Expr {
    Expr::Ident(name.to_string())
}

fn lit(value: Value) -> Expr {
    Expr::Literal(value)
}

fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn access(target: Expr, key: Expr) -> Expr {
    Expr::Access {
        target: Box::new(target),
        key: Box::new(key),
    }
}

// ── Precedence ───────────────────────────────────────────────────

#[test]
fn and_binds_tighter_than_or() {
    assert_eq!(
        parse("a || b && c").unwrap(),
        bin(BinaryOp::Or, ident("a"), bin(BinaryOp::And, ident("b"), ident("c")))
    );
}

#[test]
fn comparison_binds_tighter_than_and() {
    assert_eq!(
        parse("type == 'image' && size > 2").unwrap(),
        bin(
            BinaryOp::And,
            bin(BinaryOp::Eq, ident("type"), lit(json!("image"))),
            bin(BinaryOp::Gt, ident("size"), lit(json!(2)))
        )
    );
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(
        parse("(a || b) && c").unwrap(),
        bin(BinaryOp::And, bin(BinaryOp::Or, ident("a"), ident("b")), ident("c"))
    );
}

#[test]
fn not_applies_to_the_nearest_operand() {
    assert_eq!(
        parse("!a == b").unwrap(),
        bin(BinaryOp::Eq, Expr::Not(Box::new(ident("a"))), ident("b"))
    );
}

// ── Operands ─────────────────────────────────────────────────────

#[test]
fn literals() {
    assert_eq!(parse("true").unwrap(), lit(json!(true)));
    assert_eq!(parse("null").unwrap(), lit(Value::Null));
    assert_eq!(parse("1.5").unwrap(), lit(json!(1.5)));
    assert_eq!(parse("\"x\"").unwrap(), lit(json!("x")));
    assert_eq!(parse("-3").unwrap(), Expr::Neg(Box::new(lit(json!(3)))));
}

#[test]
fn member_access_chains() {
    assert_eq!(
        parse("__parent.blocks[0]['title']").unwrap(),
        access(
            access(access(ident("__parent"), lit(json!("blocks"))), lit(json!(0))),
            lit(json!("title"))
        )
    );
}

#[test]
fn in_with_array_literal() {
    assert_eq!(
        parse("__locale in ['en', 'de']").unwrap(),
        bin(
            BinaryOp::In,
            ident("__locale"),
            Expr::Array(vec![lit(json!("en")), lit(json!("de"))])
        )
    );
    assert_eq!(parse("[]").unwrap(), Expr::Array(vec![]));
}

// ── Errors ───────────────────────────────────────────────────────

#[test]
fn rejects_malformed_input() {
    assert_eq!(parse(""), Err(ParseError::Empty));
    assert_eq!(parse("   "), Err(ParseError::Empty));
    assert!(matches!(parse("a ==").unwrap_err(), ParseError::Unexpected(Token::Eof, _)));
    assert!(matches!(parse("(a").unwrap_err(), ParseError::Unexpected(Token::Eof, "')'")));
    assert!(matches!(parse("a b").unwrap_err(), ParseError::Unexpected(Token::Ident(_), _)));
    assert!(matches!(parse("[1 2]").unwrap_err(), ParseError::Unexpected(Token::Num(_), _)));
    assert!(matches!(parse("a.1").unwrap_err(), ParseError::Unexpected(Token::Num(_), _)));
    assert!(matches!(parse("a = 1").unwrap_err(), ParseError::Lex(_)));
}
