//! Tree-walking evaluation over JSON values.

use serde_json::Value;
use std::cmp::Ordering;

use crate::ast::{BinaryOp, Expr};

/// Evaluates `expr` against `context`. Never fails.
#[must_use]
pub fn evaluate(expr: &Expr, context: &Value) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Ident(name) => context.get(name).cloned().unwrap_or(Value::Null),
        Expr::Array(items) => Value::Array(items.iter().map(|item| evaluate(item, context)).collect()),
        Expr::Access { target, key } => {
            let target = evaluate(target, context);
            let key = evaluate(key, context);
            access(&target, &key)
        }
        Expr::Not(inner) => Value::Bool(!truthy(&evaluate(inner, context))),
        Expr::Neg(inner) => match evaluate(inner, context).as_f64() {
            Some(n) => serde_json::Number::from_f64(-n).map_or(Value::Null, Value::Number),
            None => Value::Null,
        },
        Expr::Binary { op, left, right } => binary(*op, left, right, context),
    }
}

fn binary(op: BinaryOp, left: &Expr, right: &Expr, context: &Value) -> Value {
    let lhs = evaluate(left, context);
    // Logical operators short-circuit and yield the deciding operand.
    match op {
        BinaryOp::And if !truthy(&lhs) => return lhs,
        BinaryOp::Or if truthy(&lhs) => return lhs,
        BinaryOp::And | BinaryOp::Or => return evaluate(right, context),
        _ => {}
    }

    let rhs = evaluate(right, context);
    let result = match op {
        BinaryOp::Eq => loose_eq(&lhs, &rhs),
        BinaryOp::Ne => !loose_eq(&lhs, &rhs),
        BinaryOp::Lt => compare(&lhs, &rhs) == Some(Ordering::Less),
        BinaryOp::Le => matches!(compare(&lhs, &rhs), Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => compare(&lhs, &rhs) == Some(Ordering::Greater),
        BinaryOp::Ge => matches!(compare(&lhs, &rhs), Some(Ordering::Greater | Ordering::Equal)),
        BinaryOp::In => contains(&rhs, &lhs),
        BinaryOp::And => truthy(&lhs) && truthy(&rhs),
        BinaryOp::Or => truthy(&lhs) || truthy(&rhs),
    };
    Value::Bool(result)
}

fn access(target: &Value, key: &Value) -> Value {
    let found = match (target, key) {
        (Value::Object(map), Value::String(name)) => map.get(name),
        (Value::Array(items), Value::Number(n)) => n
            .as_u64()
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| items.get(index)),
        (Value::Array(items), Value::String(name)) if name == "length" => {
            return Value::from(items.len());
        }
        (Value::String(s), Value::String(name)) if name == "length" => {
            return Value::from(s.chars().count());
        }
        _ => None,
    };
    found.cloned().unwrap_or(Value::Null)
}

/// JavaScript truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
/// Arrays and objects are truthy even when empty.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Equality with numbers compared by value, so `1 == 1.0`.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Orders numbers numerically and strings lexicographically. Anything else
/// is unordered, so every relational comparison on it is false.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// `needle in haystack`: array membership, substring, or object key.
fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Array(items), _) => items.iter().any(|item| loose_eq(item, needle)),
        (Value::String(s), Value::String(part)) => s.contains(part.as_str()),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}
