use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

use crate::ast::Expr;
use crate::error::{ConditionError, ConditionResult};
use crate::eval::{evaluate, truthy};
use crate::parser::parse;

/// Evaluates condition strings, caching each compiled expression by its
/// source text.
#[derive(Default)]
pub struct ConditionEvaluator {
    cache: RefCell<HashMap<String, Rc<Expr>>>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `source`, or returns the cached expression.
    pub fn compile(&self, source: &str) -> ConditionResult<Rc<Expr>> {
        if let Some(expr) = self.cache.borrow().get(source) {
            return Ok(Rc::clone(expr));
        }
        let expr = Rc::new(parse(source).map_err(|source_error| ConditionError::Parse {
            expression: source.to_string(),
            source: source_error,
        })?);
        debug!(expression = source, "Compiled condition");
        self.cache
            .borrow_mut()
            .insert(source.to_string(), Rc::clone(&expr));
        Ok(expr)
    }

    /// Evaluates `source` against `context` and applies truthiness.
    pub fn evaluate(&self, source: &str, context: &Value) -> ConditionResult<bool> {
        let expr = self.compile(source)?;
        Ok(truthy(&evaluate(&expr, context)))
    }

    /// A missing condition means visible.
    pub fn is_visible(&self, condition: Option<&str>, context: &Value) -> ConditionResult<bool> {
        condition.map_or(Ok(true), |source| self.evaluate(source, context))
    }

    /// A missing condition means enabled.
    pub fn is_disabled(&self, condition: Option<&str>, context: &Value) -> ConditionResult<bool> {
        condition.map_or(Ok(false), |source| self.evaluate(source, context))
    }

    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}
