//! Visibility and disabled conditions for Formwork forms.
//!
//! A condition is a small boolean expression such as
//! `type == "image" && __locale in ["en", "de"]`, evaluated against a
//! context object built from the sibling data of the field plus whatever the
//! registered [`ConditionDataProvider`]s contribute.
//!
//! Parsing can fail and is reported as a [`ConditionError`]. Evaluation
//! never fails: unknown names and missing properties are `null`, and type
//! mismatches simply compare unequal.

pub mod ast;
pub mod context;
pub mod error;
pub mod eval;
pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr};
pub use context::{
    ConditionDataProvider, ConditionDataProviderRegistry, ConditionScope, LOCALE_KEY, PARENT_KEY,
    ParentProvider,
};
pub use error::{ConditionError, ConditionResult};
pub use eval::{evaluate, truthy};
pub use evaluator::ConditionEvaluator;
pub use lexer::{LexError, Lexer, Token};
pub use parser::{ParseError, Parser, parse};
