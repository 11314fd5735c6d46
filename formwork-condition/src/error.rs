use thiserror::Error;

use crate::parser::ParseError;

pub type ConditionResult<T> = Result<T, ConditionError>;

#[derive(Debug, Error)]
pub enum ConditionError {
    /// The expression could not be parsed. Always a metadata bug.
    #[error("invalid condition {expression:?}: {source}")]
    Parse {
        expression: String,
        #[source]
        source: ParseError,
    },
}
