use thiserror::Error;

use crate::parse::ParseError;

use super::expr::CompareOp;

/// Errors raised while loading or validating configuration. Fatal at
/// startup; a misconfigured rule never silently becomes a no-op.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule 'name' is required and cannot be blank")]
    BlankRuleName,

    #[error("rule '{rule}': 'expression' is required and cannot be blank")]
    BlankRuleExpression { rule: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while evaluating a compiled expression against a context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("cannot invoke method '{method}' on null")]
    MethodOnNull { method: String },

    #[error("unknown method '{method}' on {target}")]
    UnknownMethod {
        target: &'static str,
        method: String,
    },

    #[error("{target} has no member '{member}'")]
    NoMembers {
        target: &'static str,
        member: String,
    },

    #[error("cannot index into {target}")]
    NotIndexable { target: &'static str },

    #[error("cannot compare {left} {op} {right}")]
    InvalidComparison {
        left: &'static str,
        op: CompareOp,
        right: &'static str,
    },
}

/// Failure of one rule-evaluation call: the expression either failed to
/// compile or raised at evaluation time. Both are fatal to the containing
/// request when the gate expression is affected.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Compile(#[from] ParseError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
