mod cache;
mod config;
mod evaluate;
mod evaluator;
mod parse;
mod shield;
mod types;

pub use cache::ExpressionCache;
pub use config::{Config, DEFAULT_BYPASS_PARAM, DEFAULT_CACHE_SIZE};
pub use evaluator::RuleEvaluator;
pub use parse::ParseError;
pub use shield::{AdmissionRequest, Decision, RejectKind, Rejection, Shield};
pub use types::{
    AnalysisViews, CompareOp, ConfigError, EvalContext, EvalError, EvaluationResult, Expr, Rule,
    RuntimeError, StatsObject, Value,
};
