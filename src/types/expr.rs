use std::fmt;

use super::Value;

/// Comparison operators supported in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Parsed expression AST. Produced by the parser, cached behind `Arc`, and
/// walked by the evaluator; immutable and safe to share across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value (`null`, `true`, `42`, `1.5`, `"text"`).
    Literal(Value),
    /// A named context binding (`query`, `filters`, `total`).
    Ident(String),
    /// Member access: `base.name`.
    Member(Box<Expr>, String),
    /// Zero-argument method invocation: `base.name()`.
    Call(Box<Expr>, String),
    /// Map index lookup by string key: `base["key"]`.
    Index(Box<Expr>, String),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => match v {
                Value::Str(s) => write!(f, "\"{s}\""),
                other => write!(f, "{other}"),
            },
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::Member(base, name) => write!(f, "{base}.{name}"),
            Expr::Call(base, name) => write!(f, "{base}.{name}()"),
            Expr::Index(base, key) => write!(f, "{base}[\"{key}\"]"),
            Expr::Compare(a, op, b) => write!(f, "({a} {op} {b})"),
            Expr::And(a, b) => write!(f, "({a} && {b})"),
            Expr::Or(a, b) => write!(f, "({a} || {b})"),
            Expr::Not(inner) => write!(f, "(!{inner})"),
        }
    }
}
