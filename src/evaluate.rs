use crate::types::{EvalContext, Expr, RuntimeError, Value};

/// Evaluate an expression tree against a request context.
///
/// Member access is lenient the way operators expect: reading a missing map
/// key, an unexposed object property, or any member of `null` yields `null`,
/// so absence tests like `filters == null` stay expressible. Method
/// invocation is strict: calling into `null` or an unresolved accessor is a
/// runtime error.
pub(crate) fn eval_expr(expr: &Expr, ctx: &EvalContext) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Ident(name) => Ok(ctx.resolve(name).clone()),
        Expr::Member(base, name) => match eval_expr(base, ctx)? {
            Value::Null => Ok(Value::Null),
            Value::Map(entries) => Ok(entries.get(name).cloned().unwrap_or(Value::Null)),
            Value::Object(obj) => Ok(obj.field(name).unwrap_or(Value::Null)),
            other => Err(RuntimeError::NoMembers {
                target: other.type_name(),
                member: name.clone(),
            }),
        },
        Expr::Call(base, method) => match eval_expr(base, ctx)? {
            Value::Null => Err(RuntimeError::MethodOnNull {
                method: method.clone(),
            }),
            Value::Object(obj) => obj.call(method).ok_or_else(|| RuntimeError::UnknownMethod {
                target: "object",
                method: method.clone(),
            }),
            other => Err(RuntimeError::UnknownMethod {
                target: other.type_name(),
                method: method.clone(),
            }),
        },
        Expr::Index(base, key) => match eval_expr(base, ctx)? {
            Value::Null => Ok(Value::Null),
            Value::Map(entries) => Ok(entries.get(key).cloned().unwrap_or(Value::Null)),
            other => Err(RuntimeError::NotIndexable {
                target: other.type_name(),
            }),
        },
        Expr::Compare(left, op, right) => {
            let lv = eval_expr(left, ctx)?;
            let rv = eval_expr(right, ctx)?;
            lv.compare(*op, &rv)
                .map(Value::Bool)
                .ok_or_else(|| RuntimeError::InvalidComparison {
                    left: lv.type_name(),
                    op: *op,
                    right: rv.type_name(),
                })
        }
        Expr::And(a, b) => {
            if !truthy(&eval_expr(a, ctx)?) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truthy(&eval_expr(b, ctx)?)))
        }
        Expr::Or(a, b) => {
            if truthy(&eval_expr(a, ctx)?) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truthy(&eval_expr(b, ctx)?)))
        }
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval_expr(inner, ctx)?))),
    }
}

/// Coerce a gate result to a boolean: `null` is false, booleans stand, and
/// anything else falls back to a case-insensitive string parse of its
/// rendered form. Operators author rules against this exact policy.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        other => parse_bool(&other.to_string()),
    }
}

pub(crate) fn parse_bool(s: &str) -> bool {
    s.eq_ignore_ascii_case("true")
}
