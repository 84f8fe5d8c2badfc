use winnow::ascii::dec_int;
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::types::{CompareOp, Expr, Value};

// -- Whitespace -------------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

// -- Identifiers ------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

// -- Literals ---------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn negative_number(input: &mut &str) -> ModalResult<Value> {
    let neg_str = (
        '-',
        take_while(1.., |c: char| c.is_ascii_digit() || c == '.'),
    )
        .take()
        .parse_next(input)?;
    if neg_str.contains('.') {
        let f: f64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Float(f))
    } else {
        let i: i64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Int(i))
    }
}

fn float_literal(input: &mut &str) -> ModalResult<f64> {
    // Only match floats that contain a decimal point
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

/// An identifier position: the `null`/`true`/`false` keywords become
/// literals, everything else is a context binding name.
fn ident_or_keyword(input: &mut &str) -> ModalResult<Expr> {
    let name = ident.parse_next(input)?;
    Ok(match name {
        "null" => Expr::Literal(Value::Null),
        "true" => Expr::Literal(Value::Bool(true)),
        "false" => Expr::Literal(Value::Bool(false)),
        _ => Expr::Ident(name.to_owned()),
    })
}

// -- Comparison operators ---------------------------------------------------

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    ws.parse_next(input)?;
    alt((
        ">=".value(CompareOp::Gte),
        ">".value(CompareOp::Gt),
        "<=".value(CompareOp::Lte),
        "<".value(CompareOp::Lt),
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Neq),
    ))
    .parse_next(input)
}

// -- Expressions (precedence: OR < AND < NOT < comparison < postfix) --------

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((
        delimited('(', expr, (ws, ')')),
        string_literal.map(|s| Expr::Literal(Value::Str(s))),
        negative_number.map(Expr::Literal),
        float_literal.map(|f| Expr::Literal(Value::Float(f))),
        dec_int::<_, i64, _>.map(|i| Expr::Literal(Value::Int(i))),
        ident_or_keyword,
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

/// Postfix chain: member access `a.b`, zero-argument method call `a.b()`,
/// and string-key index `a["k"]`, left-to-right.
fn postfix(input: &mut &str) -> ModalResult<Expr> {
    let mut base = primary(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        if opt('.').parse_next(input)?.is_some() {
            ws.parse_next(input)?;
            let name = cut_err(ident)
                .context(StrContext::Expected(StrContextValue::Description(
                    "member name",
                )))
                .parse_next(input)?;
            let call = opt((ws, '(', ws, ')')).parse_next(input)?;
            base = if call.is_some() {
                Expr::Call(Box::new(base), name.to_owned())
            } else {
                Expr::Member(Box::new(base), name.to_owned())
            };
        } else if opt('[').parse_next(input)?.is_some() {
            ws.parse_next(input)?;
            let key = cut_err(string_literal)
                .context(StrContext::Expected(StrContextValue::Description(
                    "string key",
                )))
                .parse_next(input)?;
            ws.parse_next(input)?;
            cut_err(']').parse_next(input)?;
            base = Expr::Index(Box::new(base), key);
        } else {
            input.reset(&checkpoint);
            return Ok(base);
        }
    }
}

fn comparison(input: &mut &str) -> ModalResult<Expr> {
    let left = postfix(input)?;
    let checkpoint = input.checkpoint();
    if let Ok(op) = compare_op.parse_next(input) {
        let right = cut_err(postfix)
            .context(StrContext::Expected(StrContextValue::Description(
                "comparison operand",
            )))
            .parse_next(input)?;
        Ok(Expr::Compare(Box::new(left), op, Box::new(right)))
    } else {
        input.reset(&checkpoint);
        Ok(left)
    }
}

fn unary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    if opt('!').parse_next(input)?.is_some() {
        let inner = cut_err(unary).parse_next(input)?;
        Ok(Expr::Not(Box::new(inner)))
    } else {
        comparison(input)
    }
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = unary(input)?;
    let rest: Vec<Expr> = repeat(0.., preceded((ws, "&&"), cut_err(unary))).parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::And(Box::new(acc), Box::new(r))))
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = and_expr(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((ws, "||"), cut_err(and_expr))).parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::Or(Box::new(acc), Box::new(r))))
}

fn expr(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    or_expr(input)
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_expression(input: &mut &str) -> ModalResult<Expr> {
    let parsed = expr.parse_next(input)?;
    ws.parse_next(input)?;
    Ok(parsed)
}
