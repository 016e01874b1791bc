//! A `nom`-based parser for the standard expression language.

use super::ast::*;
use crate::ExpressionError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, map_res, opt, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair},
};

// --- Main Public Parsers ---

pub fn parse_expression(input: &str) -> Result<Expression, ExpressionError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(ExpressionError::Parse(
            input.to_string(),
            format!("parser did not consume all input, remainder: '{rem}'"),
        )),
        Err(e) => Err(ExpressionError::Parse(input.to_string(), e.to_string())),
    }
}

/// Parses an assignation sequence: `name=expr(,name=expr)*`.
pub fn parse_assignation_sequence(input: &str) -> Result<Vec<Assignation>, ExpressionError> {
    match separated_list1(ws(char(',')), assignation).parse(input.trim()) {
        Ok(("", assignations)) => Ok(assignations),
        Ok((rem, _)) => Err(ExpressionError::Parse(
            input.to_string(),
            format!("parser did not consume all input, remainder: '{rem}'"),
        )),
        Err(e) => Err(ExpressionError::Parse(input.to_string(), e.to_string())),
    }
}

/// Parses an iteration expression: `var : expr`.
pub fn parse_each_expression(input: &str) -> Result<EachExpression, ExpressionError> {
    let mut parser = (ws(identifier), char(':'), ws(expression));
    match parser.parse(input.trim()) {
        Ok(("", (iteration_variable, _, iterated))) => Ok(EachExpression {
            iteration_variable: iteration_variable.to_string(),
            iterated,
        }),
        Ok((rem, _)) => Err(ExpressionError::Parse(
            input.to_string(),
            format!("parser did not consume all input, remainder: '{rem}'"),
        )),
        Err(e) => Err(ExpressionError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("or"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("and"), |_| BinaryOperator::And).parse(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("=="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag("&lt;="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("&gt;="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag("&lt;"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
        map(tag("&gt;"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(char('+'), |_| BinaryOperator::Plus).parse(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(unary_expr, additive_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    let (i, not_op) = opt(ws(char('!'))).parse(input)?;
    let (i, expr) = primary_expr(i)?;

    if not_op.is_some() {
        Ok((
            i,
            Expression::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            },
        ))
    } else {
        Ok((i, expr))
    }
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        variable_expression,
        selection_expression,
        message_expression,
        map(tag("true"), |_| Expression::Literal(serde_json::Value::Bool(true))),
        map(tag("false"), |_| Expression::Literal(serde_json::Value::Bool(false))),
        map(tag("null"), |_| Expression::Literal(serde_json::Value::Null)),
        number_literal,
        map(string_literal, |s| {
            Expression::Literal(serde_json::Value::String(s))
        }),
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Envelope Parsers ---

fn variable_expression(input: &str) -> IResult<&str, Expression> {
    map(
        delimited(tag("${"), ws(path), char('}')),
        Expression::Variable,
    )
    .parse(input)
}

fn selection_expression(input: &str) -> IResult<&str, Expression> {
    map(
        delimited(tag("*{"), ws(path), char('}')),
        Expression::Selection,
    )
    .parse(input)
}

fn message_expression(input: &str) -> IResult<&str, Expression> {
    map(
        delimited(tag("#{"), ws(message_key), char('}')),
        |key: &str| Expression::Message(key.to_string()),
    )
    .parse(input)
}

// --- Literal Parsers ---

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn number_literal(input: &str) -> IResult<&str, Expression> {
    map_res(
        recognize((
            take_while1(|c: char| c.is_ascii_digit()),
            opt(pair(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
        )),
        |s: &str| -> Result<Expression, serde_json::Error> {
            let value: serde_json::Value = serde_json::from_str(s)?;
            Ok(Expression::Literal(value))
        },
    )
    .parse(input)
}

// --- Name and Path Parsers ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn message_key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.' || c == '-').parse(input)
}

fn path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    separated_list1(char('.'), path_segment).parse(input)
}

fn path_segment(input: &str) -> IResult<&str, PathSegment> {
    alt((
        map(identifier, |s: &str| PathSegment::Key(s.to_string())),
        map_res(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
            s.parse::<usize>().map(PathSegment::Index)
        }),
    ))
    .parse(input)
}

fn assignation(input: &str) -> IResult<&str, Assignation> {
    map(
        (ws(identifier), char('='), ws(expression)),
        |(name, _, expression)| Assignation {
            name: name.to_string(),
            expression,
        },
    )
    .parse(input)
}
