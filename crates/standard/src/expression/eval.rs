//! Evaluation of parsed expressions against an execution context.

use super::ast::{BinaryOperator, Expression, PathSegment, UnaryOperator};
use crate::ExpressionError;
use serde_json::Value;
use weft_engine::Arguments;

/// Evaluates an expression under the given `Arguments`.
///
/// Navigation is forgiving: a variable or property that does not exist
/// evaluates to `null` rather than failing, mirroring how templates are
/// usually written against partially populated models. Type errors in
/// operators (comparing an object to a number, say) do fail.
pub fn evaluate(arguments: &Arguments, expression: &Expression) -> Result<Value, ExpressionError> {
    match expression {
        Expression::Literal(value) => Ok(value.clone()),

        Expression::Variable(path) => Ok(navigate_variables(arguments, path)),

        Expression::Selection(path) => match arguments.selection_target() {
            Some(target) => Ok(navigate(target.clone(), path)),
            // Without a selected object, selection expressions behave as
            // plain variable expressions.
            None => Ok(navigate_variables(arguments, path)),
        },

        Expression::Message(key) => Ok(Value::String(
            arguments
                .resolve_message(key)
                .unwrap_or_else(|| format!("??{key}??")),
        )),

        Expression::UnaryOp { op, expr } => {
            let value = evaluate(arguments, expr)?;
            match op {
                UnaryOperator::Not => Ok(Value::Bool(!is_truthy(&value))),
            }
        }

        Expression::BinaryOp { left, op, right } => match op {
            BinaryOperator::Or => {
                let left = evaluate(arguments, left)?;
                if is_truthy(&left) {
                    return Ok(Value::Bool(true));
                }
                let right = evaluate(arguments, right)?;
                Ok(Value::Bool(is_truthy(&right)))
            }
            BinaryOperator::And => {
                let left = evaluate(arguments, left)?;
                if !is_truthy(&left) {
                    return Ok(Value::Bool(false));
                }
                let right = evaluate(arguments, right)?;
                Ok(Value::Bool(is_truthy(&right)))
            }
            _ => {
                let left = evaluate(arguments, left)?;
                let right = evaluate(arguments, right)?;
                apply_binary_operator(*op, &left, &right)
            }
        },
    }
}

/// Renders a value the way template output wants it: `null` disappears,
/// strings are used as-is, everything else takes its JSON form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The language's truthiness rule: `false`, `null`, `0`, `""` and the
/// string `"false"` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn navigate_variables(arguments: &Arguments, path: &[PathSegment]) -> Value {
    let Some((first, rest)) = path.split_first() else {
        return Value::Null;
    };
    let root = match first {
        PathSegment::Key(name) => arguments.variable(name).cloned(),
        PathSegment::Index(_) => None,
    };
    match root {
        Some(value) => navigate(value, rest),
        None => Value::Null,
    }
}

fn navigate(mut value: Value, path: &[PathSegment]) -> Value {
    for segment in path {
        value = match (segment, value) {
            (PathSegment::Key(name), Value::Object(mut map)) => {
                map.remove(name).unwrap_or(Value::Null)
            }
            (PathSegment::Index(index), Value::Array(mut items)) => {
                if *index < items.len() {
                    items.swap_remove(*index)
                } else {
                    Value::Null
                }
            }
            _ => Value::Null,
        };
    }
    value
}

fn apply_binary_operator(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Result<Value, ExpressionError> {
    match op {
        BinaryOperator::Equals => Ok(Value::Bool(value_equals(left, right))),
        BinaryOperator::NotEquals => Ok(Value::Bool(!value_equals(left, right))),

        BinaryOperator::Plus => {
            if let (Value::Number(a), Value::Number(b)) = (left, right) {
                if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                    return Ok(Value::Number(serde_json::Number::from(a + b)));
                }
                let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
                return Ok(serde_json::Number::from_f64(sum)
                    .map(Value::Number)
                    .unwrap_or(Value::Null));
            }
            // String on either side turns + into concatenation.
            Ok(Value::String(format!(
                "{}{}",
                stringify(left),
                stringify(right)
            )))
        }

        BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => {
            let ordering = compare(left, right).ok_or_else(|| {
                ExpressionError::Evaluation(format!(
                    "cannot compare {} with {}",
                    kind_of(left),
                    kind_of(right)
                ))
            })?;
            let result = match op {
                BinaryOperator::LessThan => ordering.is_lt(),
                BinaryOperator::LessThanOrEqual => ordering.is_le(),
                BinaryOperator::GreaterThan => ordering.is_gt(),
                BinaryOperator::GreaterThanOrEqual => ordering.is_ge(),
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }

        BinaryOperator::Or | BinaryOperator::And => {
            unreachable!("logical operators are short-circuited by the caller")
        }
    }
}

fn value_equals(left: &Value, right: &Value) -> bool {
    if let (Value::Number(a), Value::Number(b)) = (left, right) {
        // 1 == 1.0 regardless of internal representation.
        return a.as_f64() == b.as_f64();
    }
    left == right
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
