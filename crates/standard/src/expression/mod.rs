//! The standard expression language.
//!
//! Expressions combine `${...}` variable navigation, `*{...}` selection
//! navigation, `#{...}` message lookups, literals and a small operator set
//! (`+`, comparisons, `and`/`or`/`!`). Attribute values that carry several
//! bindings use assignation sequences (`x=${a},y='b'`), and `wf:each` uses
//! iteration expressions (`item : ${collection}`).
//!
//! [`StandardExpressionEvaluator`] is the piece the engine sees: it is
//! registered as an execution attribute by the standard dialect, so the
//! engine core stays entirely expression-agnostic.

pub mod ast;
mod eval;
mod parser;

pub use eval::{evaluate, is_truthy, stringify};
pub use parser::{parse_assignation_sequence, parse_each_expression, parse_expression};

use crate::ExpressionError;
use ast::Expression;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use weft_engine::{Arguments, EngineError, ExpressionEvaluator};

/// Evaluates standard-language expressions, keeping a cache of parsed
/// expression trees (templates evaluate the same attribute values over and
/// over, especially under iteration).
#[derive(Default)]
pub struct StandardExpressionEvaluator {
    parsed: Mutex<HashMap<String, Expression>>,
}

impl StandardExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_cached(&self, expression: &str) -> Result<Expression, ExpressionError> {
        if let Ok(parsed) = self.parsed.lock() {
            if let Some(expression) = parsed.get(expression) {
                return Ok(expression.clone());
            }
        }
        let parsed_expression = parse_expression(expression)?;
        if let Ok(mut parsed) = self.parsed.lock() {
            parsed.insert(expression.to_string(), parsed_expression.clone());
        }
        Ok(parsed_expression)
    }
}

impl ExpressionEvaluator for StandardExpressionEvaluator {
    fn evaluate(&self, arguments: &Arguments, expression: &str) -> Result<Value, EngineError> {
        let parsed = self.parse_cached(expression)?;
        Ok(eval::evaluate(arguments, &parsed)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use weft_dom::TemplateMode;
    use weft_engine::{Context, Dialect, DialectConfiguration, EngineConfiguration, Processor};

    struct EmptyDialect;
    impl Dialect for EmptyDialect {
        fn name(&self) -> &str {
            "empty"
        }
        fn processors(&self) -> Vec<Processor> {
            Vec::new()
        }
    }

    #[test]
    fn test_evaluator_parses_caches_and_evaluates() {
        let dialect = DialectConfiguration::new(Arc::new(EmptyDialect)).unwrap();
        let configuration =
            Arc::new(EngineConfiguration::build(vec![dialect], Vec::new()).unwrap());
        let mut context = Context::new();
        context.set_variable("n", json!(1));
        let arguments = Arguments::new(
            configuration,
            "cache-test",
            TemplateMode::Xhtml,
            Arc::new(context),
        );

        let evaluator = StandardExpressionEvaluator::new();
        assert_eq!(
            ExpressionEvaluator::evaluate(&evaluator, &arguments, "${n} + 1").unwrap(),
            json!(2)
        );
        // Second evaluation hits the parse cache.
        assert_eq!(
            ExpressionEvaluator::evaluate(&evaluator, &arguments, "${n} + 1").unwrap(),
            json!(2)
        );
        assert_eq!(evaluator.parsed.lock().unwrap().len(), 1);

        assert!(
            ExpressionEvaluator::evaluate(&evaluator, &arguments, "${unclosed").is_err()
        );
    }
}
