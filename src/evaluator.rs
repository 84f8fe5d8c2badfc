use crate::cache::ExpressionCache;
use crate::evaluate::{eval_expr, truthy};
use crate::types::{AnalysisViews, EvalContext, EvalError, EvaluationResult, Rule, Value};

/// Evaluates rules against per-request analysis views, with expression
/// compilation cached across requests.
///
/// Thread-safe: one evaluator is shared by all concurrent request threads.
#[derive(Debug)]
pub struct RuleEvaluator {
    cache: ExpressionCache,
}

impl RuleEvaluator {
    /// Create an evaluator whose expression cache holds at most
    /// `cache_size` compiled expressions.
    #[must_use]
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache: ExpressionCache::new(cache_size),
        }
    }

    /// Evaluate a rule's gate expression, and its value expression if one is
    /// configured, against the request's analysis views.
    ///
    /// The gate expression is load-bearing: a compile or evaluation failure
    /// there is fatal to this call. The value expression is diagnostic only;
    /// its failure is logged and swallowed, leaving the actual value absent.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when the gate expression fails to compile or
    /// raises at evaluation time. The rule cannot be judged in that case.
    pub fn evaluate(
        &self,
        rule: &Rule,
        views: &AnalysisViews,
    ) -> Result<EvaluationResult, EvalError> {
        let ctx = EvalContext::new(views);

        let gate = self.cache.get_or_compile(rule.expression())?;
        let gate_result = eval_expr(&gate, &ctx)?;
        let passed = truthy(&gate_result);

        let mut actual_value = None;
        if let Some(source) = rule.value_expression() {
            match self.evaluate_value(source, &ctx) {
                Ok(value) => actual_value = Some(value),
                Err(err) => {
                    log::warn!(
                        "failed to evaluate value expression '{source}' for rule '{}': {err}",
                        rule.name()
                    );
                }
            }
        }

        Ok(EvaluationResult::new(passed, actual_value))
    }

    fn evaluate_value(&self, source: &str, ctx: &EvalContext) -> Result<Value, EvalError> {
        let expr = self.cache.get_or_compile(source)?;
        Ok(eval_expr(&expr, ctx)?)
    }
}
