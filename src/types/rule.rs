use super::error::ConfigError;

/// A single admission rule: a named boolean gate expression with an optional
/// diagnostic value expression and an optional operator-facing annotation.
///
/// Immutable after construction and shared read-only across all concurrent
/// evaluations. Field text is trimmed on ingest; blank optional fields are
/// treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    expression: String,
    value_expression: Option<String>,
    message: Option<String>,
}

impl Rule {
    /// Create a rule from a name and a gate expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either field is blank. A rule with no gate
    /// must fail loudly at load time rather than become a no-op.
    pub fn new(
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ConfigError::BlankRuleName);
        }
        let expression = expression.into().trim().to_owned();
        if expression.is_empty() {
            return Err(ConfigError::BlankRuleExpression { rule: name });
        }
        Ok(Self {
            name,
            expression,
            value_expression: None,
            message: None,
        })
    }

    /// Attach a diagnostic value expression, evaluated only to enrich
    /// rejection messages. Blank input is treated as absent.
    #[must_use]
    pub fn with_value_expression(mut self, expression: impl Into<String>) -> Self {
        let expression = expression.into().trim().to_owned();
        self.value_expression = if expression.is_empty() {
            None
        } else {
            Some(expression)
        };
        self
    }

    /// Attach a human-readable annotation appended to rejection messages.
    /// Blank input is treated as absent.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into().trim().to_owned();
        self.message = if message.is_empty() {
            None
        } else {
            Some(message)
        };
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[must_use]
    pub fn value_expression(&self) -> Option<&str> {
        self.value_expression.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
