use std::fmt;

use serde::Deserialize;

use crate::types::{ConfigError, Rule};

/// Default request parameter name that triggers a bypass.
pub const DEFAULT_BYPASS_PARAM: &str = "exshield.bypass";
/// Default expression cache capacity.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Immutable engine configuration: the ordered rule list plus bypass and
/// cache policy. Parsed once at startup, shared read-only afterwards.
///
/// # Example
///
/// ```
/// use exshield::Config;
///
/// let config = Config::from_json(
///     r#"{
///         "rules": [
///             {
///                 "name": "max-count",
///                 "expression": "query.count <= 100",
///                 "valueExpression": "query.count",
///                 "message": "Count must not exceed 100"
///             }
///         ],
///         "bypassAllowed": true,
///         "cacheSize": 50
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(config.rules().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    rules: Vec<Rule>,
    bypass_allowed: bool,
    bypass_param: String,
    cache_size: usize,
    fail_on_missing_analysis: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    rules: Vec<RawRule>,
    bypass_allowed: Option<bool>,
    bypass_param: Option<String>,
    cache_size: Option<i64>,
    fail_on_missing_analysis: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    name: Option<String>,
    expression: Option<String>,
    value_expression: Option<String>,
    message: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Config {
    /// Create a configuration with the given rules and default policy:
    /// bypass disallowed, bypass parameter `exshield.bypass`, cache size
    /// 100, missing analysis tolerated.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            bypass_allowed: false,
            bypass_param: DEFAULT_BYPASS_PARAM.to_owned(),
            cache_size: DEFAULT_CACHE_SIZE,
            fail_on_missing_analysis: false,
        }
    }

    /// Allow or disallow the request-supplied bypass flag.
    #[must_use]
    pub fn with_bypass_allowed(mut self, allowed: bool) -> Self {
        self.bypass_allowed = allowed;
        self
    }

    /// Set the request parameter name carrying the bypass flag. Blank input
    /// keeps the default.
    #[must_use]
    pub fn with_bypass_param(mut self, param: impl Into<String>) -> Self {
        let param = param.into().trim().to_owned();
        if !param.is_empty() {
            self.bypass_param = param;
        }
        self
    }

    /// Set the expression cache capacity. Values below one keep the default.
    #[must_use]
    pub fn with_cache_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.cache_size = size;
        }
        self
    }

    /// Reject requests with a server error when no analysis views are
    /// available, instead of admitting them.
    #[must_use]
    pub fn with_fail_on_missing_analysis(mut self, fail: bool) -> Self {
        self.fail_on_missing_analysis = fail;
        self
    }

    /// Parse a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or on a rule with a blank
    /// name or expression.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Read a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on I/O, JSON, or validation failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(raw.rules.len());
        for raw_rule in raw.rules {
            let name = raw_rule.name.unwrap_or_default();
            let expression = raw_rule.expression.unwrap_or_default();
            let mut rule = Rule::new(name, expression)?;
            if let Some(value_expression) = raw_rule.value_expression {
                rule = rule.with_value_expression(value_expression);
            }
            if let Some(message) = raw_rule.message {
                rule = rule.with_message(message);
            }
            rules.push(rule);
        }

        let mut config = Self::new(rules);
        if let Some(allowed) = raw.bypass_allowed {
            config = config.with_bypass_allowed(allowed);
        }
        if let Some(param) = raw.bypass_param {
            config = config.with_bypass_param(param);
        }
        if let Some(size) = raw.cache_size {
            if size > 0 {
                config = config.with_cache_size(usize::try_from(size).unwrap_or(usize::MAX));
            }
        }
        if let Some(fail) = raw.fail_on_missing_analysis {
            config = config.with_fail_on_missing_analysis(fail);
        }
        Ok(config)
    }

    /// The ordered rule chain.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn bypass_allowed(&self) -> bool {
        self.bypass_allowed
    }

    #[must_use]
    pub fn bypass_param(&self) -> &str {
        &self.bypass_param
    }

    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    #[must_use]
    pub fn fail_on_missing_analysis(&self) -> bool {
        self.fail_on_missing_analysis
    }

    #[must_use]
    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config({} rules, bypassAllowed={}, bypassParam={}, cacheSize={}, failOnMissingAnalysis={})",
            self.rules.len(),
            self.bypass_allowed,
            self.bypass_param,
            self.cache_size,
            self.fail_on_missing_analysis,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(!config.has_rules());
        assert!(!config.bypass_allowed());
        assert_eq!(config.bypass_param(), "exshield.bypass");
        assert_eq!(config.cache_size(), 100);
        assert!(!config.fail_on_missing_analysis());
    }

    #[test]
    fn from_json_full() {
        let config = Config::from_json(
            r#"{
                "rules": [
                    {
                        "name": "max-count",
                        "expression": "query.count <= 100",
                        "valueExpression": "query.count",
                        "message": "Count must not exceed 100"
                    },
                    {
                        "name": "max-size",
                        "expression": "query.size <= 1000"
                    }
                ],
                "bypassAllowed": true,
                "bypassParam": "shield.skip",
                "cacheSize": 32,
                "failOnMissingAnalysis": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.rules().len(), 2);
        assert_eq!(config.rules()[0].name(), "max-count");
        assert_eq!(config.rules()[0].value_expression(), Some("query.count"));
        assert_eq!(config.rules()[1].message(), None);
        assert!(config.bypass_allowed());
        assert_eq!(config.bypass_param(), "shield.skip");
        assert_eq!(config.cache_size(), 32);
        assert!(config.fail_on_missing_analysis());
    }

    #[test]
    fn from_json_empty_object_gets_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert!(!config.has_rules());
        assert_eq!(config.cache_size(), 100);
    }

    #[test]
    fn non_positive_cache_size_keeps_default() {
        let config = Config::from_json(r#"{"cacheSize": 0}"#).unwrap();
        assert_eq!(config.cache_size(), 100);
        let config = Config::from_json(r#"{"cacheSize": -5}"#).unwrap();
        assert_eq!(config.cache_size(), 100);
    }

    #[test]
    fn blank_bypass_param_keeps_default() {
        let config = Config::from_json(r#"{"bypassParam": "   "}"#).unwrap();
        assert_eq!(config.bypass_param(), "exshield.bypass");
    }

    #[test]
    fn blank_rule_name_is_fatal() {
        let err = Config::from_json(
            r#"{"rules": [{"name": "  ", "expression": "query.count <= 100"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::BlankRuleName));
    }

    #[test]
    fn missing_rule_expression_is_fatal() {
        let err = Config::from_json(r#"{"rules": [{"name": "max-count"}]}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BlankRuleExpression { rule } if rule == "max-count"
        ));
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            Config::from_json("{not json").unwrap_err(),
            ConfigError::Json(_)
        ));
    }

    #[test]
    fn display_summary() {
        let config = Config::new(vec![Rule::new("r", "true").unwrap()]);
        assert_eq!(
            config.to_string(),
            "Config(1 rules, bypassAllowed=false, bypassParam=exshield.bypass, \
             cacheSize=100, failOnMissingAnalysis=false)"
        );
    }
}
