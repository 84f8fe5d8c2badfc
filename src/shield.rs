use std::collections::HashMap;
use std::fmt;

use crate::config::Config;
use crate::evaluate::parse_bool;
use crate::evaluator::RuleEvaluator;
use crate::types::{AnalysisViews, EvaluationResult, Rule};

/// Request-scoped input to an admission check: the override parameters and
/// the analysis views produced upstream, if any.
#[derive(Debug, Clone, Default)]
pub struct AdmissionRequest {
    params: HashMap<String, String>,
    analysis: Option<AnalysisViews>,
}

impl AdmissionRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a request parameter (e.g. the bypass flag).
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Attach the analysis views computed for this request.
    #[must_use]
    pub fn with_analysis(mut self, views: AnalysisViews) -> Self {
        self.analysis = Some(views);
        self
    }

    fn param_bool(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|v| parse_bool(v))
    }
}

/// Outcome class of a rejection, mapping to the HTTP-equivalent status the
/// host should answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    /// A rule blocked the request, or its gate expression could not be
    /// evaluated (an authoring bug, still reported to the client).
    BadRequest,
    /// An operational problem: analysis views were required but absent.
    ServerError,
}

/// A rejected admission decision with its operator- and client-facing
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    kind: RejectKind,
    message: String,
}

impl Rejection {
    fn bad_request(message: String) -> Self {
        Self {
            kind: RejectKind::BadRequest,
            message,
        }
    }

    fn server_error(message: String) -> Self {
        Self {
            kind: RejectKind::ServerError,
            message,
        }
    }

    #[must_use]
    pub fn kind(&self) -> RejectKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result of one admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    /// The request may proceed unmodified.
    Admitted,
    /// The request is blocked; the rejection carries the status class and
    /// the synthesized message.
    Rejected(Rejection),
}

impl Decision {
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted)
    }
}

/// The admission controller: evaluates the configured rule chain against
/// each request's analysis views, in declared order, stopping at the first
/// failure.
///
/// Immutable after construction; designed to live behind `Arc` and be
/// shared by all concurrent request threads.
///
/// # Example
///
/// ```
/// use exshield::{AdmissionRequest, AnalysisViews, Config, Rule, Shield, Value};
/// use std::collections::HashMap;
///
/// let config = Config::new(vec![
///     Rule::new("max-count", "query.count <= 100").unwrap(),
/// ]);
/// let shield = Shield::new(config);
///
/// let mut stats = HashMap::new();
/// stats.insert("count".to_owned(), Value::Int(50));
/// let request = AdmissionRequest::new()
///     .with_analysis(AnalysisViews::new().with_query(Value::Map(stats)));
///
/// assert!(shield.check(&request).is_admitted());
/// ```
#[derive(Debug)]
pub struct Shield {
    config: Config,
    evaluator: RuleEvaluator,
}

impl Shield {
    /// Build a shield from its configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let evaluator = RuleEvaluator::new(config.cache_size());
        log::info!("exshield initialized: {config}");
        Self { config, evaluator }
    }

    /// Decide whether a request may proceed.
    ///
    /// Rules are evaluated in declared order; the first rule that fails or
    /// errors produces the rejection and later rules are never evaluated.
    pub fn check(&self, request: &AdmissionRequest) -> Decision {
        if self.bypass_requested(request) {
            log::debug!("admission bypassed by request parameter");
            return Decision::Admitted;
        }

        if !self.config.has_rules() {
            log::debug!("no rules configured, admitting");
            return Decision::Admitted;
        }

        let Some(views) = request.analysis.as_ref() else {
            return self.handle_missing_analysis();
        };

        for rule in self.config.rules() {
            match self.evaluator.evaluate(rule, views) {
                Ok(result) if result.passed() => {}
                Ok(result) => {
                    let message = build_rejection_message(rule, &result);
                    log::info!("request blocked: {message}");
                    return Decision::Rejected(Rejection::bad_request(message));
                }
                Err(err) => {
                    let message = format!("rule '{}' evaluation failed: {err}", rule.name());
                    log::error!("{message}");
                    return Decision::Rejected(Rejection::bad_request(message));
                }
            }
        }

        log::debug!("all {} rules passed", self.config.rules().len());
        Decision::Admitted
    }

    fn bypass_requested(&self, request: &AdmissionRequest) -> bool {
        self.config.bypass_allowed() && request.param_bool(self.config.bypass_param())
    }

    fn handle_missing_analysis(&self) -> Decision {
        if self.config.fail_on_missing_analysis() {
            return Decision::Rejected(Rejection::server_error(
                "request analysis not found in request context; \
                 ensure a query analyzer runs before admission checking"
                    .to_owned(),
            ));
        }
        log::warn!("request analysis not found, skipping rule evaluation");
        Decision::Admitted
    }
}

/// Synthesize the rejection message for a rule whose gate evaluated to
/// false. Deterministically carries the rule name, the gate expression
/// text, the diagnostic actual value when present, and the configured
/// annotation when present.
fn build_rejection_message(rule: &Rule, result: &EvaluationResult) -> String {
    let mut message = format!(
        "request blocked by rule '{}': expression '{}' evaluated to false.",
        rule.name(),
        rule.expression()
    );
    if let Some(value) = result.actual_value() {
        message.push_str(&format!(" actual value: {value}."));
    }
    if let Some(annotation) = rule.message() {
        message.push_str(&format!(" ({annotation})"));
    }
    message
}
