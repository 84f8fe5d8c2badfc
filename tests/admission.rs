use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use exshield::{
    AdmissionRequest, AnalysisViews, Config, Decision, RejectKind, Rule, Shield, StatsObject,
    Value,
};

fn query_views(entries: &[(&str, i64)]) -> AnalysisViews {
    let map: HashMap<String, Value> = entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), Value::Int(*v)))
        .collect();
    AnalysisViews::new().with_query(Value::Map(map))
}

fn rejection(decision: Decision) -> exshield::Rejection {
    match decision {
        Decision::Rejected(rejection) => rejection,
        Decision::Admitted => panic!("expected rejection"),
    }
}

#[test]
fn max_count_rejection_carries_full_diagnostics() {
    let config = Config::new(vec![Rule::new("max-count", "query.count <= 100")
        .unwrap()
        .with_value_expression("query.count")
        .with_message("Count must not exceed 100")]);
    let shield = Shield::new(config);

    let request = AdmissionRequest::new().with_analysis(query_views(&[("count", 150)]));
    let rejection = rejection(shield.check(&request));

    assert_eq!(rejection.kind(), RejectKind::BadRequest);
    let message = rejection.message();
    assert!(message.contains("max-count"), "missing rule name: {message}");
    assert!(
        message.contains("query.count <= 100"),
        "missing expression: {message}"
    );
    assert!(message.contains("150"), "missing actual value: {message}");
    assert!(
        message.contains("Count must not exceed 100"),
        "missing annotation: {message}"
    );
}

#[test]
fn first_failing_rule_is_named_not_earlier_passing_ones() {
    let config = Config::new(vec![
        Rule::new("max-count", "query.count <= 100").unwrap(),
        Rule::new("max-size", "query.size <= 1000").unwrap(),
    ]);
    let shield = Shield::new(config);

    let request =
        AdmissionRequest::new().with_analysis(query_views(&[("count", 50), ("size", 1500)]));
    let rejection = rejection(shield.check(&request));

    assert!(rejection.message().contains("max-size"));
    assert!(!rejection.message().contains("max-count"));
}

#[derive(Debug)]
struct CountingStats {
    calls: Arc<AtomicUsize>,
}

impl StatsObject for CountingStats {
    fn call(&self, method: &str) -> Option<Value> {
        match method {
            "getCount" => {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Some(Value::Int(0))
            }
            _ => None,
        }
    }
}

#[test]
fn rules_after_first_failure_are_never_evaluated() {
    let calls = Arc::new(AtomicUsize::new(0));
    let stats: Arc<dyn StatsObject> = Arc::new(CountingStats {
        calls: Arc::clone(&calls),
    });

    let mut map = HashMap::new();
    map.insert("count".to_owned(), Value::Int(150));
    map.insert("stats".to_owned(), Value::Object(stats));
    let views = AnalysisViews::new().with_query(Value::Map(map));

    let config = Config::new(vec![
        Rule::new("max-count", "query.count <= 100").unwrap(),
        Rule::new("probe", "query.stats.getCount() <= 10").unwrap(),
    ]);
    let shield = Shield::new(config);

    let request = AdmissionRequest::new().with_analysis(views);
    assert!(!shield.check(&request).is_admitted());
    assert_eq!(calls.load(Ordering::SeqCst), 0, "later rule was evaluated");
}

#[test]
fn missing_analysis_admits_by_default() {
    let config = Config::new(vec![Rule::new("max-count", "query.count <= 100").unwrap()]);
    let shield = Shield::new(config);
    assert!(shield.check(&AdmissionRequest::new()).is_admitted());
}

#[test]
fn missing_analysis_rejects_with_server_error_when_required() {
    let config = Config::new(vec![Rule::new("max-count", "query.count <= 100").unwrap()])
        .with_fail_on_missing_analysis(true);
    let shield = Shield::new(config);

    let rejection = rejection(shield.check(&AdmissionRequest::new()));
    assert_eq!(rejection.kind(), RejectKind::ServerError);
    assert!(rejection.message().contains("analysis not found"));
}

#[test]
fn value_expression_failure_does_not_mask_gate_verdict() {
    let config = Config::new(vec![Rule::new("max-count", "query.count <= 100")
        .unwrap()
        .with_value_expression("nonexistent.getX()")]);
    let shield = Shield::new(config);

    let request = AdmissionRequest::new().with_analysis(query_views(&[("count", 150)]));
    let rejection = rejection(shield.check(&request));

    assert_eq!(rejection.kind(), RejectKind::BadRequest);
    assert!(rejection.message().contains("max-count"));
    // The diagnostic value never materialized, so no "actual value" section.
    assert!(!rejection.message().contains("actual value"));
}

#[test]
fn gate_evaluation_error_rejects_with_rule_name() {
    let config = Config::new(vec![Rule::new("broken", "query.count.deeper <= 1").unwrap()]);
    let shield = Shield::new(config);

    let request = AdmissionRequest::new().with_analysis(query_views(&[("count", 5)]));
    let rejection = rejection(shield.check(&request));

    assert_eq!(rejection.kind(), RejectKind::BadRequest);
    assert!(rejection.message().contains("broken"));
    assert!(rejection.message().contains("evaluation failed"));
}

#[test]
fn gate_compile_error_rejects_with_rule_name() {
    let config = Config::new(vec![Rule::new("unparsable", "query.count <=").unwrap()]);
    let shield = Shield::new(config);

    let request = AdmissionRequest::new().with_analysis(query_views(&[("count", 5)]));
    let rejection = rejection(shield.check(&request));

    assert_eq!(rejection.kind(), RejectKind::BadRequest);
    assert!(rejection.message().contains("unparsable"));
}

#[test]
fn bypass_has_no_effect_when_disallowed() {
    let config = Config::new(vec![Rule::new("max-count", "query.count <= 100").unwrap()]);
    let shield = Shield::new(config);

    for flag in ["true", "TRUE", "false", "anything"] {
        let request = AdmissionRequest::new()
            .with_param("exshield.bypass", flag)
            .with_analysis(query_views(&[("count", 150)]));
        assert!(!shield.check(&request).is_admitted(), "flag {flag:?}");
    }
}

#[test]
fn bypass_skips_failing_rules_when_allowed() {
    let config = Config::new(vec![Rule::new("max-count", "query.count <= 100").unwrap()])
        .with_bypass_allowed(true);
    let shield = Shield::new(config);

    let request = AdmissionRequest::new()
        .with_param("exshield.bypass", "true")
        .with_analysis(query_views(&[("count", 150)]));
    assert!(shield.check(&request).is_admitted());
}

#[test]
fn decisions_are_deterministic() {
    let config = Config::new(vec![
        Rule::new("max-count", "query.count <= 100")
            .unwrap()
            .with_value_expression("query.count"),
        Rule::new("max-size", "query.size <= 1000").unwrap(),
    ]);
    let shield = Shield::new(config);

    let request =
        AdmissionRequest::new().with_analysis(query_views(&[("count", 150), ("size", 10)]));
    let first = shield.check(&request);
    for _ in 0..10 {
        assert_eq!(shield.check(&request), first);
    }
}

#[test]
fn map_shaped_analysis_adapts_to_views() {
    let shaped = Value::from_json(serde_json::json!({
        "queryAnalysis": {"count": 150},
        "filtersAnalysis": {"cost": 2},
        "mergedAnalysis": {"count": 152}
    }));
    let views = AnalysisViews::from_map(&shaped).unwrap();

    let config = Config::new(vec![Rule::new("merged-count", "total.count <= 100")
        .unwrap()
        .with_value_expression("total.count")]);
    let shield = Shield::new(config);

    let request = AdmissionRequest::new().with_analysis(views);
    let rejection = rejection(shield.check(&request));
    assert!(rejection.message().contains("152"));
}

#[test]
fn config_from_json_end_to_end() {
    let config = Config::from_json(
        r#"{
            "rules": [
                {
                    "name": "max-count",
                    "expression": "query.count <= 100",
                    "valueExpression": "query.count",
                    "message": "Count must not exceed 100"
                }
            ]
        }"#,
    )
    .unwrap();
    let shield = Shield::new(config);

    let admitted = AdmissionRequest::new().with_analysis(query_views(&[("count", 100)]));
    assert!(shield.check(&admitted).is_admitted());

    let blocked = AdmissionRequest::new().with_analysis(query_views(&[("count", 101)]));
    assert!(!shield.check(&blocked).is_admitted());
}

#[test]
fn empty_rule_list_admits_everything() {
    let shield = Shield::new(Config::default().with_fail_on_missing_analysis(true));
    // No rules configured: even the missing-analysis policy is moot.
    assert!(shield.check(&AdmissionRequest::new()).is_admitted());
}
