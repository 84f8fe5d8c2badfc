use super::Value;

/// The three named analysis views produced upstream for one request.
///
/// Each view is independently optional; an absent view is distinct from an
/// empty one. Created fresh per request, consumed once by the rule chain.
#[derive(Debug, Clone, Default)]
pub struct AnalysisViews {
    query: Option<Value>,
    filters: Option<Value>,
    total: Option<Value>,
}

impl AnalysisViews {
    /// Create an instance with all three views absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the primary query statistics view.
    #[must_use]
    pub fn with_query(mut self, view: impl Into<Value>) -> Self {
        self.query = Some(view.into());
        self
    }

    /// Attach the filter-clause statistics view.
    #[must_use]
    pub fn with_filters(mut self, view: impl Into<Value>) -> Self {
        self.filters = Some(view.into());
        self
    }

    /// Attach the merged/aggregate statistics view.
    #[must_use]
    pub fn with_total(mut self, view: impl Into<Value>) -> Self {
        self.total = Some(view.into());
        self
    }

    /// Adapt a map-shaped analysis structure with `queryAnalysis`,
    /// `filtersAnalysis`, and `mergedAnalysis` keys. Entries that are not
    /// maps are treated as absent. Returns `None` if the value itself is
    /// not a map.
    #[must_use]
    pub fn from_map(value: &Value) -> Option<Self> {
        let Value::Map(entries) = value else {
            return None;
        };
        let adopt = |key: &str| match entries.get(key) {
            Some(v @ Value::Map(_)) => Some(v.clone()),
            _ => None,
        };
        Some(Self {
            query: adopt("queryAnalysis"),
            filters: adopt("filtersAnalysis"),
            total: adopt("mergedAnalysis"),
        })
    }
}

/// Evaluation context exposing exactly three bindings: `query`, `filters`,
/// and `total`. An absent view binds to [`Value::Null`] so expressions can
/// test it against the `null` literal without a resolution error.
#[derive(Debug)]
pub struct EvalContext {
    query: Value,
    filters: Value,
    total: Value,
}

impl EvalContext {
    /// Build a context from the request's analysis views. Pure; the views
    /// are cloned into the request-local context.
    #[must_use]
    pub fn new(views: &AnalysisViews) -> Self {
        let bind = |view: &Option<Value>| view.clone().unwrap_or(Value::Null);
        Self {
            query: bind(&views.query),
            filters: bind(&views.filters),
            total: bind(&views.total),
        }
    }

    /// Resolve a name to its bound value. Unknown names resolve to `Null`
    /// (non-strict), so a typo surfaces later as a null-chain runtime error
    /// rather than a resolution failure.
    #[must_use]
    pub fn resolve(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        match name {
            "query" => &self.query,
            "filters" => &self.filters,
            "total" => &self.total,
            _ => &NULL,
        }
    }
}
