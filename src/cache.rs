use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::parse::{parse, ParseError};
use crate::types::Expr;

/// Bounded, thread-safe cache mapping expression source text to its
/// compiled form.
///
/// Entries are inserted lazily on first use. When the cache is at capacity,
/// one arbitrary entry is evicted before insertion; the size never exceeds
/// the configured capacity. The eviction choice is not a contract callers
/// may depend on.
#[derive(Debug)]
pub struct ExpressionCache {
    capacity: usize,
    entries: Mutex<HashMap<String, Arc<Expr>>>,
}

impl ExpressionCache {
    /// Create a cache holding at most `capacity` compiled expressions.
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the compiled form of `source`, compiling and inserting it on
    /// first use. Concurrent callers for the same source observe either a
    /// fully compiled expression or the parse error; a failed parse inserts
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the source text does not compile.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<Expr>, ParseError> {
        let mut entries = self.lock();
        if let Some(expr) = entries.get(source) {
            return Ok(Arc::clone(expr));
        }
        let compiled = Arc::new(parse(source)?);
        if entries.len() >= self.capacity {
            let victim = entries.keys().next().cloned();
            if let Some(victim) = victim {
                entries.remove(&victim);
            }
        }
        entries.insert(source.to_owned(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of compiled expressions currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The cache holds no invariant a panicking holder could break, so a
    // poisoned lock is recovered rather than propagated.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Expr>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
