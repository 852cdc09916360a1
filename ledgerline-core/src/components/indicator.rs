//! Indicator trait and the dependency-ordered indicator set.
//!
//! Indicators are pure functions: candle history in, one optional value per
//! candle out. They are computed once over the whole history before the run
//! and attached to each candle by name. `None` means insufficient history.

use crate::domain::Candle;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No value at candle t may depend on candle t+1 or later.
pub trait Indicator: Send + Sync {
    /// Stable identity (e.g., "sma_20"). Used as the storage key on each candle.
    fn name(&self) -> &str;

    /// Indicators that must be computed (and attached) before this one.
    fn dependencies(&self) -> &[Arc<dyn Indicator>] {
        &[]
    }

    /// Compute the indicator for the entire candle series.
    ///
    /// Returns exactly one entry per input candle.
    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("circular indicator dependency: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
    #[error("indicator {name} returned {actual} values for {expected} candles")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

type CalcFn = dyn Fn(&[Candle]) -> Vec<Option<f64>> + Send + Sync;

/// Closure-backed indicator.
#[derive(Clone)]
pub struct CustomIndicator {
    name: String,
    calc: Arc<CalcFn>,
    deps: Vec<Arc<dyn Indicator>>,
}

impl CustomIndicator {
    pub fn new<F>(name: impl Into<String>, calc: F) -> Self
    where
        F: Fn(&[Candle]) -> Vec<Option<f64>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            calc: Arc::new(calc),
            deps: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, deps: Vec<Arc<dyn Indicator>>) -> Self {
        self.deps = deps;
        self
    }
}

impl fmt::Debug for CustomIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomIndicator")
            .field("name", &self.name)
            .field("deps", &self.deps.iter().map(|d| d.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Indicator for CustomIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[Arc<dyn Indicator>] {
        &self.deps
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        (self.calc)(candles)
    }
}

/// Validated indicators in application order (dependencies first).
///
/// Dependencies reachable from the given roots are included even if they were
/// not listed. Names are unique within a set.
#[derive(Clone, Default)]
pub struct IndicatorSet {
    ordered: Vec<Arc<dyn Indicator>>,
}

impl IndicatorSet {
    pub fn new(indicators: Vec<Arc<dyn Indicator>>) -> Result<Self, IndicatorError> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        let mut ordered = Vec::new();
        for indicator in &indicators {
            visit(indicator, &mut visited, &mut stack, &mut ordered)?;
        }
        Ok(Self { ordered })
    }

    pub fn ordered(&self) -> &[Arc<dyn Indicator>] {
        &self.ordered
    }

    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Compute every indicator over one instrument's chronological candles and
    /// attach the values. Each indicator sees the values of those before it.
    pub fn apply(&self, candles: &mut [Candle]) -> Result<(), IndicatorError> {
        for indicator in &self.ordered {
            let values = indicator.calculate(candles);
            if values.len() != candles.len() {
                return Err(IndicatorError::LengthMismatch {
                    name: indicator.name().to_string(),
                    expected: candles.len(),
                    actual: values.len(),
                });
            }
            for (candle, value) in candles.iter_mut().zip(values) {
                if let Some(v) = value {
                    candle.set_indicator(indicator.name(), v);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for IndicatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorSet")
            .field("ordered", &self.names())
            .finish()
    }
}

/// Depth-first walk. `stack` holds the current path; a name already on it is a cycle.
fn visit(
    indicator: &Arc<dyn Indicator>,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
    ordered: &mut Vec<Arc<dyn Indicator>>,
) -> Result<(), IndicatorError> {
    let name = indicator.name().to_string();

    if stack.contains(&name) {
        let mut chain = stack.clone();
        chain.push(name);
        return Err(IndicatorError::Cycle { chain });
    }
    if visited.contains(&name) {
        return Ok(());
    }

    stack.push(name.clone());
    for dep in indicator.dependencies() {
        visit(dep, visited, stack, ordered)?;
    }
    stack.pop();

    visited.insert(name);
    ordered.push(Arc::clone(indicator));
    Ok(())
}
