use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ORDER: AtomicU64 = AtomicU64::new(1);
static NEXT_POSITION: AtomicU64 = AtomicU64::new(1);

/// Order ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Next process-unique order ID (`ord-1`, `ord-2`, ...).
    pub fn next() -> Self {
        Self(format!("ord-{}", NEXT_ORDER.fetch_add(1, Ordering::Relaxed)))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub String);

impl PositionId {
    pub fn next() -> Self {
        Self(format!("pos-{}", NEXT_POSITION.fetch_add(1, Ordering::Relaxed)))
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_order_ids_are_unique() {
        let a = OrderId::next();
        let b = OrderId::next();
        assert_ne!(a, b);
        assert!(a.0.starts_with("ord-"));
    }

    #[test]
    fn generated_position_ids_are_unique() {
        assert_ne!(PositionId::next(), PositionId::next());
    }
}
