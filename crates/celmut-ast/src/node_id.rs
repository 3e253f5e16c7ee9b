//! Expression identifiers.
//!
//! Every expression node carries an `ExprId`. Ids are the join key between
//! the expression tree and its side tables (macro calls, source positions),
//! so within one tree every assigned id is unique.

use serde::{Deserialize, Serialize};

/// Identifier of an expression node.
///
/// The raw value `0` is reserved for nodes that have not been assigned an id
/// yet (freshly built donor subtrees, macro-call shadow roots).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExprId(u64);

impl ExprId {
    /// The "unassigned" id.
    pub const UNSET: ExprId = ExprId(0);

    /// Create an id from its raw value.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value of this id.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether this id has been assigned.
    #[inline]
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl From<u64> for ExprId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ExprId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_zero() {
        assert_eq!(ExprId::UNSET.raw(), 0);
        assert!(!ExprId::UNSET.is_set());
        assert!(ExprId::new(1).is_set());
        assert_eq!(ExprId::default(), ExprId::UNSET);
    }

    #[test]
    fn test_expr_id_ordering() {
        assert!(ExprId::new(3) < ExprId::new(7));
        assert_eq!(ExprId::from(42), ExprId::new(42));
    }

    #[test]
    fn test_expr_id_display() {
        assert_eq!(format!("{}", ExprId::new(123)), "#123");
    }
}
