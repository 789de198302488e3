//! Externally assigned integer identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque integer identifier assigned by the declarative layer. Unique among
/// live nodes of its kind at any instant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub i32);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_integer() {
        let s = serde_json::to_string(&Tag(42)).unwrap();
        assert_eq!(s, "42");
        let parsed: Tag = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, Tag(7));
    }
}
