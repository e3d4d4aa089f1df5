//! Keyword state identifying one shader variant
//!
//! A variant is compiled for a set of active feature keywords.
//! Equality and hashing are set-based: `{FOG, SHADOWS}` and
//! `{SHADOWS, FOG}` are the same state and collapse to one compiled
//! variant.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable set of active feature keywords for one variant.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct KeywordState(BTreeSet<String>);

impl KeywordState {
    /// State with no active keywords (the base variant).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_active(&self, keyword: &str) -> bool {
        self.0.contains(keyword)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Active keywords in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|k| k.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for KeywordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<no keywords>");
        }
        let mut first = true;
        for keyword in &self.0 {
            if !first {
                write!(f, "+")?;
            }
            write!(f, "{keyword}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(state: &KeywordState) -> u64 {
        let mut hasher = DefaultHasher::new();
        state.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_declaration_order_is_irrelevant() {
        let a: KeywordState = ["FOG", "SHADOWS", "SKINNED"].into_iter().collect();
        let b: KeywordState = ["SKINNED", "FOG", "SHADOWS"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_duplicates_collapse() {
        let a: KeywordState = ["FOG", "FOG"].into_iter().collect();
        assert_eq!(a.len(), 1);
        assert!(a.is_active("FOG"));
    }

    #[test]
    fn test_display_is_sorted() {
        let state: KeywordState = ["ZETA", "ALPHA"].into_iter().collect();
        assert_eq!(state.to_string(), "ALPHA+ZETA");
        assert_eq!(KeywordState::empty().to_string(), "<no keywords>");
    }
}
