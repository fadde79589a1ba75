//! Combine policy for collection-valued configuration fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How newly resolved collection values interact with existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombinePolicy {
    /// Resolved values discard the existing collection
    Replace,
    /// Resolved values are appended to the existing collection
    Merge,
}

impl CombinePolicy {
    /// Parse a policy token, ignoring case
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token.trim().to_ascii_uppercase().as_str() {
            "REPLACE" => Ok(Self::Replace),
            "MERGE" => Ok(Self::Merge),
            _ => Err(CoreError::InvalidCombinePolicy {
                token: token.to_string(),
            }),
        }
    }

    /// Combine an existing list with freshly resolved entries.
    ///
    /// An empty `resolved` list means nothing matched, so `existing` is kept
    /// regardless of policy. Merging skips entries already present.
    pub fn combine_list<T: PartialEq + Clone>(self, existing: &[T], resolved: Vec<T>) -> Vec<T> {
        if resolved.is_empty() {
            return existing.to_vec();
        }
        match self {
            Self::Replace => resolved,
            Self::Merge => {
                let mut merged = existing.to_vec();
                for item in resolved {
                    if !merged.contains(&item) {
                        merged.push(item);
                    }
                }
                merged
            }
        }
    }
}

impl FromStr for CombinePolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CombinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "REPLACE"),
            Self::Merge => write!(f, "MERGE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(CombinePolicy::parse("replace").unwrap(), CombinePolicy::Replace);
        assert_eq!(CombinePolicy::parse("Merge").unwrap(), CombinePolicy::Merge);
        assert_eq!("MERGE".parse::<CombinePolicy>().unwrap(), CombinePolicy::Merge);
    }

    #[test]
    fn test_parse_rejects_unknown_token() {
        let err = CombinePolicy::parse("append").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("append"));
        assert!(msg.contains("REPLACE"));
        assert!(msg.contains("MERGE"));
    }

    #[test]
    fn test_merge_appends_unique_entries_in_order() {
        let existing = vec!["v1".to_string(), "v2".to_string()];
        let merged = CombinePolicy::Merge.combine_list(
            &existing,
            vec!["v2".to_string(), "v3".to_string()],
        );
        assert_eq!(merged, vec!["v1", "v2", "v3"]);
    }

    #[test]
    fn test_replace_discards_existing() {
        let existing = vec!["a".to_string()];
        let replaced = CombinePolicy::Replace.combine_list(&existing, vec!["b".to_string()]);
        assert_eq!(replaced, vec!["b"]);
    }

    #[test]
    fn test_empty_resolution_keeps_existing() {
        let existing = vec![1, 2];
        assert_eq!(CombinePolicy::Replace.combine_list(&existing, vec![]), vec![1, 2]);
        assert_eq!(CombinePolicy::Merge.combine_list(&existing, vec![]), vec![1, 2]);
    }
}
