use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator used when a list of member names is flattened into one text
/// field (CSV participants). Member names may not contain it.
pub const MEMBER_LIST_SEPARATOR: &str = ";";

/// A trip participant. Members are keyed by their exact name and carry no
/// monetary state; everything is derived from the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joined_at: Utc::now(),
        }
    }

    /// True when `name` can be stored and exported without loss: non-blank,
    /// no surrounding whitespace, no list separator.
    pub fn is_valid_name(name: &str) -> bool {
        !name.trim().is_empty() && name.trim() == name && !name.contains(MEMBER_LIST_SEPARATOR)
    }

    pub fn with_joined_at(mut self, joined_at: DateTime<Utc>) -> Self {
        self.joined_at = joined_at;
        self
    }
}

impl std::fmt::Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validity() {
        assert!(Member::is_valid_name("Anu"));
        assert!(Member::is_valid_name("Bala Krishnan"));
        assert!(!Member::is_valid_name(""));
        assert!(!Member::is_valid_name("  "));
        assert!(!Member::is_valid_name(" Anu"));
        assert!(!Member::is_valid_name("Anu\t"));
        assert!(!Member::is_valid_name("Anu;Bala"));
    }

    #[test]
    fn test_member_display_is_name() {
        let member = Member::new("Anu");
        assert_eq!(member.to_string(), "Anu");
    }

    #[test]
    fn test_member_names_are_case_sensitive() {
        assert_ne!(Member::new("anu").name, Member::new("Anu").name);
    }
}
