//! Identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a delivery target (a Telegram chat or channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub i64);

impl SubscriberId {
    /// Returns the raw chat id.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which mission window to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    /// The window that is running right now.
    Current,
    /// The window that starts at the next boundary.
    Next,
}

impl Selector {
    /// Value of the `data` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Selector::Current => "current",
            Selector::Next => "next",
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_id_serializes_as_number() {
        let id = SubscriberId(-100123);
        assert_eq!(serde_json::to_string(&id).unwrap(), "-100123");

        let parsed: SubscriberId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, SubscriberId(42));
    }

    #[test]
    fn test_selector_query_values() {
        assert_eq!(Selector::Current.as_str(), "current");
        assert_eq!(Selector::Next.to_string(), "next");
    }
}
