//! Opaque string identifiers used throughout the domain layer.

use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(MarketId);
string_id!(TokenId);
string_id!(ConditionId);

/// Unique position identifier, generated at signal time.
///
/// The inner value is private so all construction goes through
/// [`PositionId::generate`] or [`PositionId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionId(String);

impl PositionId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a unique id scoped to a market and strategy, mirroring the
    /// `market_id / strategy / timestamp / uuid` composition used by the
    /// original position-id generator.
    #[must_use]
    pub fn generate(market_id: &MarketId, strategy: &str) -> Self {
        let uuid = uuid::Uuid::new_v4();
        Self(format!("{market_id}-{strategy}-{uuid}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
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
    fn market_id_roundtrips_through_display() {
        let id = MarketId::new("0xabc");
        assert_eq!(format!("{id}"), "0xabc");
        assert_eq!(id.as_str(), "0xabc");
    }

    #[test]
    fn position_id_generate_is_unique() {
        let market = MarketId::new("m1");
        let a = PositionId::generate(&market, "yes_no");
        let b = PositionId::generate(&market, "yes_no");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("m1-yes_no-"));
    }
}
