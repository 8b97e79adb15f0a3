use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Wire representation shared by all identifiers.
///
/// The server emits integer row ids, while locally minted or test ids may be
/// arbitrary strings. Numeric-looking strings are normalized to `Number` so
/// that `"7"` typed on a command line equals `7` decoded from a response.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    fn normalize(raw: String) -> Self {
        match raw.trim().parse::<u64>() {
            Ok(n) => WireId::Number(n),
            Err(_) => WireId::Text(raw),
        }
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireId::Number(n) => write!(f, "{n}"),
            WireId::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for WireId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireId::Number(n) => serializer.serialize_u64(*n),
            WireId::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => WireId::Number(n),
            Raw::Text(s) => WireId::normalize(s),
        })
    }
}

/// Error type for parsing an ID from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from an empty string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(WireId);

        impl $name {
            /// Creates an id, normalizing numeric strings to their integer form.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(WireId::normalize(raw.into()))
            }

            /// Returns the integer value when the id is numeric.
            #[must_use]
            pub fn as_number(&self) -> Option<u64> {
                match &self.0 {
                    WireId::Number(n) => Some(*n),
                    WireId::Text(_) => None,
                }
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(WireId::Number(value))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self::new(trimmed))
            }
        }
    };
}

wire_id!(
    /// Unique identifier for a Topic
    TopicId
);
wire_id!(
    /// Unique identifier for a User
    UserId
);
wire_id!(
    /// Unique identifier for a quiz question
    QuestionId
);
wire_id!(
    /// Unique identifier for a learning session
    SessionId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_equal_numbers() {
        assert_eq!(TopicId::new("42"), TopicId::from(42));
        assert_eq!("42".parse::<TopicId>().unwrap(), TopicId::from(42));
    }

    #[test]
    fn text_ids_keep_their_spelling() {
        let id = TopicId::new("t1");
        assert_eq!(id.to_string(), "t1");
        assert_eq!(id.as_number(), None);
        assert_eq!(format!("{id:?}"), "TopicId(t1)");
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!("   ".parse::<UserId>().is_err());
    }

    #[test]
    fn decodes_integer_and_string_forms() {
        let from_int: TopicId = serde_json::from_str("7").unwrap();
        let from_str: TopicId = serde_json::from_str("\"7\"").unwrap();
        let text: TopicId = serde_json::from_str("\"rust-101\"").unwrap();

        assert_eq!(from_int, from_str);
        assert_eq!(text, TopicId::new("rust-101"));
    }

    #[test]
    fn encodes_in_the_shape_received() {
        assert_eq!(serde_json::to_string(&TopicId::from(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&TopicId::new("t1")).unwrap(),
            "\"t1\""
        );
    }
}
