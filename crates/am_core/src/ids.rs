//! crates/am_core/src/ids.rs
//! Registry token ids for elections, candidates, lists, unions and counting circles.
//! Deterministic, ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors returned when validating or parsing IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    NonAscii,
    TooLong,
    BadShape,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::NonAscii => write!(f, "id must be ASCII without NUL"),
            IdError::TooLong => write!(f, "id longer than {TOKEN_MAX_LEN} bytes"),
            IdError::BadShape => write!(f, "id must match ^[A-Za-z0-9_.:-]{{1,64}}$"),
        }
    }
}

impl std::error::Error for IdError {}

const TOKEN_MAX_LEN: usize = 64;

/// Quickly verify ASCII (no NUL).
#[inline]
fn is_ascii_no_nul(s: &str) -> bool {
    !s.as_bytes().iter().any(|&b| b == 0 || b > 0x7F)
}

/// Token: ^[A-Za-z0-9_.:-]{1,64}$ (ASCII only)
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let bs = s.as_bytes();
    if bs.is_empty() || bs.len() > TOKEN_MAX_LEN || !is_ascii_no_nul(s) {
        return false;
    }
    bs.iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
}

fn parse_token(s: &str) -> Result<String, IdError> {
    if !is_ascii_no_nul(s) {
        return Err(IdError::NonAscii);
    }
    if s.len() > TOKEN_MAX_LEN {
        return Err(IdError::TooLong);
    }
    if !is_valid_token(s) {
        return Err(IdError::BadShape);
    }
    Ok(s.to_owned())
}

macro_rules! token_newtype {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_token(s).map($name)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

token_newtype!(
    /// Election (primary, secondary or proportional) token.
    ElectionId
);
token_newtype!(
    /// Candidate token (unique within an election).
    CandidateId
);
token_newtype!(
    /// Proportional election list token.
    ListId
);
token_newtype!(
    /// List union or sub-list union token.
    ListUnionId
);
token_newtype!(
    /// Union-wide list token (column of a double-proportional matrix).
    UnionListId
);
token_newtype!(
    /// Counting circle token.
    CountingCircleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_tokens_parse() {
        assert!("L-01".parse::<ListId>().is_ok());
        assert!("ZH:2023.nr".parse::<ElectionId>().is_ok());
    }

    #[test]
    fn invalid_tokens_reject() {
        assert_eq!("".parse::<ListId>(), Err(IdError::BadShape));
        assert_eq!("a b".parse::<ListId>(), Err(IdError::BadShape));
        assert_eq!("é".parse::<CandidateId>(), Err(IdError::NonAscii));
        let long = "x".repeat(65);
        assert_eq!(long.parse::<CandidateId>(), Err(IdError::TooLong));
    }

    #[test]
    fn deserialize_validates() {
        let ok: ListId = serde_json::from_str("\"L1\"").unwrap();
        assert_eq!(ok.as_str(), "L1");
        assert!(serde_json::from_str::<ListId>("\"L 1\"").is_err());
    }
}
