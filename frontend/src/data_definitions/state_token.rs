//! Compact URL-safe token holding a whole search state.
//!
//! The `source` parameter only carries what a query document can express;
//! facet settings such as order, size and open/closed survive only here.

use std::{fmt::Display, str::FromStr};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use common::search_state::SearchState;
use serde::{Deserialize, Serialize};

/// base64url of the CBOR encoding of `T`, usable in a URL hash segment.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StateToken<T>(pub T);

pub type SearchStateToken = StateToken<SearchState>;

impl<T> From<T> for StateToken<T> {
    fn from(value: T) -> Self {
        StateToken(value)
    }
}

impl<T> StateToken<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> StateToken<T> {
    pub fn encode(&self) -> Result<String, StateTokenError> {
        let mut serialized = Vec::new();
        ciborium::into_writer(&self.0, &mut serialized).map_err(|e| StateTokenError::Encode(e.to_string()))?;
        Ok(URL_SAFE.encode(serialized))
    }
}

// Encoding failures print nothing; use `encode` to see them.
impl<T: Serialize> Display for StateToken<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Ok(token) = self.encode() {
            f.write_str(&token)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum StateTokenError {
    Encode(String),
    DecodeError(base64::DecodeError),
    CiboriumError(ciborium::de::Error<std::io::Error>),
}

impl std::fmt::Display for StateTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "Failed to serialize state: {}", err),
            Self::DecodeError(err) => write!(f, "Failed to decode base64: {}", err),
            Self::CiboriumError(err) => write!(f, "Failed to deserialize state: {}", err),
        }
    }
}

impl std::error::Error for StateTokenError {}

impl<T: for<'de> Deserialize<'de>> FromStr for StateToken<T> {
    type Err = StateTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = URL_SAFE.decode(s.trim().as_bytes()).map_err(StateTokenError::DecodeError)?;
        let parsed = ciborium::from_reader(std::io::Cursor::new(decoded)).map_err(StateTokenError::CiboriumError)?;
        Ok(StateToken(parsed))
    }
}
