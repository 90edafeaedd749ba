//! Operation results and their wire encoding.

use serde::Serialize;

use crate::asset::Asset;
use crate::error::InvocationError;

/// Result of a successful operation.
///
/// Serializes untagged: a bare string, integer, boolean, record object, or
/// array. `Empty` has no payload at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Operation returns nothing.
    Empty,
    /// Previous owner, from a transfer or hand-back.
    Owner(String),
    /// Previous grade.
    Grade(i64),
    /// Existence check.
    Exists(bool),
    /// A single record.
    Asset(Asset),
    /// Records in key order.
    Assets(Vec<Asset>),
    /// Class identifiers.
    Classes(Vec<String>),
}

impl Response {
    /// Returns true when the operation produced no payload.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// UTF-8 JSON payload; empty for [`Response::Empty`].
    pub fn to_payload(&self) -> Result<Vec<u8>, InvocationError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::to_vec(self).map_err(encode_err)
    }

    /// Pretty JSON for display; empty string for [`Response::Empty`].
    pub fn to_json_pretty(&self) -> Result<String, InvocationError> {
        if self.is_empty() {
            return Ok(String::new());
        }
        serde_json::to_string_pretty(self).map_err(encode_err)
    }
}

fn encode_err(e: serde_json::Error) -> InvocationError {
    InvocationError::Encode {
        message: e.to_string(),
    }
}
