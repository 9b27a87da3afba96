//! Opaque pagination cursors
//!
//! A cursor marks the position of the last record in a page: the value of the
//! primary sort column (when the page was produced under an explicit sort) and
//! the record's ulid as tiebreak key. Tokens are URL-safe base64 over a
//! version-tagged JSON envelope; a future sort-key shape bumps the version and
//! old tokens keep decoding or fail explicitly instead of mis-parsing.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::Value;

const CURSOR_VERSION: u8 = 1;

/// Decoded position in a sorted result set
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Primary sort column name and the boundary value for it
    pub sort_key: Option<(String, Value)>,
    /// ulid of the last record on the page
    pub id: String,
}

#[derive(Serialize, Deserialize)]
struct CursorWire {
    v: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    s: Option<SortKeyWire>,
    id: String,
}

#[derive(Serialize, Deserialize)]
struct SortKeyWire {
    c: String,
    k: Value,
}

impl Cursor {
    /// Cursor for the default sort (ulid order only)
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            sort_key: None,
            id: id.into(),
        }
    }

    /// Cursor bound to a sort column and its boundary value
    pub fn with_sort_key(column: impl Into<String>, value: Value, id: impl Into<String>) -> Self {
        Self {
            sort_key: Some((column.into(), value)),
            id: id.into(),
        }
    }

    /// Encode into an opaque token
    pub fn encode(&self) -> String {
        let wire = CursorWire {
            v: CURSOR_VERSION,
            s: self
                .sort_key
                .as_ref()
                .map(|(c, k)| SortKeyWire {
                    c: c.clone(),
                    k: k.clone(),
                }),
            id: self.id.clone(),
        };
        // Serialization of the wire struct cannot fail
        let payload = serde_json::to_vec(&wire).expect("cursor wire serialization");
        URL_SAFE_NO_PAD.encode(payload)
    }

    /// Decode a token
    ///
    /// Any malformed, tampered, or unknown-version token is `InvalidCursor`;
    /// no partial decode ever escapes.
    pub fn decode(token: &str) -> Result<Self> {
        let payload = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| EngineError::InvalidCursor)?;

        let wire: CursorWire =
            serde_json::from_slice(&payload).map_err(|_| EngineError::InvalidCursor)?;

        if wire.v != CURSOR_VERSION {
            return Err(EngineError::InvalidCursor);
        }

        // The tiebreak key must be a well-formed ulid
        ulid::Ulid::from_string(&wire.id).map_err(|_| EngineError::InvalidCursor)?;

        Ok(Self {
            sort_key: wire.s.map(|s| (s.c, s.k)),
            id: wire.id,
        })
    }
}
