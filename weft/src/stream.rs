//! Incremental output for streamed replies.

use serde::{Deserialize, Serialize};

/// A fragment of the assistant reply, delivered in emission order.
///
/// Concatenating every chunk of a successful streamed turn reproduces the
/// final answer exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenChunk {
    pub text: String,
}

impl TokenChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
