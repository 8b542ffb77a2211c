//! Token counting for metrics.
//!
//! Wraps tiktoken's `cl100k_base` encoding. Counts feed the token
//! counters only; they never influence the resolution path.

use tiktoken_rs::CoreBPE;

use crate::error::Error;

/// Token counter backed by the `cl100k_base` BPE.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Loads the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tokenizer`] if the BPE tables fail to load.
    pub fn new() -> Result<Self, Error> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer {
            message: e.to_string(),
        })?;
        Ok(Self { bpe })
    }

    /// Counts tokens in `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> u64 {
        self.bpe.encode_ordinary(text).len() as u64
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &"cl100k_base")
            .finish()
    }
}
