//! Error types for askd.
//!
//! External-dependency failures (stores, LLM, tools) are fatal to the
//! query that triggered them and are never retried; each variant carries
//! the underlying cause so callers see exactly what broke.

use thiserror::Error;

/// Errors from the semantic stores (the cache and retriever collections).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite operation failed.
    #[error("store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The embedding request against the model endpoint failed.
    #[error("embedding request failed: {message}")]
    Embedding {
        /// Provider error description.
        message: String,
    },

    /// A stored document could not be decoded (metadata or embedding).
    #[error("corrupt stored document {id}: {message}")]
    Corrupt {
        /// Document id of the offending row.
        id: String,
        /// What failed to decode.
        message: String,
    },

    /// The connection mutex was poisoned by a panicking holder.
    #[error("store connection lock poisoned")]
    Poisoned,
}

/// Errors from deterministic tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool ran but failed.
    #[error("tool '{name}' failed: {message}")]
    Execution {
        /// Name of the tool that failed.
        name: String,
        /// Failure description.
        message: String,
    },

    /// A timestamp parameter matched none of the accepted formats.
    #[error("parameter '{name}' is not a recognized timestamp: '{value}'")]
    Timestamp {
        /// Parameter name (`ini` or `end`).
        name: String,
        /// The rejected value.
        value: String,
    },

    /// The relational store backing a tool failed.
    #[error("tool database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("tool connection lock poisoned")]
    Poisoned,
}

/// Errors surfaced by [`crate::llm::Orchestrator::query`].
///
/// Any of these aborts the remaining pipeline states; there is no
/// partial-result return.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A cache or retriever operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The generative model call failed.
    #[error("LLM request failed: {message}")]
    Llm {
        /// Provider error description.
        message: String,
    },

    /// The model completion did not parse as JSON after fence stripping.
    #[error("model output is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    /// A dispatched tool failed.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Top-level startup and configuration errors.
#[derive(Debug, Error)]
pub enum Error {
    /// No API key was configured for the model endpoint.
    #[error("no API key configured (set OPENAI_API_KEY or ASKD_API_KEY)")]
    ApiKeyMissing,

    /// Invalid configuration value.
    #[error("configuration error: {message}")]
    Config {
        /// What was invalid.
        message: String,
    },

    /// The token counter could not be constructed.
    #[error("tokenizer initialization failed: {message}")]
    Tokenizer {
        /// Underlying cause.
        message: String,
    },

    /// Opening or migrating a database failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_wraps_store_error() {
        let err: QueryError = StoreError::Embedding {
            message: "connection refused".to_string(),
        }
        .into();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::Timestamp {
            name: "ini".to_string(),
            value: "not-a-date".to_string(),
        };
        assert!(err.to_string().contains("ini"));
        assert!(err.to_string().contains("not-a-date"));
    }
}
