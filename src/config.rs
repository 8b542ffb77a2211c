//! Service configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! The resulting [`Config`] is immutable and shared read-only by every
//! concurrent query; nothing mutates it post-construction.

use std::path::PathBuf;

use crate::error::Error;

/// Default listening address for the HTTP server.
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
/// Default generative model.
const DEFAULT_LLM_MODEL: &str = "gemma3";
/// Default embedding model.
const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";
/// Default similarity floor for context facts.
const DEFAULT_MIN_CONFIDENCE_RAG: f32 = 0.80;
/// Default similarity floor for tool-descriptor facts.
const DEFAULT_MIN_CONFIDENCE_TOOL: f32 = 0.60;
/// Default similarity floor for cache hits and cache writes.
const DEFAULT_MIN_CONFIDENCE_CACHE: f32 = 0.90;
/// Default sampling temperature for the answer path.
const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Default vector store path.
const DEFAULT_VECTOR_DB_PATH: &str = "./data/vectors.sqlite";
/// Default time-series (tool) store path.
const DEFAULT_TOOL_DB_PATH: &str = "./data/db.sqlite";

/// Immutable service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address, e.g. `0.0.0.0:8080`.
    pub listen_addr: String,
    /// API key for the model endpoint.
    pub api_key: String,
    /// Optional base URL override (local endpoints, proxies).
    pub base_url: Option<String>,
    /// Model used for answer generation and tool-parameter extraction.
    pub llm_model: String,
    /// Model used to embed store content and queries.
    pub embed_model: String,
    /// Sampling temperature for the answer path.
    pub temperature: f32,
    /// Similarity threshold a fact must strictly exceed to join the context.
    pub min_confidence_rag: f32,
    /// Similarity threshold a tool descriptor must strictly exceed to dispatch.
    pub min_confidence_tool: f32,
    /// Similarity threshold governing cache hits and cache writes.
    pub min_confidence_cache: f32,
    /// Path to the SQLite file holding the cache and retriever collections.
    pub vector_db_path: PathBuf,
    /// Path to the SQLite file holding time-series rows for the series tool.
    pub tool_db_path: PathBuf,
}

impl Config {
    /// Creates a new builder for `Config`.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, Error> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    listen_addr: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    llm_model: Option<String>,
    embed_model: Option<String>,
    temperature: Option<f32>,
    min_confidence_rag: Option<f32>,
    min_confidence_tool: Option<f32>,
    min_confidence_cache: Option<f32>,
    vector_db_path: Option<PathBuf>,
    tool_db_path: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.listen_addr.is_none() {
            self.listen_addr = std::env::var("ASKD_ADDR").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("ASKD_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("ASKD_BASE_URL"))
                .ok();
        }
        if self.llm_model.is_none() {
            self.llm_model = std::env::var("ASKD_LLM_MODEL").ok();
        }
        if self.embed_model.is_none() {
            self.embed_model = std::env::var("ASKD_EMBED_MODEL").ok();
        }
        if self.temperature.is_none() {
            self.temperature = std::env::var("ASKD_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.min_confidence_rag.is_none() {
            self.min_confidence_rag = std::env::var("ASKD_MIN_CONFIDENCE_RAG")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.min_confidence_tool.is_none() {
            self.min_confidence_tool = std::env::var("ASKD_MIN_CONFIDENCE_TOOL")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.min_confidence_cache.is_none() {
            self.min_confidence_cache = std::env::var("ASKD_MIN_CONFIDENCE_CACHE")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.vector_db_path.is_none() {
            self.vector_db_path = std::env::var("ASKD_VECTOR_DB").ok().map(PathBuf::from);
        }
        if self.tool_db_path.is_none() {
            self.tool_db_path = std::env::var("ASKD_TOOL_DB").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the HTTP listen address.
    #[must_use]
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the generative model.
    #[must_use]
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = Some(model.into());
        self
    }

    /// Sets the answer-path sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the context-fact similarity threshold.
    #[must_use]
    pub const fn min_confidence_rag(mut self, t: f32) -> Self {
        self.min_confidence_rag = Some(t);
        self
    }

    /// Sets the tool-descriptor similarity threshold.
    #[must_use]
    pub const fn min_confidence_tool(mut self, t: f32) -> Self {
        self.min_confidence_tool = Some(t);
        self
    }

    /// Sets the cache similarity threshold.
    #[must_use]
    pub const fn min_confidence_cache(mut self, t: f32) -> Self {
        self.min_confidence_cache = Some(t);
        self
    }

    /// Sets the vector store path.
    #[must_use]
    pub fn vector_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vector_db_path = Some(path.into());
        self
    }

    /// Sets the time-series store path.
    #[must_use]
    pub fn tool_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tool_db_path = Some(path.into());
        self
    }

    /// Builds the [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApiKeyMissing`] if no API key was set, or
    /// [`Error::Config`] if a threshold falls outside `[0, 1]`.
    pub fn build(self) -> Result<Config, Error> {
        let api_key = self.api_key.ok_or(Error::ApiKeyMissing)?;

        let config = Config {
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            api_key,
            base_url: self.base_url,
            llm_model: self.llm_model.unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            embed_model: self
                .embed_model
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            min_confidence_rag: self.min_confidence_rag.unwrap_or(DEFAULT_MIN_CONFIDENCE_RAG),
            min_confidence_tool: self
                .min_confidence_tool
                .unwrap_or(DEFAULT_MIN_CONFIDENCE_TOOL),
            min_confidence_cache: self
                .min_confidence_cache
                .unwrap_or(DEFAULT_MIN_CONFIDENCE_CACHE),
            vector_db_path: self
                .vector_db_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VECTOR_DB_PATH)),
            tool_db_path: self
                .tool_db_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL_DB_PATH)),
        };

        for (name, value) in [
            ("min_confidence_rag", config.min_confidence_rag),
            ("min_confidence_tool", config.min_confidence_tool),
            ("min_confidence_cache", config.min_confidence_cache),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config {
                    message: format!("{name} must be in [0, 1], got {value}"),
                });
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(config.embed_model, DEFAULT_EMBED_MODEL);
        assert!((config.min_confidence_cache - 0.9).abs() < f32::EPSILON);
        assert!((config.min_confidence_rag - 0.8).abs() < f32::EPSILON);
        assert!((config.min_confidence_tool - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = Config::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = Config::builder()
            .api_key("key")
            .llm_model("llama3.2")
            .temperature(0.2)
            .min_confidence_cache(0.75)
            .vector_db_path("/tmp/vec.sqlite")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.llm_model, "llama3.2");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!((config.min_confidence_cache - 0.75).abs() < f32::EPSILON);
        assert_eq!(config.vector_db_path, PathBuf::from("/tmp/vec.sqlite"));
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_env_fills_unset_fields_and_explicit_values_win() {
        // set_var is unsafe in the 2024 edition; no other test reads
        // these variables.
        unsafe {
            std::env::set_var("ASKD_LLM_MODEL", "env-model");
            std::env::set_var("ASKD_TEMPERATURE", "0.3");
        }
        let config = Config::builder()
            .api_key("key")
            .temperature(0.7)
            .from_env()
            .build()
            .unwrap_or_else(|_| unreachable!());
        unsafe {
            std::env::remove_var("ASKD_LLM_MODEL");
            std::env::remove_var("ASKD_TEMPERATURE");
        }

        // Unset field comes from the environment.
        assert_eq!(config.llm_model, "env-model");
        // An explicitly set field is not overridden by the environment.
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_builder_rejects_out_of_range_threshold() {
        let result = Config::builder()
            .api_key("key")
            .min_confidence_rag(1.5)
            .build();
        assert!(result.is_err());
    }
}
