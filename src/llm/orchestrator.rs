//! The confidence-gated query pipeline.
//!
//! Every query walks the same sequence: semantic cache lookup, knowledge
//! retrieval, tool dispatch for qualifying tool descriptors, prompt
//! assembly, generation, and a gated cache write-back. Similarity and
//! confidence comparisons are strict throughout; a score equal to its
//! threshold never qualifies.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::QueryError;
use crate::store::{CacheStore, RetrieverStore};
use crate::telemetry::Metrics;
use crate::tokenizer::TokenCounter;
use crate::tool::ToolRouter;

use super::answer::{Answer, clean_json};
use super::message::{ChatRequest, system_message, user_message};
use super::prompt::{
    CONTEXT_HEADER, FALLBACK_SENTINEL, SYSTEM_PROMPT, TOOL_EXTRACTION_TEMPERATURE,
    build_answer_prompt, build_tool_prompt, push_context_line,
};
use super::provider::LlmProvider;

/// Answer type on the happy path, whether served from cache or generated.
pub const ANSWER_TYPE_FINAL: &str = "FINAL";

/// Runs queries through the cache / retrieval / tool / generation
/// pipeline.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    cache: CacheStore,
    retriever: RetrieverStore,
    tools: ToolRouter,
    token_counter: TokenCounter,
    metrics: Arc<Metrics>,
    model: String,
    temperature: f32,
    min_confidence_rag: f32,
    min_confidence_tool: f32,
    min_confidence_cache: f32,
}

impl Orchestrator {
    /// Assembles the pipeline from its collaborators.
    #[must_use]
    pub fn new(
        config: &Config,
        provider: Arc<dyn LlmProvider>,
        cache: CacheStore,
        retriever: RetrieverStore,
        tools: ToolRouter,
        token_counter: TokenCounter,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            provider,
            cache,
            retriever,
            tools,
            token_counter,
            metrics,
            model: config.llm_model.clone(),
            temperature: config.temperature,
            min_confidence_rag: config.min_confidence_rag,
            min_confidence_tool: config.min_confidence_tool,
            min_confidence_cache: config.min_confidence_cache,
        }
    }

    /// Answers `question`.
    ///
    /// With `use_cache` set, a sufficiently similar cached answer
    /// short-circuits the pipeline, and a confident non-fallback
    /// generated answer is written back to the cache afterwards. With it
    /// unset the cache is neither read nor written.
    ///
    /// # Errors
    ///
    /// Any store, provider, decode, or tool failure aborts the query.
    pub async fn query(&self, question: &str, use_cache: bool) -> Result<Answer, QueryError> {
        if use_cache && let Some(answer) = self.check_cache(question).await? {
            return Ok(answer);
        }

        let context = self.assemble_context(question).await?;
        let prompt = build_answer_prompt(&context, question);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![system_message(SYSTEM_PROMPT), user_message(&prompt)],
            temperature: Some(self.temperature),
        };
        let response = self.provider.chat(&request).await?;
        let answer = Answer::from_model_output(&response.content)?;
        self.metrics.add_llm_tokens(
            self.token_counter.count(question),
            self.token_counter.count(&answer.response),
        );

        if answer.response.ends_with(FALLBACK_SENTINEL) {
            info!(confidence = answer.confidence, "model could not answer");
            self.metrics.incr_cant_answer();
        } else if use_cache && answer.confidence > self.min_confidence_cache {
            debug!(confidence = answer.confidence, "caching answer");
            self.cache.add(question, &answer.response, "").await?;
        }

        Ok(answer)
    }

    /// Returns a cached answer from the first entry whose similarity
    /// strictly exceeds the cache threshold.
    async fn check_cache(&self, question: &str) -> Result<Option<Answer>, QueryError> {
        let hits = self.cache.query(question).await?;
        let mut max_similarity = 0.0f32;
        for hit in &hits {
            max_similarity = max_similarity.max(hit.similarity);
            if hit.similarity > self.min_confidence_cache
                && let Some(response) = CacheStore::response_of(hit)
            {
                debug!(similarity = hit.similarity, "cache hit");
                self.metrics.add_cache_tokens(
                    self.token_counter.count(question),
                    self.token_counter.count(response),
                );
                return Ok(Some(Answer {
                    r#type: ANSWER_TYPE_FINAL.to_string(),
                    response: response.to_string(),
                    confidence: hit.similarity,
                    ..Answer::default()
                }));
            }
        }
        debug!(max_similarity, "cache miss");
        Ok(None)
    }

    /// Retrieves facts and builds the context block: tool descriptors
    /// above the tool threshold are executed and their results appended;
    /// plain facts above the retrieval threshold are listed under a
    /// header written once, on the first qualifying plain fact.
    async fn assemble_context(&self, question: &str) -> Result<String, QueryError> {
        let facts = self.retriever.query(question).await?;
        debug!(count = facts.len(), "retrieved facts");

        let mut context = String::new();
        let mut header_written = false;
        for fact in &facts {
            let tool_name = RetrieverStore::tool_name(fact);
            if fact.similarity > self.min_confidence_tool
                && let Some(tool_name) = tool_name
            {
                let result = self.run_tool(tool_name, question).await?;
                push_context_line(&mut context, &result);
            } else if fact.similarity > self.min_confidence_rag {
                if !header_written {
                    context.push_str(CONTEXT_HEADER);
                    header_written = true;
                }
                push_context_line(&mut context, &fact.content);
            }
        }
        Ok(context)
    }

    /// Extracts tool parameters with a low-temperature model call, then
    /// dispatches the tool.
    async fn run_tool(&self, tool_name: &str, question: &str) -> Result<String, QueryError> {
        let prompt = build_tool_prompt(Utc::now(), question);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![user_message(&prompt)],
            temperature: Some(TOOL_EXTRACTION_TEMPERATURE),
        };
        let response = self.provider.chat(&request).await?;
        let params: HashMap<String, String> = serde_json::from_str(clean_json(&response.content))?;
        debug!(tool = tool_name, ?params, "dispatching tool");
        Ok(self.tools.dispatch(tool_name, &params).await?)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("model", &self.model)
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}
