//! Service entry point: CLI parsing, wiring, and the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use askd::api::{AppState, create_router};
use askd::config::Config;
use askd::llm::{OpenAiProvider, Orchestrator};
use askd::store::{
    CacheStore, Embedder, OpenAiEmbedder, RetrieverStore, SemanticIndex, VectorCollection,
    open_vector_db,
};
use askd::telemetry::{Metrics, init_tracing};
use askd::tokenizer::TokenCounter;
use askd::tool::{SeriesTool, ToolRouter, open_tool_db};

/// Collection name for the semantic answer cache.
const CACHE_COLLECTION: &str = "cache";
/// Collection name for the knowledge base.
const RAG_COLLECTION: &str = "rag";

/// Confidence-gated question-answering service.
///
/// Answers queries through a semantic cache, a vector knowledge base,
/// deterministic tools, and an LLM fallback, served over HTTP.
#[derive(Parser, Debug)]
#[command(name = "askd")]
#[command(version, about, long_about = None)]
struct Cli {
    /// HTTP listen address.
    #[arg(long, env = "ASKD_ADDR")]
    addr: Option<String>,

    /// Generative model for answers and tool-parameter extraction.
    #[arg(long, env = "ASKD_LLM_MODEL")]
    llm_model: Option<String>,

    /// Embedding model for the semantic stores.
    #[arg(long, env = "ASKD_EMBED_MODEL")]
    embed_model: Option<String>,

    /// Sampling temperature for the answer path.
    #[arg(long, env = "ASKD_TEMPERATURE")]
    temperature: Option<f32>,

    /// Similarity a fact must strictly exceed to join the context.
    #[arg(long, env = "ASKD_MIN_CONFIDENCE_RAG")]
    min_confidence_rag: Option<f32>,

    /// Similarity a tool descriptor must strictly exceed to dispatch.
    #[arg(long, env = "ASKD_MIN_CONFIDENCE_TOOL")]
    min_confidence_tool: Option<f32>,

    /// Similarity/confidence gate for cache hits and write-backs.
    #[arg(long, env = "ASKD_MIN_CONFIDENCE_CACHE")]
    min_confidence_cache: Option<f32>,

    /// Path to the SQLite file holding the semantic collections.
    #[arg(long, env = "ASKD_VECTOR_DB")]
    vector_db: Option<PathBuf>,

    /// Path to the SQLite file holding KPI time-series rows.
    #[arg(long, env = "ASKD_TOOL_DB")]
    tool_db: Option<PathBuf>,
}

impl Cli {
    /// Resolves configuration: CLI flags, then environment, then defaults.
    fn into_config(self) -> Result<Config, askd::Error> {
        let mut builder = Config::builder();
        if let Some(addr) = self.addr {
            builder = builder.listen_addr(addr);
        }
        if let Some(model) = self.llm_model {
            builder = builder.llm_model(model);
        }
        if let Some(model) = self.embed_model {
            builder = builder.embed_model(model);
        }
        if let Some(t) = self.temperature {
            builder = builder.temperature(t);
        }
        if let Some(t) = self.min_confidence_rag {
            builder = builder.min_confidence_rag(t);
        }
        if let Some(t) = self.min_confidence_tool {
            builder = builder.min_confidence_tool(t);
        }
        if let Some(t) = self.min_confidence_cache {
            builder = builder.min_confidence_cache(t);
        }
        if let Some(path) = self.vector_db {
            builder = builder.vector_db_path(path);
        }
        if let Some(path) = self.tool_db {
            builder = builder.tool_db_path(path);
        }
        builder.from_env().build()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Cli::parse().into_config().context("invalid configuration")?;

    let vector_conn =
        open_vector_db(&config.vector_db_path).context("opening vector database")?;
    let tool_conn = open_tool_db(&config.tool_db_path).context("opening tool database")?;

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config));
    let cache_index: Arc<dyn SemanticIndex> = Arc::new(VectorCollection::new(
        Arc::clone(&vector_conn),
        CACHE_COLLECTION,
        Arc::clone(&embedder),
    ));
    let rag_index: Arc<dyn SemanticIndex> = Arc::new(VectorCollection::new(
        vector_conn,
        RAG_COLLECTION,
        embedder,
    ));

    let metrics = Arc::new(Metrics::new());
    let token_counter = TokenCounter::new().context("loading tokenizer")?;
    let provider = Arc::new(OpenAiProvider::new(&config));
    let tools = ToolRouter::with_builtins(SeriesTool::new(tool_conn));

    let orchestrator = Arc::new(Orchestrator::new(
        &config,
        provider,
        CacheStore::new(Arc::clone(&cache_index)),
        RetrieverStore::new(Arc::clone(&rag_index)),
        tools,
        token_counter,
        Arc::clone(&metrics),
    ));

    let state = AppState {
        orchestrator,
        cache: Arc::new(CacheStore::new(cache_index)),
        retriever: Arc::new(RetrieverStore::new(rag_index)),
        metrics,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, model = %config.llm_model, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
