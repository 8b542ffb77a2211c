//! askd: a confidence-gated question-answering service.
//!
//! Queries flow through a fixed pipeline that prefers cheap, grounded
//! answers and only falls back to bare generation when nothing better
//! qualifies:
//!
//! ```text
//! POST /api/v1/llm
//!   ├── semantic cache lookup (hit strictly above threshold → done)
//!   ├── knowledge retrieval (vector store)
//!   │     ├── plain facts → context block, header written once
//!   │     └── tool descriptors → parameter extraction → tool dispatch
//!   ├── prompt assembly + generation
//!   └── gated cache write-back (confident, non-fallback answers only)
//! ```
//!
//! All similarity and confidence gates use strict comparison; a score
//! equal to its threshold never qualifies.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod store;
pub mod telemetry;
pub mod tokenizer;
pub mod tool;

pub use config::Config;
pub use error::{Error, QueryError, StoreError, ToolError};
pub use llm::{Answer, Orchestrator};
pub use telemetry::Metrics;
