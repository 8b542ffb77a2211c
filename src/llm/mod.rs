//! LLM integration: provider abstraction, prompt assembly, answer
//! decoding, and the query orchestrator.

pub mod answer;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use answer::{Answer, clean_json};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, system_message, user_message};
pub use orchestrator::{ANSWER_TYPE_FINAL, Orchestrator};
pub use provider::LlmProvider;
pub use providers::OpenAiProvider;
