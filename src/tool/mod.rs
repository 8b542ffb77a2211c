//! Deterministic tools and the router that dispatches to them.
//!
//! Tools produce facts that cannot live in the knowledge base because
//! they change over time (host state, KPI series). The router resolves
//! names coming out of retrieved tool descriptors; an unrecognized name
//! falls through to the KPI series tool, which is the one whose inputs
//! the parameter-extraction call is tuned for.

pub mod os;
pub mod series;

pub use series::{SeriesTool, open_tool_db};

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ToolError;

use os::{DateTool, DiskTool, HostnameTool, NetworkTool};

/// Parameter key the router injects with the resolved tool name.
pub const PARAM_TOOL: &str = "tool";

/// A deterministic, side-effect-free information source.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name the router dispatches on.
    fn name(&self) -> &'static str;

    /// Runs the tool with extracted parameters, returning a statement
    /// suitable for inclusion in the answer prompt.
    async fn run(&self, params: &HashMap<String, String>) -> Result<String, ToolError>;
}

/// Dispatches tool descriptors to registered tools.
pub struct ToolRouter {
    tools: HashMap<&'static str, Box<dyn Tool>>,
    default_tool: Box<dyn Tool>,
}

impl ToolRouter {
    /// Builds an empty router with the given fallback tool.
    #[must_use]
    pub fn new(default_tool: Box<dyn Tool>) -> Self {
        Self {
            tools: HashMap::new(),
            default_tool,
        }
    }

    /// Builds a router over the standard tool set, with the KPI series
    /// tool as the fallback for unrecognized names.
    #[must_use]
    pub fn with_builtins(series: SeriesTool) -> Self {
        let mut router = Self::new(Box::new(series));
        router.register(Box::new(HostnameTool));
        router.register(Box::new(NetworkTool));
        router.register(Box::new(DateTool));
        router.register(Box::new(DiskTool));
        router
    }

    /// Registers a tool under its own name, replacing any previous
    /// registration.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Runs the named tool with the given parameters.
    ///
    /// Parameter keys are lowercased before dispatch, and the resolved
    /// tool name is injected under [`PARAM_TOOL`] so tools can tell how
    /// they were invoked. An unknown name dispatches to the default
    /// tool.
    ///
    /// # Errors
    ///
    /// Propagates the tool's own failure; a tool failure is fatal to
    /// the query that requested it.
    pub async fn dispatch(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<String, ToolError> {
        let mut params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        params.insert(PARAM_TOOL.to_string(), name.to_string());

        let tool = self
            .tools
            .get(name)
            .unwrap_or(&self.default_tool);
        tool.run(&params).await
    }
}

impl std::fmt::Debug for ToolRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRouter")
            .field("tools", &names)
            .field("default", &self.default_tool.name())
            .finish()
    }
}
