//! Host-level tools backed by operating system commands.
//!
//! Each tool shells out, captures stdout, and wraps it in a declarative
//! prefix so the output reads as a statement inside the answer prompt.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ToolError;

use super::Tool;

/// Runs `program args...` and returns trimmed stdout.
async fn run_command(name: &str, program: &str, args: &[&str]) -> Result<String, ToolError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| ToolError::Execution {
            name: name.to_string(),
            message: format!("cannot run {program}: {e}"),
        })?;

    if !output.status.success() {
        return Err(ToolError::Execution {
            name: name.to_string(),
            message: format!("{program} exited with {}", output.status),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Reports the machine hostname.
#[derive(Debug)]
pub struct HostnameTool;

#[async_trait]
impl Tool for HostnameTool {
    fn name(&self) -> &'static str {
        "hostname"
    }

    async fn run(&self, _params: &HashMap<String, String>) -> Result<String, ToolError> {
        let out = run_command(self.name(), "hostname", &[]).await?;
        Ok(format!("Your hostname is: {out}"))
    }
}

/// Reports network interfaces and addresses.
#[derive(Debug)]
pub struct NetworkTool;

#[async_trait]
impl Tool for NetworkTool {
    fn name(&self) -> &'static str {
        "ifconfig"
    }

    async fn run(&self, _params: &HashMap<String, String>) -> Result<String, ToolError> {
        let out = run_command(self.name(), "ifconfig", &[]).await?;
        Ok(format!("The network and ip configuration is: {out}"))
    }
}

/// Reports the current date and time on the host.
#[derive(Debug)]
pub struct DateTool;

#[async_trait]
impl Tool for DateTool {
    fn name(&self) -> &'static str {
        "date"
    }

    async fn run(&self, _params: &HashMap<String, String>) -> Result<String, ToolError> {
        let out = run_command(self.name(), "date", &[]).await?;
        Ok(format!("The current date and time is: {out}"))
    }
}

/// Reports filesystem disk usage.
#[derive(Debug)]
pub struct DiskTool;

#[async_trait]
impl Tool for DiskTool {
    fn name(&self) -> &'static str {
        "df"
    }

    async fn run(&self, _params: &HashMap<String, String>) -> Result<String, ToolError> {
        let out = run_command(self.name(), "df", &["-h"]).await?;
        Ok(format!("The disk usage information is: {out}"))
    }
}
