// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code execution tool.
//!
//! Runs a snippet through the configured interpreter (`python3 -I -c` by
//! default) as a child process. The process is killed when the timeout
//! expires, and captured output is capped.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cairn_config::model::ToolsConfig;
use cairn_core::CairnError;
use serde_json::{json, Value};
use tracing::debug;

use crate::tool::Tool;

pub struct ExecuteCodeTool {
    interpreter: String,
    args: Vec<String>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl ExecuteCodeTool {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            interpreter: config.code_interpreter.clone(),
            args: config.code_args.clone(),
            timeout: Duration::from_secs(config.code_timeout_secs),
            max_output_bytes: config.max_output_bytes,
        }
    }
}

/// Lossy UTF-8 of `bytes`, cut to at most `max` bytes on a char boundary.
fn capped(bytes: &[u8], max: usize) -> (String, bool) {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= max {
        return (text.into_owned(), false);
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (text[..end].to_string(), true)
}

#[async_trait]
impl Tool for ExecuteCodeTool {
    fn name(&self) -> &str {
        "execute_code"
    }

    fn description(&self) -> &str {
        "Execute a code snippet and return its standard output"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Source code to run"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, parameters: Value) -> Result<Value, CairnError> {
        let code = parameters
            .get("code")
            .and_then(Value::as_str)
            .ok_or_else(|| CairnError::tool(self.name(), "missing required 'code' parameter"))?;

        let child = tokio::process::Command::new(&self.interpreter)
            .args(&self.args)
            .arg(code)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CairnError::tool(
                    self.name(),
                    format!("failed to start `{}`: {e}", self.interpreter),
                ));
            }
            Err(_) => {
                return Err(CairnError::tool(
                    self.name(),
                    format!("execution timed out after {}s", self.timeout.as_secs()),
                ));
            }
        };

        let (stdout, stdout_truncated) = capped(&output.stdout, self.max_output_bytes);
        let (stderr, stderr_truncated) = capped(&output.stderr, self.max_output_bytes);
        debug!(status = %output.status, stdout_bytes = output.stdout.len(), "code executed");

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(CairnError::tool(
                self.name(),
                format!("exit code {exit_code}: {}", stderr.trim()),
            ));
        }

        Ok(json!({
            "stdout": stdout,
            "stderr": stderr,
            "exit_code": 0,
            "truncated": stdout_truncated || stderr_truncated,
        }))
    }
}
