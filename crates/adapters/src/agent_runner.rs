// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Runner (§4.5.2 step d): the external LLM driver, invoked as
//! `run(prompt, cwd) -> {text, usage}`. Opaque to the core (§1); this crate
//! supplies the narrow trait plus one subprocess-based implementation that
//! shells out to an LLM CLI.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::AdapterError;

/// Cumulative token/cost usage reported by one agent invocation (§4.5.2e: the
/// per-task input/output tokens, cost, duration, turns persisted by the
/// Agent Loop after a run completes).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub num_turns: u32,
}

impl RunUsage {
    /// Parse usage from a JSON object such as the trailing summary line an
    /// LLM CLI may emit after its transcript.
    fn from_json(json: &serde_json::Value) -> Self {
        Self {
            input_tokens: json.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            output_tokens: json.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            cache_read_tokens: json.get("cache_read_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            cache_write_tokens: json
                .get("cache_write_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
            cost_usd: json.get("cost_usd").and_then(|v| v.as_f64()).unwrap_or(0.0),
            duration_ms: json.get("duration_ms").and_then(|v| v.as_u64()).unwrap_or(0),
            num_turns: json.get("num_turns").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        }
    }
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub text: String,
    pub usage: Option<RunUsage>,
}

/// Drives one task's worth of LLM work. Opaque to the core: the Agent Loop
/// only ever calls `run` and persists whatever usage comes back.
#[async_trait]
pub trait AgentRunner: Send + Sync + 'static {
    async fn run(&self, prompt: &str, cwd: &Path) -> Result<RunOutput, AdapterError>;
}

/// Shells out to a configured LLM CLI, feeding the prompt on stdin and
/// reading the transcript from stdout. If the last line of stdout parses as
/// a JSON object, it is treated as a usage summary and stripped from the
/// returned text.
pub struct SubprocessAgentRunner {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessAgentRunner {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self { command: command.into(), args, timeout: Duration::from_secs(600) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AgentRunner for SubprocessAgentRunner {
    async fn run(&self, prompt: &str, cwd: &Path) -> Result<RunOutput, AdapterError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AdapterError::SpawnFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            // Some CLIs exit before consuming stdin; a broken pipe here is
            // not fatal, the exit status and stderr below are authoritative.
            let _ = stdin.write_all(prompt.as_bytes()).await;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AdapterError::SpawnFailed(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| AdapterError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::NonZeroExit(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(split_usage_tail(&stdout))
    }
}

/// If the last non-empty line of `stdout` parses as a JSON object, treat it
/// as the run's usage summary and exclude it from the returned text.
fn split_usage_tail(stdout: &str) -> RunOutput {
    let trimmed = stdout.trim_end();
    let Some(last_newline) = trimmed.rfind('\n') else {
        return parse_whole(trimmed);
    };
    let (head, tail) = trimmed.split_at(last_newline);
    let tail = tail.trim_start_matches('\n');
    match serde_json::from_str::<serde_json::Value>(tail) {
        Ok(value) if value.is_object() => {
            RunOutput { text: head.to_string(), usage: Some(RunUsage::from_json(&value)) }
        }
        _ => RunOutput { text: trimmed.to_string(), usage: None },
    }
}

fn parse_whole(text: &str) -> RunOutput {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) if value.is_object() => {
            RunOutput { text: String::new(), usage: Some(RunUsage::from_json(&value)) }
        }
        _ => RunOutput { text: text.to_string(), usage: None },
    }
}

#[cfg(feature = "test-support")]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Records calls and returns scripted `RunOutput`s in order, for
    /// `ob-engine` tests that need an `AgentRunner` without a real CLI.
    pub struct FakeAgentRunner {
        responses: Mutex<VecDeque<Result<RunOutput, String>>>,
        calls: Mutex<Vec<(String, std::path::PathBuf)>>,
    }

    impl FakeAgentRunner {
        pub fn new() -> Self {
            Self { responses: Mutex::new(VecDeque::new()), calls: Mutex::new(Vec::new()) }
        }

        pub fn push_success(&self, output: RunOutput) {
            self.responses.lock().push_back(Ok(output));
        }

        pub fn push_failure(&self, message: impl Into<String>) {
            self.responses.lock().push_back(Err(message.into()));
        }

        pub fn calls(&self) -> Vec<(String, std::path::PathBuf)> {
            self.calls.lock().clone()
        }
    }

    impl Default for FakeAgentRunner {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AgentRunner for FakeAgentRunner {
        async fn run(&self, prompt: &str, cwd: &Path) -> Result<RunOutput, AdapterError> {
            self.calls.lock().push((prompt.to_string(), cwd.to_path_buf()));
            match self.responses.lock().pop_front() {
                Some(Ok(output)) => Ok(output),
                Some(Err(message)) => Err(AdapterError::NonZeroExit(message)),
                None => Ok(RunOutput { text: String::new(), usage: None }),
            }
        }
    }
}

#[cfg(test)]
#[path = "agent_runner_tests.rs"]
mod tests;
