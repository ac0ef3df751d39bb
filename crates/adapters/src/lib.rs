// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ob-adapters: narrow interfaces for external collaborators (§9
//! "duck-typed managers ⇒ interface-per-collaborator") — the `AgentRunner`,
//! `WorktreeManager`, and `ContextProvider` traits, plus the real
//! implementations the server binary wires up by default.

mod agent_runner;
mod context;
mod error;
mod worktree;

pub use agent_runner::{AgentRunner, RunOutput, RunUsage, SubprocessAgentRunner};
pub use context::{ContextProvider, ContextProviderRegistry};
pub use error::AdapterError;
pub use worktree::{validate_branch_name, GitWorktreeManager, Worktree, WorktreeManager};

#[cfg(feature = "test-support")]
pub use agent_runner::fake::FakeAgentRunner;
#[cfg(feature = "test-support")]
pub use worktree::fake::FakeWorktreeManager;
