// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors from external-collaborator adapters (§9 "duck-typed managers ⇒
//! interface-per-collaborator").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("agent runner spawn failed: {0}")]
    SpawnFailed(String),
    #[error("agent runner exited non-zero: {0}")]
    NonZeroExit(String),
    #[error("path escapes project root: {0}")]
    PathEscape(String),
    #[error("unsafe branch name: {0}")]
    UnsafeBranch(String),
    #[error("git command failed: {0}")]
    GitFailed(String),
    #[error("context provider {0} failed: {1}")]
    ContextProvider(String, String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
