// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestration-level errors. HTTP handlers in `ob-server` translate these
//! to the status codes in §7.

use ob_adapters::AdapterError;
use ob_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("dependency cycle: task {task} blocked_by {blocked_by}")]
    CycleDetected { task: String, blocked_by: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
