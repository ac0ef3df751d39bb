// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ob-storage: the write-ahead log, materialized state, and Store (§4.1).

mod error;
mod migration;
mod snapshot;
mod state;
mod store;
mod wal;

pub use error::{MigrationError, SnapshotError, StorageError, WalError};
pub use migration::{Migration, MigrationRegistry};
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::{AgentMessage, MaterializedState};
pub use store::Store;
pub use wal::{Wal, WalEntry};
