// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Store (§4.1): single-writer persistence built from a write-ahead log
//! plus an in-memory [`MaterializedState`] rebuilt by replaying it.

use chrono::{DateTime, Utc};
use ob_core::{Event, Task, TaskStatus};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::error::{StorageError, WalError};
use crate::migration::MigrationRegistry;
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::wal::Wal;

const WAL_FILE: &str = "ob.wal";
const SNAPSHOT_FILE: &str = "ob.snapshot.json";

struct Inner {
    state: MaterializedState,
    wal: Wal,
}

/// Durable, single-writer store. All mutations go through the writer lock;
/// reads may take a cheap clone of the current state without it.
pub struct Store {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl Store {
    /// Open (or create) the store at `dir`, replaying the WAL on top of the
    /// most recent snapshot if one exists.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(WalError::Io)?;

        let registry = MigrationRegistry::new();
        let snapshot = Snapshot::load(&dir.join(SNAPSHOT_FILE), &registry)?;

        let mut state = snapshot.as_ref().map(|s| s.state.clone()).unwrap_or_default();
        let processed_seq = snapshot.as_ref().map(|s| s.seq).unwrap_or(0);

        let mut wal = Wal::open(dir.join(WAL_FILE), processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        Ok(Self { dir, inner: Mutex::new(Inner { state, wal }) })
    }

    /// Monotonic per-prefix ID mint, serialized by the writer lock.
    pub fn mint_id(&self, prefix: &str) -> String {
        self.inner.lock().state.id_counters.mint(prefix)
    }

    /// Append and apply a single event. Durable once this returns: no
    /// caller observes the mutation until the WAL record has been flushed.
    pub fn append(&self, event: Event) -> Result<u64, StorageError> {
        let mut guard = self.inner.lock();
        let seq = guard.wal.append(&event)?;
        guard.state.apply_event(&event);
        guard.wal.flush()?;
        Ok(seq)
    }

    /// A read-only clone of the current state, safe to use without holding
    /// the writer lock for the duration of the read.
    pub fn read_snapshot(&self) -> MaterializedState {
        self.inner.lock().state.clone()
    }

    /// The atomic claim (§4.4.2): select the highest-priority, oldest
    /// pending task assigned to `role`, mutate it, append the resulting
    /// event, and return the clone — all under one critical section.
    pub fn claim_next(&self, role: &str, instance: &str, now: DateTime<Utc>) -> Result<Option<Task>, StorageError> {
        let mut guard = self.inner.lock();

        let candidate_id = guard
            .state
            .tasks
            .values()
            .filter(|t| t.is_claimable_by(role))
            .min_by_key(|t| t.claim_sort_key())
            .map(|t| t.id.clone());

        let Some(task_id) = candidate_id else { return Ok(None) };

        let event = Event::TaskClaimed { task_id: task_id.clone(), instance_id: instance.to_string(), at: now };
        guard.wal.append(&event)?;
        guard.state.apply_event(&event);
        guard.wal.flush()?;

        Ok(guard.state.tasks.get(&task_id).cloned())
    }

    /// Scoped, all-or-nothing access: `f` reads the current state and
    /// returns the events to persist plus a result. On `Ok`, every event is
    /// appended and applied in order under the same critical section; on
    /// `Err`, nothing is persisted.
    pub fn transaction<R, E>(
        &self,
        f: impl FnOnce(&MaterializedState) -> Result<(Vec<Event>, R), E>,
    ) -> Result<R, E>
    where
        E: From<StorageError>,
    {
        let mut guard = self.inner.lock();
        let (events, result) = f(&guard.state)?;
        for event in &events {
            guard.wal.append(event).map_err(StorageError::from)?;
            guard.state.apply_event(event);
        }
        guard.wal.flush().map_err(StorageError::from)?;
        Ok(result)
    }

    /// Force a snapshot and WAL truncation. Idempotent; safe to call on a
    /// timer or during clean shutdown.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        let mut guard = self.inner.lock();
        guard.wal.flush()?;
        let seq = guard.wal.write_seq();
        let snapshot = Snapshot::new(seq, guard.state.clone(), Utc::now());
        snapshot.save(&self.dir.join(SNAPSHOT_FILE))?;
        guard.wal.truncate_before(seq + 1)?;
        guard.wal.mark_processed(seq);
        Ok(())
    }

    /// Recover tasks left `in_progress` by a crashed worker (§4.4.7).
    pub fn recover_orphaned_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let mut guard = self.inner.lock();
        let orphaned: Vec<String> = guard
            .state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::InProgress)
            .map(|t| t.id.clone())
            .collect();

        let mut recovered = Vec::new();
        for id in orphaned {
            if let Some(task) = guard.state.tasks.get_mut(&id) {
                task.status = TaskStatus::Pending;
                task.claimed_by = None;
                task.started_at = None;
                recovered.push(task.clone());
            }
        }
        Ok(recovered)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
