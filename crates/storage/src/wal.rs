// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of [`ob_core::Event`]s (§4.1).
//!
//! Entries are newline-delimited JSON. A corrupt tail (partial write from a
//! crash, or any line that isn't valid UTF-8 JSON) is detected on open: the
//! valid prefix is kept, the original file is rotated to `.bak`, and a clean
//! file containing only the valid entries is written in its place.

use ob_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::WalError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

const FLUSH_COUNT_THRESHOLD: u64 = 100;
const FLUSH_INTERVAL: Duration = Duration::from_millis(200);
const MAX_BAK_FILES: u32 = 3;

pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    /// Byte offset into the file that `next_unprocessed` reads from next.
    read_pos: u64,
    buffer: Vec<u8>,
    unflushed: u64,
    last_flush: Instant,
}

impl Wal {
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let (valid_entries, corrupt, valid_bytes) = scan(&path)?;

        if corrupt {
            rotate_bak(&path);
            let mut clean = File::create(&path)?;
            for entry in &valid_entries {
                write_entry(&mut clean, entry)?;
            }
            clean.flush()?;
        }

        let write_seq = valid_entries.last().map(|e| e.seq).unwrap_or(0);
        let read_pos = offset_after_seq(&valid_entries, processed_seq).unwrap_or(0);
        let read_pos = if corrupt { read_pos.min(valid_bytes) } else { read_pos };

        let file = OpenOptions::new().read(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            write_seq,
            processed_seq,
            read_pos,
            buffer: Vec::new(),
            unflushed: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        self.buffer.extend_from_slice(line.as_bytes());
        self.buffer.push(b'\n');
        self.unflushed += 1;
        Ok(entry.seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        if !self.buffer.is_empty() {
            self.file.write_all(&self.buffer)?;
            self.file.flush()?;
            self.buffer.clear();
        }
        self.unflushed = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn needs_flush(&self) -> bool {
        self.unflushed >= FLUSH_COUNT_THRESHOLD
            || (self.unflushed > 0 && self.last_flush.elapsed() >= FLUSH_INTERVAL)
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = seq;
    }

    /// Read the next sequential entry after the read cursor. A corrupt or
    /// non-UTF-8 line is consumed (so it is never retried) and yields
    /// `Ok(None)` for this call; the caller should call again to continue
    /// past it.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(self.read_pos))?;

        let mut raw = Vec::new();
        let read = reader.read_until(b'\n', &mut raw)?;
        if read == 0 {
            return Ok(None);
        }
        self.read_pos += read as u64;

        match parse_line(&raw) {
            Some(entry) => Ok(Some(entry)),
            None => Ok(None),
        }
    }

    /// Read all valid entries with `seq > after`, stopping at the first
    /// corrupt line encountered.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        let (entries, _corrupt, _bytes) = scan(&self.path)?;
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Drop entries with `seq < before` from the log (used after a
    /// successful checkpoint to bound replay time).
    pub fn truncate_before(&mut self, before: u64) -> Result<(), WalError> {
        self.flush()?;
        let (entries, _corrupt, _bytes) = scan(&self.path)?;
        let kept: Vec<_> = entries.into_iter().filter(|e| e.seq >= before).collect();

        let mut clean = File::create(&self.path)?;
        for entry in &kept {
            write_entry(&mut clean, entry)?;
        }
        clean.flush()?;

        self.file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        self.read_pos = offset_after_seq(&kept, self.processed_seq.max(before.saturating_sub(1))).unwrap_or(0);
        Ok(())
    }
}

fn write_entry(f: &mut File, entry: &WalEntry) -> Result<(), WalError> {
    let line = serde_json::to_string(entry)?;
    f.write_all(line.as_bytes())?;
    f.write_all(b"\n")?;
    Ok(())
}

fn parse_line(raw: &[u8]) -> Option<WalEntry> {
    let text = std::str::from_utf8(raw).ok()?;
    let trimmed = text.trim_end_matches('\n');
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// Scan `path` from the start, parsing one JSON line per entry. Returns the
/// valid entries read before the first corrupt/invalid line (if any), whether
/// corruption was found, and the byte length of the valid prefix.
fn scan(path: &Path) -> Result<(Vec<WalEntry>, bool, u64), WalError> {
    if !path.exists() {
        File::create(path)?;
        return Ok((Vec::new(), false, 0));
    }

    let mut file = File::open(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;

    let mut entries = Vec::new();
    let mut offset: u64 = 0;
    let mut valid_bytes: u64 = 0;
    let mut corrupt = false;

    for line in contents.split_inclusive(|&b| b == b'\n') {
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(entry) => {
                entries.push(entry);
                offset += line.len() as u64;
                valid_bytes = offset;
            }
            None => {
                corrupt = true;
                break;
            }
        }
    }

    Ok((entries, corrupt, valid_bytes))
}

/// Byte offset in a freshly-rewritten, fully-valid log, positioned right
/// after the entry whose `seq == after` (or 0 if `after` is 0 / not found).
fn offset_after_seq(entries: &[WalEntry], after: u64) -> Option<u64> {
    if after == 0 {
        return Some(0);
    }
    let mut offset = 0u64;
    for entry in entries {
        let line_len = serde_json::to_string(entry).ok()?.len() as u64 + 1;
        offset += line_len;
        if entry.seq == after {
            return Some(offset);
        }
    }
    Some(offset)
}

fn rotate_bak(path: &Path) {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    let _ = fs::rename(path, bak(1));
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
