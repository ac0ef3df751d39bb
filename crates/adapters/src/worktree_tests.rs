// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    leading_dash = { "-rf" },
    contains_semicolon = { "feature;rm -rf" },
    contains_backtick = { "feat`whoami`" },
    contains_dollar = { "feat$(whoami)" },
    contains_space = { "feat ure" },
    empty = { "" },
)]
fn rejects_unsafe_branch_name(branch: &str) {
    assert!(validate_branch_name(branch).is_err());
}

#[parameterized(
    simple = { "ob/CD-001" },
    with_dashes = { "ob/feature-add-thing" },
)]
fn accepts_safe_branch_name(branch: &str) {
    assert!(validate_branch_name(branch).is_ok());
}

#[test]
fn rejects_task_id_with_path_traversal() {
    assert!(validate_task_id("../../etc/passwd").is_err());
    assert!(validate_task_id("a/b").is_err());
    assert!(validate_task_id("").is_err());
}

#[test]
fn accepts_plain_task_id() {
    assert!(validate_task_id("CD-001").is_ok());
}

#[tokio::test]
async fn validate_within_root_rejects_escaping_path() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("worktrees");
    tokio::fs::create_dir_all(&root).await.unwrap();

    let outside = dir.path().join("outside");
    tokio::fs::create_dir_all(&outside).await.unwrap();

    assert!(validate_within_root(&root, &root.join("task-1")).is_ok());
    assert!(validate_within_root(&root, &outside.join("task-1")).is_err());
}
