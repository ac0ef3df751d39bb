// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group event handlers.

use ob_core::{Event, Group};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::GroupCreated { group_id, title, origin, created_by, at } => {
            state.groups.entry(group_id.clone()).or_insert_with(|| {
                Group::new(group_id.clone(), title.clone(), origin.clone(), created_by.clone(), *at)
            });
        }

        Event::GroupCompleted { group_id, at } => {
            if let Some(group) = state.groups.get_mut(group_id) {
                group.complete(*at);
            }
        }

        _ => {}
    }
}
