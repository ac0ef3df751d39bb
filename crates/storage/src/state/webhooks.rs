// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook event handlers.

use ob_core::{Event, Webhook};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::WebhookCreated { webhook_id, url, events, secret, at } => {
            state.webhooks.entry(webhook_id.clone()).or_insert_with(|| {
                Webhook::new(webhook_id.clone(), url.clone(), events.clone(), secret.clone(), *at)
            });
        }

        Event::WebhookDeleted { webhook_id } => {
            state.webhooks.remove(webhook_id);
        }

        Event::WebhookTriggered { webhook_id, at } => {
            if let Some(webhook) = state.webhooks.get_mut(webhook_id) {
                webhook.mark_triggered(*at);
            }
        }

        _ => {}
    }
}
