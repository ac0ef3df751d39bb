// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Webhook Manager (§4.7): best-effort outbound delivery of bus events
//! to registered HTTP endpoints. Subscribes to the Event Bus with `"*"`;
//! each delivery runs on its own `tokio::spawn`ed task so a slow or
//! unreachable endpoint never delays another subscriber.

use chrono::Utc;
use hmac::{Hmac, Mac};
use ob_core::{Event, Webhook};
use ob_storage::Store;
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::event_bus::EventBus;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Serialize)]
struct WebhookEnvelope<'a> {
    event: &'a str,
    data: &'a serde_json::Value,
    timestamp: chrono::DateTime<Utc>,
}

/// Registers/unregisters webhooks and forwards bus events to them.
pub struct WebhookManager {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    client: reqwest::Client,
    forwarder: AsyncMutex<Option<JoinHandle<()>>>,
}

impl WebhookManager {
    pub fn new(store: Arc<Store>, bus: Arc<EventBus>) -> Self {
        let timeout_ms = std::env::var("OB_WEBHOOK_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self { store, bus, client, forwarder: AsyncMutex::new(None) }
    }

    pub fn create_webhook(
        &self,
        url: impl Into<String>,
        events: Vec<String>,
        secret: Option<String>,
    ) -> Result<Webhook, EngineError> {
        let webhook_id = self.store.mint_id("WH");
        let now = Utc::now();
        self.store.append(Event::WebhookCreated {
            webhook_id: webhook_id.clone(),
            url: url.into(),
            events,
            secret,
            at: now,
        })?;
        self.get_webhook(&webhook_id)
    }

    pub fn delete_webhook(&self, webhook_id: &str) -> Result<(), EngineError> {
        self.get_webhook(webhook_id)?;
        self.store.append(Event::WebhookDeleted { webhook_id: webhook_id.to_string() })?;
        Ok(())
    }

    pub fn get_webhook(&self, webhook_id: &str) -> Result<Webhook, EngineError> {
        self.store
            .read_snapshot()
            .webhooks
            .get(webhook_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("webhook {webhook_id}")))
    }

    pub fn get_webhooks(&self) -> Vec<Webhook> {
        let mut webhooks: Vec<Webhook> = self.store.read_snapshot().webhooks.into_values().collect();
        webhooks.sort_by(|a, b| a.id.cmp(&b.id));
        webhooks
    }

    /// §4.7: deliver `event` to every active webhook whose `events` list
    /// contains its name or `"*"`. Each delivery is an independent spawned
    /// task; failures are logged, never propagated.
    pub fn fire(&self, event: &Event, data: serde_json::Value) {
        let targets: Vec<Webhook> =
            self.store.read_snapshot().webhooks.into_values().filter(|w| w.matches(event.name())).collect();
        if targets.is_empty() {
            return;
        }

        let envelope = WebhookEnvelope { event: event.name(), data: &data, timestamp: Utc::now() };
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "failed to serialize webhook envelope");
                return;
            }
        };

        for webhook in targets {
            let client = self.client.clone();
            let store = self.store.clone();
            let body = body.clone();
            let event_name = event.name().to_string();
            tokio::spawn(async move {
                let mut request = client.post(&webhook.url).header("Content-Type", "application/json").body(body.clone());
                if let Some(secret) = &webhook.secret {
                    match sign(secret, &body) {
                        Ok(signature) => request = request.header("X-Webhook-Signature", signature),
                        Err(e) => tracing::warn!(webhook_id = %webhook.id, error = %e, "failed to sign webhook payload"),
                    }
                }

                match request.send().await {
                    Ok(response) if !response.status().is_success() => {
                        tracing::warn!(url = %webhook.url, event = %event_name, status = %response.status(), "webhook delivery returned non-2xx");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(url = %webhook.url, event = %event_name, error = %e, "webhook delivery failed");
                    }
                }

                if let Err(e) = store.append(Event::WebhookTriggered { webhook_id: webhook.id.clone(), at: Utc::now() }) {
                    tracing::warn!(webhook_id = %webhook.id, error = %e, "failed to record webhook trigger");
                }
            });
        }
    }

    /// §4.8: subscribe to the Event Bus with `"*"` and forward every event
    /// to matching webhooks until `stop` is called.
    pub async fn start(self: &Arc<Self>) {
        let mut guard = self.forwarder.lock().await;
        if guard.is_some() {
            return;
        }
        let mut rx = self.bus.subscribe("*");
        let manager = self.clone();
        *guard = Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let data = serde_json::to_value(&event).unwrap_or(serde_json::Value::Null);
                manager.fire(&event, data);
            }
        }));
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.forwarder.lock().await.take() {
            handle.abort();
        }
    }
}

fn sign(secret: &str, body: &[u8]) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
#[path = "webhook_manager_tests.rs"]
mod tests;
