// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context Providers (§4.5.4): optional, pluggable extras folded into prompt
//! assembly. The registry caches each provider's output per scope until its
//! TTL expires; providers that return an empty string are never cached, and
//! a provider that errors is logged and skipped for that assembly (§4.5.3).

use async_trait::async_trait;
use ob_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::error::AdapterError;

/// A pluggable source of extra prompt context, e.g. "recent commits" or
/// "open incidents". `scope` is caller-defined (typically a task or group
/// ID) and lets the registry cache per-subject rather than globally.
#[async_trait]
pub trait ContextProvider: Send + Sync + 'static {
    fn name(&self) -> &str;
    fn ttl_seconds(&self) -> u64;
    async fn gather(&self, scope: &str) -> Result<String, AdapterError>;
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Holds the configured providers and their cached output. `gather_all`
/// never propagates a provider's error — it logs and omits that provider's
/// contribution, per §4.5.3.
pub struct ContextProviderRegistry<C: Clock> {
    providers: Vec<Arc<dyn ContextProvider>>,
    cache: Mutex<HashMap<(String, String), CacheEntry>>,
    clock: C,
}

impl<C: Clock> ContextProviderRegistry<C> {
    pub fn new(clock: C) -> Self {
        Self { providers: Vec::new(), cache: Mutex::new(HashMap::new()), clock }
    }

    pub fn register(&mut self, provider: Arc<dyn ContextProvider>) {
        self.providers.push(provider);
    }

    /// Gather every registered provider's contribution for `scope`, in
    /// registration order. Cache hits skip the `gather` call entirely.
    pub async fn gather_all(&self, scope: &str) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let key = (provider.name().to_string(), scope.to_string());

            if let Some(entry) = self.cache.lock().get(&key) {
                if entry.expires_at > self.clock.now() {
                    out.push((provider.name().to_string(), entry.value.clone()));
                    continue;
                }
            }

            match provider.gather(scope).await {
                Ok(value) if value.is_empty() => {}
                Ok(value) => {
                    let expires_at = self.clock.now() + std::time::Duration::from_secs(provider.ttl_seconds());
                    self.cache.lock().insert(key, CacheEntry { value: value.clone(), expires_at });
                    out.push((provider.name().to_string(), value));
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "context provider failed, skipping");
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
