//! Failover, fan-out and single-shot broadcast over a list of endpoints.
//!
//! Reads walk the endpoints in priority order. A retryable failure marks the
//! endpoint `Degraded` and moves on; a definitive API error ends the call at
//! once. When every endpoint failed, up to `max_retries` more rounds run
//! without backoff. Only a call that ends exhausted marks endpoints `Dead`.
//!
//! Health changes are collected per read and applied once the read is done.
//! A fan-out merges the outcomes of all its reads, and the worst state seen
//! for an endpoint wins.
//!
//! Broadcasts make exactly one attempt on one endpoint. Pushing a signed
//! transaction to a second node is the caller's decision
//! ([`Multiplexer::broadcast_via`]).

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{self, StreamExt};

use crate::endpoint::{Capability, Endpoint, EndpointHealth, Health};
use crate::error::ProviderError;
use crate::target::Target;
use crate::transport::{Request, Transport};

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplexerConfig {
    /// Extra rounds after every endpoint failed once.
    pub max_retries: u8,
    /// Concurrent requests during a fan-out.
    pub max_concurrency: usize,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            max_concurrency: 4,
        }
    }
}

pub struct Multiplexer {
    endpoints: Vec<Endpoint>,
    health: Mutex<Vec<Health>>,
    transport: Arc<dyn Transport>,
    config: MultiplexerConfig,
}

impl std::fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multiplexer")
            .field("endpoints", &self.endpoints)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Multiplexer {
    pub fn new(
        endpoints: Vec<Endpoint>,
        transport: Arc<dyn Transport>,
        config: MultiplexerConfig,
    ) -> Result<Self, ProviderError> {
        if endpoints.is_empty() {
            return Err(ProviderError::Unsupported("no endpoints configured".into()));
        }
        if config.max_retries > MAX_RETRIES_LIMIT {
            return Err(ProviderError::Unsupported(format!(
                "max_retries {} exceeds {MAX_RETRIES_LIMIT}",
                config.max_retries
            )));
        }
        let health = Mutex::new(vec![Health::Alive; endpoints.len()]);
        Ok(Self {
            endpoints,
            health,
            transport,
            config: MultiplexerConfig {
                max_concurrency: config.max_concurrency.max(1),
                ..config
            },
        })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    fn health_guard(&self) -> MutexGuard<'_, Vec<Health>> {
        self.health.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reset_health(&self) {
        self.health_guard().fill(Health::Alive);
    }

    fn mark(&self, index: usize, health: Health) {
        if let Some(slot) = self.health_guard().get_mut(index) {
            *slot = health;
        }
    }

    /// Applies collected outcomes. An endpoint never improves within one
    /// batch, so `Dead` beats `Degraded` beats `Alive`.
    fn apply(&self, outcomes: impl IntoIterator<Item = (usize, Health)>) {
        let mut health = self.health_guard();
        for (index, outcome) in outcomes {
            if let Some(slot) = health.get_mut(index) {
                *slot = (*slot).max(outcome);
            }
        }
    }

    pub fn health_snapshot(&self) -> Vec<EndpointHealth> {
        let health = self.health_guard();
        self.endpoints
            .iter()
            .zip(health.iter())
            .enumerate()
            .map(|(index, (endpoint, health))| EndpointHealth {
                index,
                url: endpoint.url.to_string(),
                health: *health,
            })
            .collect()
    }

    fn capable(&self, capability: Capability) -> Vec<usize> {
        self.endpoints
            .iter()
            .enumerate()
            .filter(|(_, e)| e.supports(capability))
            .map(|(i, _)| i)
            .collect()
    }

    /// One attempt against one endpoint, bounded by its timeout.
    async fn attempt<P, F>(&self, index: usize, target: &dyn Target, parse: &F) -> Result<P, ProviderError>
    where
        F: Fn(&str) -> Result<P, ProviderError>,
    {
        let endpoint = &self.endpoints[index];
        let request = Request::for_target(target, endpoint)?;
        let response = tokio::time::timeout(endpoint.timeout, self.transport.send(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "{} after {} ms",
                    target.name(),
                    endpoint.timeout.as_millis()
                ))
            })??;
        parse(&response.into_success()?)
    }

    /// Read with failover. Resets health first.
    pub async fn read<P, F>(&self, target: &dyn Target, parse: F) -> Result<P, ProviderError>
    where
        F: Fn(&str) -> Result<P, ProviderError>,
    {
        self.reset_health();
        let mut outcomes = Vec::new();
        let result = self.read_inner(target, &parse, &mut outcomes).await;
        self.apply(outcomes);
        result
    }

    /// Failover loop. Pushes one `(endpoint, health)` per attempt into
    /// `outcomes` instead of touching shared health.
    async fn read_inner<P, F>(
        &self,
        target: &dyn Target,
        parse: &F,
        outcomes: &mut Vec<(usize, Health)>,
    ) -> Result<P, ProviderError>
    where
        F: Fn(&str) -> Result<P, ProviderError>,
    {
        let candidates = self.capable(target.capability());
        if candidates.is_empty() {
            return Err(ProviderError::Unsupported(format!(
                "no endpoint supports {:?}",
                target.capability()
            )));
        }

        let rounds = 1 + usize::from(self.config.max_retries);
        let mut attempts = 0;
        let mut last = String::new();
        for _ in 0..rounds {
            for &index in &candidates {
                attempts += 1;
                match self.attempt(index, target, parse).await {
                    Ok(value) => {
                        outcomes.push((index, Health::Alive));
                        return Ok(value);
                    }
                    Err(e) if !e.is_retryable() => {
                        tracing::debug!(endpoint = index, target = target.name(), error = %e, "definitive error");
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::warn!(
                            endpoint = index,
                            attempt = attempts,
                            target = target.name(),
                            error = %e,
                            "endpoint failed"
                        );
                        outcomes.push((index, Health::Degraded));
                        last = e.to_string();
                    }
                }
            }
        }

        outcomes.extend(candidates.iter().map(|&index| (index, Health::Dead)));
        tracing::error!(attempts, target = target.name(), "all endpoints exhausted");
        Err(ProviderError::AllEndpointsExhausted { attempts, last })
    }

    /// Runs `make_target(item)` reads concurrently, at most `max_concurrency`
    /// at a time, returning one result per item in input order.
    pub async fn read_many<I, T, P, F>(
        &self,
        items: Vec<I>,
        make_target: impl Fn(I) -> T,
        parse: F,
    ) -> Vec<Result<P, ProviderError>>
    where
        T: Target,
        F: Fn(&str) -> Result<P, ProviderError>,
    {
        self.reset_health();
        let parse = &parse;
        let reads = items.into_iter().map(|item| {
            let target = make_target(item);
            async move {
                let mut outcomes = Vec::new();
                let result = self.read_inner(&target, parse, &mut outcomes).await;
                (result, outcomes)
            }
        });
        let finished = buffered_in_order(reads, self.config.max_concurrency).await;

        let mut results = Vec::with_capacity(finished.len());
        let mut merged = Vec::new();
        for (result, outcomes) in finished {
            results.push(result);
            merged.extend(outcomes);
        }
        self.apply(merged);
        results
    }

    /// Broadcasts through the first endpoint that accepts broadcasts.
    ///
    /// `parse` extracts the transaction hash from the response. A response
    /// saying the node already has the transaction counts as success and
    /// yields `local_hash`.
    pub async fn broadcast<F>(
        &self,
        target: &dyn Target,
        local_hash: &str,
        parse: F,
    ) -> Result<String, ProviderError>
    where
        F: Fn(&str) -> Result<String, ProviderError>,
    {
        let index = self
            .capable(Capability::Broadcast)
            .first()
            .copied()
            .ok_or_else(|| ProviderError::Unsupported("no endpoint accepts broadcasts".into()))?;
        self.broadcast_via(index, target, local_hash, parse).await
    }

    /// Broadcasts through endpoint `index` only.
    pub async fn broadcast_via<F>(
        &self,
        index: usize,
        target: &dyn Target,
        local_hash: &str,
        parse: F,
    ) -> Result<String, ProviderError>
    where
        F: Fn(&str) -> Result<String, ProviderError>,
    {
        let endpoint = self.endpoints.get(index).ok_or_else(|| {
            ProviderError::Unsupported(format!("no endpoint at index {index}"))
        })?;
        if !endpoint.supports(Capability::Broadcast) {
            return Err(ProviderError::Unsupported(format!(
                "endpoint {index} does not accept broadcasts"
            )));
        }
        self.reset_health();

        match self.attempt(index, target, &parse).await {
            Ok(hash) => {
                tracing::info!(endpoint = index, tx_hash = %hash, "transaction broadcast");
                Ok(hash)
            }
            Err(e) if e.is_already_known() => {
                tracing::info!(endpoint = index, tx_hash = %local_hash, "transaction already known");
                Ok(local_hash.to_string())
            }
            Err(e) => {
                tracing::warn!(endpoint = index, error = %e, "broadcast failed");
                self.mark(index, Health::Degraded);
                Err(ProviderError::BroadcastFailed {
                    endpoint: index,
                    reason: Box::new(e),
                })
            }
        }
    }
}

async fn buffered_in_order<Fut, P>(futures: impl Iterator<Item = Fut>, limit: usize) -> Vec<P>
where
    Fut: Future<Output = P>,
{
    stream::iter(futures).buffered(limit).collect().await
}
