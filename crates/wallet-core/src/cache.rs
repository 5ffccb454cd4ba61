//! Short-lived account snapshots, keyed by chain and address.

use std::time::{Duration, Instant};

use chain_params::Chain;
use dashmap::DashMap;

use crate::types::AccountState;

#[derive(Debug)]
pub struct AccountCache {
    ttl: Duration,
    entries: DashMap<(Chain, String), (Instant, AccountState)>,
}

impl AccountCache {
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached state if it is younger than the TTL.
    pub fn get(&self, chain: Chain, address: &str) -> Option<AccountState> {
        let key = (chain, address.to_string());
        if let Some(entry) = self.entries.get(&key) {
            let (stored, state) = entry.value();
            if stored.elapsed() < self.ttl {
                return Some(state.clone());
            }
        }
        // Another task may have refreshed the entry since the read.
        self.entries
            .remove_if(&key, |_, (stored, _)| stored.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, state: AccountState) {
        if self.ttl.is_zero() {
            return;
        }
        let key = (state.chain, state.address.clone());
        self.entries.insert(key, (Instant::now(), state));
    }

    /// Drops the entry, e.g. after the account spent funds.
    pub fn invalidate(&self, chain: Chain, address: &str) {
        self.entries.remove(&(chain, address.to_string()));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
