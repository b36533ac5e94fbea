//! Ranked endpoint pool.
//!
//! # Responsibilities
//! - Own every endpoint of the fixed host pool
//! - Keep the pool ordered by weight, descending
//! - Apply reported outcomes and move the endpoint to its new rank
//! - Serve random selections from the top of the ranking
//! - Merge persisted statistics back in at startup
//!
//! # Layout
//! Endpoints live in fixed slots (`endpoints`), `index` maps host → slot and never
//! changes after construction, `ranked` maps rank → slot. Every endpoint stores its
//! own rank in `position`, so `ranked[endpoints[s].position] == s` for every slot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use serde::Serialize;
use crate::config::{RankerConfig, ScoringConfig};
use crate::load_balancer::{
    EndpointScore, HealthSample, RegistryError, Selector, TopSlice,
};
use crate::observability::metrics;
use crate::persistence::snapshot::Snapshot;

/// Point-in-time copy of one ranked endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEndpoint {
    pub host: String,
    pub position: usize,
    pub weight: f64,
    pub request_count: u64,
    pub success_count: u64,
    pub delay_score: f64,
}

#[derive(Debug, Default)]
struct RankedPool {
    endpoints: Vec<EndpointScore>,
    ranked: Vec<usize>,
    index: HashMap<String, usize>,
}

impl RankedPool {
    fn weight_at(&self, rank: usize) -> f64 {
        self.endpoints[self.ranked[rank]].weight()
    }

    fn swap_ranks(&mut self, a: usize, b: usize) {
        self.ranked.swap(a, b);
        let (slot_a, slot_b) = (self.ranked[a], self.ranked[b]);
        self.endpoints[slot_a].position = a;
        self.endpoints[slot_b].position = b;
    }

    /// Move the endpoint in `slot` to its sorted rank with adjacent swaps.
    ///
    /// Equal weights never swap, so ties keep their current relative order.
    fn reposition(&mut self, slot: usize) -> usize {
        let weight = self.endpoints[slot].weight();
        let mut rank = self.endpoints[slot].position;

        if rank > 0 && weight > self.weight_at(rank - 1) {
            while rank > 0 && weight > self.weight_at(rank - 1) {
                self.swap_ranks(rank - 1, rank);
                rank -= 1;
            }
        } else {
            while rank + 1 < self.ranked.len() && weight < self.weight_at(rank + 1) {
                self.swap_ranks(rank, rank + 1);
                rank += 1;
            }
        }
        rank
    }

    /// Full stable sort by weight, then reassign every position.
    fn resort(&mut self) {
        let endpoints = &self.endpoints;
        self.ranked
            .sort_by(|&a, &b| endpoints[b].weight().total_cmp(&endpoints[a].weight()));
        for (rank, &slot) in self.ranked.iter().enumerate() {
            self.endpoints[slot].position = rank;
        }
    }

    fn top_weight(&self) -> f64 {
        self.ranked.first().map_or(0.0, |&slot| self.endpoints[slot].weight())
    }
}

/// The ranked pool of CDN endpoints.
///
/// All operations take the single pool lock for their whole duration.
#[derive(Debug)]
pub struct Registry {
    pool: Mutex<RankedPool>,
    scoring: ScoringConfig,
    selector: Box<dyn Selector>,
}

impl Registry {
    /// Build a registry over `hosts`. Initial rank follows insertion order.
    pub fn new<I, S>(hosts: I, scoring: ScoringConfig, selector: impl Selector + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pool = RankedPool::default();
        for host in hosts {
            let host = host.into();
            if pool.index.contains_key(&host) {
                tracing::warn!(host = %host, "Duplicate host ignored");
                continue;
            }
            let slot = pool.endpoints.len();
            pool.endpoints.push(EndpointScore::new(host.clone(), slot));
            pool.ranked.push(slot);
            pool.index.insert(host, slot);
        }

        metrics::record_pool_size(pool.endpoints.len());

        Self {
            pool: Mutex::new(pool),
            scoring,
            selector: Box::new(selector),
        }
    }

    /// Build a registry using the scoring constants and `top_k` from configuration.
    pub fn from_config<I, S>(hosts: I, config: &RankerConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(hosts, config.scoring, TopSlice::new(config.cdn.top_k))
    }

    fn lock(&self) -> MutexGuard<'_, RankedPool> {
        // Every swap leaves the pool consistent, so a poisoned lock is still usable.
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the outcome of one attempt against `host` and re-rank it.
    ///
    /// Unknown hosts are rejected without touching the pool.
    pub fn report_result(&self, host: &str, delay_ms: u64, success: bool) -> Result<(), RegistryError> {
        let sample = HealthSample { delay_ms, success };
        let mut pool = self.lock();

        let Some(&slot) = pool.index.get(host) else {
            tracing::warn!(host = %host, "Result reported for untracked host");
            metrics::record_report_rejected();
            return Err(RegistryError::HostNotTracked(host.to_string()));
        };

        let endpoint = &mut pool.endpoints[slot];
        let old_weight = endpoint.weight();
        let old_rank = endpoint.position;
        endpoint.record_outcome(sample, &self.scoring);
        let new_weight = endpoint.weight();

        let new_rank = pool.reposition(slot);

        tracing::trace!(
            host = %host,
            success,
            delay_ms,
            old_weight,
            new_weight,
            old_rank,
            new_rank,
            "Endpoint repositioned"
        );

        metrics::record_report(success, delay_ms);
        if new_rank == 0 || old_rank == 0 {
            metrics::record_top_weight(pool.top_weight());
        }
        Ok(())
    }

    /// Pick a host at random from the top of the ranking.
    pub fn select(&self) -> Result<String, RegistryError> {
        let pool = self.lock();
        match self.selector.pick(pool.ranked.len()) {
            Some(rank) => {
                let slot = pool.ranked[rank];
                metrics::record_selection(true);
                Ok(pool.endpoints[slot].host().to_string())
            }
            None => {
                metrics::record_selection(false);
                Err(RegistryError::NoEndpoints)
            }
        }
    }

    /// Merge persisted counters into the tracked endpoints, then fully re-sort.
    ///
    /// Returns the number of entries applied. Entries for unknown hosts are skipped.
    pub fn restore_from(&self, snapshot: &Snapshot) -> usize {
        let mut pool = self.lock();
        let mut applied = 0;

        for entry in &snapshot.entries {
            let Some(&slot) = pool.index.get(&entry.host) else {
                tracing::debug!(host = %entry.host, "Snapshot entry for untracked host skipped");
                continue;
            };
            if entry.success_count > entry.request_count || !entry.weight.is_finite() {
                tracing::warn!(
                    host = %entry.host,
                    request_count = entry.request_count,
                    success_count = entry.success_count,
                    weight = entry.weight,
                    "Inconsistent snapshot entry skipped"
                );
                continue;
            }
            pool.endpoints[slot].restore(entry.request_count, entry.success_count, entry.weight);
            applied += 1;
        }

        pool.resort();
        metrics::record_top_weight(pool.top_weight());
        applied
    }

    /// Consistent copy of the current ranking, best first.
    pub fn ranking(&self) -> Vec<RankedEndpoint> {
        let pool = self.lock();
        pool.ranked
            .iter()
            .map(|&slot| {
                let endpoint = &pool.endpoints[slot];
                RankedEndpoint {
                    host: endpoint.host().to_string(),
                    position: endpoint.position(),
                    weight: endpoint.weight(),
                    request_count: endpoint.request_count(),
                    success_count: endpoint.success_count(),
                    delay_score: endpoint.delay_score(),
                }
            })
            .collect()
    }

    /// Look up one endpoint by host.
    pub fn endpoint(&self, host: &str) -> Option<RankedEndpoint> {
        let pool = self.lock();
        let &slot = pool.index.get(host)?;
        let endpoint = &pool.endpoints[slot];
        Some(RankedEndpoint {
            host: endpoint.host().to_string(),
            position: endpoint.position(),
            weight: endpoint.weight(),
            request_count: endpoint.request_count(),
            success_count: endpoint.success_count(),
            delay_score: endpoint.delay_score(),
        })
    }
}
