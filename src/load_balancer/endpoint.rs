//! Endpoint scoring.
//!
//! # Responsibilities
//! - Represent a single CDN host
//! - Accumulate request/success counts
//! - Keep a bounded window of recent successful delays
//! - Derive the weight used for ranking
//!
//! # Weight
//! ```text
//! weight = success_rate * success_rate_weight + delay_score * avg_delay_weight
//! delay_score = max(0, (base_delay_ms - avg_delay) / base_delay_ms)
//! ```
//! With the default constants the success rate term spans `[0, 10000]` and the
//! delay term `[0, 1000]`, so a rate difference always outranks a delay difference.

use std::collections::VecDeque;
use crate::config::ScoringConfig;

/// One reported outcome for one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSample {
    /// Observed request latency in milliseconds.
    pub delay_ms: u64,
    pub success: bool,
}

impl HealthSample {
    pub fn success(delay_ms: u64) -> Self {
        Self { delay_ms, success: true }
    }

    /// A failed attempt. Failures carry no delay signal.
    pub fn failure() -> Self {
        Self { delay_ms: 0, success: false }
    }
}

/// Per-host accumulator.
#[derive(Debug, Clone)]
pub struct EndpointScore {
    host: String,
    /// Index in the registry's ranked sequence. Maintained by the registry.
    pub(crate) position: usize,

    request_count: u64,
    success_count: u64,
    /// Most recent successful delays, oldest first.
    delay_window: VecDeque<u64>,
    /// Running sum of `delay_window`. Wide enough for a full window of `u64::MAX` delays.
    delay_count: u128,
    /// Last computed delay score; untouched by failures.
    delay_score: f64,

    weight: f64,
}

impl EndpointScore {
    /// Create an untouched endpoint. Its weight is 0 until the first outcome.
    pub fn new(host: impl Into<String>, position: usize) -> Self {
        Self {
            host: host.into(),
            position,
            request_count: 0,
            success_count: 0,
            delay_window: VecDeque::new(),
            delay_count: 0,
            delay_score: 0.0,
            weight: 0.0,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn delay_score(&self) -> f64 {
        self.delay_score
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Recent successful delays, oldest first.
    pub fn delay_window(&self) -> impl Iterator<Item = u64> + '_ {
        self.delay_window.iter().copied()
    }

    /// Average of the delay window, if any success has been recorded.
    pub fn average_delay(&self) -> Option<f64> {
        if self.delay_window.is_empty() {
            None
        } else {
            Some(self.delay_count as f64 / self.delay_window.len() as f64)
        }
    }

    /// Fold one outcome into the counters and recompute the weight.
    pub fn record_outcome(&mut self, sample: HealthSample, scoring: &ScoringConfig) {
        self.request_count += 1;

        if sample.success {
            self.success_count += 1;

            let capacity = scoring.delay_window.max(1);
            while self.delay_window.len() >= capacity {
                if let Some(evicted) = self.delay_window.pop_front() {
                    self.delay_count -= u128::from(evicted);
                }
            }
            self.delay_window.push_back(sample.delay_ms);
            self.delay_count += u128::from(sample.delay_ms);

            let avg_delay = self.delay_count as f64 / self.delay_window.len() as f64;
            let score = (scoring.base_delay_ms - avg_delay) / scoring.base_delay_ms;
            self.delay_score = score.max(0.0);
        }

        self.recompute_weight(scoring);
    }

    fn recompute_weight(&mut self, scoring: &ScoringConfig) {
        let success_rate = if self.request_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.request_count as f64
        };
        self.weight = success_rate * scoring.success_rate_weight
            + self.delay_score * scoring.avg_delay_weight;
    }

    /// Overwrite counters and weight with persisted values.
    ///
    /// The delay window is not persisted, so it starts empty again.
    pub(crate) fn restore(&mut self, request_count: u64, success_count: u64, weight: f64) {
        self.request_count = request_count;
        self.success_count = success_count;
        self.weight = weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoring() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_untouched_weight_is_zero() {
        let endpoint = EndpointScore::new("a.example", 0);
        assert_eq!(endpoint.weight(), 0.0);
        assert_eq!(endpoint.request_count(), 0);
        assert!(endpoint.average_delay().is_none());
    }

    #[test]
    fn test_weight_formula() {
        let mut endpoint = EndpointScore::new("a.example", 0);
        endpoint.record_outcome(HealthSample::success(200), &scoring());
        endpoint.record_outcome(HealthSample::success(400), &scoring());
        endpoint.record_outcome(HealthSample::failure(), &scoring());

        // S=2, T=3, A=300
        let expected = (2.0 / 3.0) * 10_000.0 + ((1000.0 - 300.0) / 1000.0) * 1000.0;
        assert_close(endpoint.weight(), expected);
        assert_eq!(endpoint.request_count(), 3);
        assert_eq!(endpoint.success_count(), 2);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut endpoint = EndpointScore::new("h.example", 0);
        for _ in 0..10 {
            endpoint.record_outcome(HealthSample::success(100), &scoring());
        }
        endpoint.record_outcome(HealthSample::success(900), &scoring());

        let window: Vec<u64> = endpoint.delay_window().collect();
        assert_eq!(window.len(), 10);
        assert_eq!(window[9], 900);
        assert!(window[..9].iter().all(|&d| d == 100));
        assert_close(endpoint.average_delay().unwrap(), 180.0);
        assert_close(endpoint.delay_score(), 0.82);
        assert_close(endpoint.weight(), 10_000.0 + 820.0);
    }

    #[test]
    fn test_failure_leaves_delay_untouched() {
        let mut endpoint = EndpointScore::new("a.example", 0);
        endpoint.record_outcome(HealthSample::success(500), &scoring());
        let score_before = endpoint.delay_score();
        let window_before: Vec<u64> = endpoint.delay_window().collect();

        endpoint.record_outcome(HealthSample::failure(), &scoring());

        assert_eq!(endpoint.delay_score(), score_before);
        assert_eq!(endpoint.delay_window().collect::<Vec<_>>(), window_before);
        assert_close(endpoint.weight(), 0.5 * 10_000.0 + 0.5 * 1000.0);
    }

    #[test]
    fn test_slow_delay_scores_zero() {
        let mut endpoint = EndpointScore::new("slow.example", 0);
        endpoint.record_outcome(HealthSample::success(2500), &scoring());
        assert_eq!(endpoint.delay_score(), 0.0);
        assert_close(endpoint.weight(), 10_000.0);

        let mut edge = EndpointScore::new("edge.example", 0);
        edge.record_outcome(HealthSample::success(1000), &scoring());
        assert_eq!(edge.delay_score(), 0.0);
    }

    #[test]
    fn test_only_failures_weight_zero() {
        let mut endpoint = EndpointScore::new("down.example", 0);
        endpoint.record_outcome(HealthSample::failure(), &scoring());
        endpoint.record_outcome(HealthSample::failure(), &scoring());
        assert_eq!(endpoint.weight(), 0.0);
        assert_eq!(endpoint.request_count(), 2);
    }

    #[test]
    fn test_huge_delays_do_not_overflow() {
        let mut endpoint = EndpointScore::new("huge.example", 0);
        endpoint.record_outcome(HealthSample::success(u64::MAX), &scoring());
        endpoint.record_outcome(HealthSample::success(1), &scoring());
        for _ in 0..20 {
            endpoint.record_outcome(HealthSample::success(u64::MAX), &scoring());
        }

        assert_eq!(endpoint.request_count(), 22);
        assert_eq!(endpoint.delay_window().count(), 10);
        assert_eq!(endpoint.delay_score(), 0.0);
        assert_close(endpoint.weight(), 10_000.0);

        // Window recovers exactly once the huge samples are evicted.
        for _ in 0..10 {
            endpoint.record_outcome(HealthSample::success(100), &scoring());
        }
        assert_close(endpoint.average_delay().unwrap(), 100.0);
        assert_close(endpoint.delay_score(), 0.9);
    }

    #[test]
    fn test_custom_window_size() {
        let scoring = ScoringConfig { delay_window: 2, ..ScoringConfig::default() };
        let mut endpoint = EndpointScore::new("a.example", 0);
        for delay in [100, 200, 300] {
            endpoint.record_outcome(HealthSample::success(delay), &scoring);
        }
        assert_eq!(endpoint.delay_window().collect::<Vec<_>>(), vec![200, 300]);
        assert_close(endpoint.average_delay().unwrap(), 250.0);
    }
}
