//! Random pick from the head of the ranking.

use rand::Rng;
use crate::load_balancer::Selector;

/// Top-slice selector.
/// Picks uniformly among the first `k` ranked endpoints (or all of them if fewer).
#[derive(Debug, Clone, Copy)]
pub struct TopSlice {
    k: usize,
}

impl TopSlice {
    pub const DEFAULT_K: usize = 100;

    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl Default for TopSlice {
    fn default() -> Self {
        Self::new(Self::DEFAULT_K)
    }
}

impl Selector for TopSlice {
    fn pick(&self, ranked_len: usize) -> Option<usize> {
        if ranked_len == 0 {
            return None;
        }
        let bound = self.k.min(ranked_len);
        Some(rand::thread_rng().gen_range(0..bound))
    }
}
