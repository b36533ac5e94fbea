//! Concurrent reporting and selection against one registry.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use cdn_ranker::config::ScoringConfig;
use cdn_ranker::load_balancer::TopSlice;
use cdn_ranker::Registry;

mod common;

#[test]
fn test_concurrent_reports_and_selects() {
    let hosts: Vec<String> = (0..300).map(common::host_name).collect();
    let registry = Arc::new(Registry::new(
        hosts.clone(),
        ScoringConfig::default(),
        TopSlice::default(),
    ));

    let mut handles = Vec::new();
    for worker in 0..8u64 {
        let registry = registry.clone();
        let hosts = hosts.clone();
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(worker);
            for _ in 0..2_000 {
                if rng.gen_bool(0.5) {
                    let host = &hosts[rng.gen_range(0..hosts.len())];
                    let success = rng.gen_bool(0.9);
                    registry.report_result(host, rng.gen_range(10..1200), success).unwrap();
                } else {
                    let chosen = registry.select().unwrap();
                    let rank = registry.endpoint(&chosen).unwrap().position;
                    // The host may have moved since it was chosen, but it exists.
                    assert!(rank < hosts.len());
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let ranking = registry.ranking();
    assert_eq!(ranking.len(), hosts.len());
    common::assert_ranked(&ranking);

    let unique: HashSet<_> = ranking.iter().map(|e| e.host.as_str()).collect();
    assert_eq!(unique.len(), hosts.len());
    let positions: HashSet<_> = ranking.iter().map(|e| e.position).collect();
    assert_eq!(positions.len(), hosts.len());

    let total: u64 = ranking.iter().map(|e| e.request_count).sum();
    assert!(total > 0);
}

#[test]
fn test_selection_respects_top_slice() {
    let hosts: Vec<String> = (0..250).map(common::host_name).collect();
    let registry = Registry::new(hosts.clone(), ScoringConfig::default(), TopSlice::default());
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..3_000 {
        let host = &hosts[rng.gen_range(0..hosts.len())];
        registry.report_result(host, rng.gen_range(10..1500), rng.gen_bool(0.7)).unwrap();
    }

    let top: HashSet<String> = registry.ranking().into_iter().take(100).map(|e| e.host).collect();
    for _ in 0..2_000 {
        assert!(top.contains(&registry.select().unwrap()));
    }
}
