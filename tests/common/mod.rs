//! Shared utilities for integration tests.

use std::fs;
use std::path::Path;
use cdn_ranker::load_balancer::RankedEndpoint;
use cdn_ranker::RankerConfig;

/// Write a host list of `count` hosts into `dir` and return a config pointing at it.
#[allow(dead_code)]
pub fn config_with_hosts(dir: &Path, count: usize) -> RankerConfig {
    let hosts: Vec<String> = (0..count).map(host_name).collect();
    let host_list = dir.join("cdn.txt");
    fs::write(&host_list, hosts.join("\n")).unwrap();

    let mut config = RankerConfig::default();
    config.cdn.host_list_path = host_list;
    config.cdn.snapshot_path = dir.join("runtime").join("cdn_snapshot.json");
    config
}

pub fn host_name(i: usize) -> String {
    format!("10.0.{}.{}", i / 256, i % 256)
}

/// Assert the ranking is sorted by weight and every position matches its index.
pub fn assert_ranked(ranking: &[RankedEndpoint]) {
    for (rank, entry) in ranking.iter().enumerate() {
        assert_eq!(entry.position, rank, "position mismatch for {}", entry.host);
    }
    for pair in ranking.windows(2) {
        assert!(
            pair[0].weight >= pair[1].weight,
            "{} ({}) ranked above {} ({})",
            pair[0].host, pair[0].weight, pair[1].host, pair[1].weight
        );
    }
}
