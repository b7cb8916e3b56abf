//! Statistics generation from crawl snapshots
//!
//! This module provides functionality for summarizing and displaying the
//! state of a crawl from a loaded graph.

use std::collections::{BTreeMap, HashMap};

use crate::state::{AccountPhase, GraphState};

/// How many top-degree accounts the statistics report lists
const TOP_DEGREE_COUNT: usize = 10;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of ids discovered (excluding blacklisted ones)
    pub total_ids: usize,

    /// Count of ids by lifecycle phase
    pub ids_by_phase: HashMap<AccountPhase, usize>,

    /// Number of ids excluded during past runs of this snapshot
    pub blacklisted: usize,

    /// Total number of follower edges recorded
    pub total_edges: usize,

    /// Id counts per hop distance from the seed set
    pub distance_histogram: BTreeMap<u32, usize>,

    /// Most-followed accounts: (handle or id, degree), highest first
    pub top_by_degree: Vec<(String, u32)>,
}

/// Computes statistics from a loaded graph
pub fn load_statistics(graph: &GraphState) -> CrawlStatistics {
    let mut ids_by_phase: HashMap<AccountPhase, usize> = HashMap::new();
    let mut distance_histogram: BTreeMap<u32, usize> = BTreeMap::new();

    for (id, distance) in graph.distances() {
        *ids_by_phase.entry(graph.phase(id)).or_insert(0) += 1;
        *distance_histogram.entry(distance).or_insert(0) += 1;
    }

    let total_edges = graph
        .accounts()
        .values()
        .filter_map(|account| account.followers.as_ref())
        .map(Vec::len)
        .sum();

    let mut by_degree: Vec<(u64, u32)> = graph.degrees().collect();
    by_degree.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let top_by_degree = by_degree
        .into_iter()
        .take(TOP_DEGREE_COUNT)
        .map(|(id, degree)| {
            let label = match graph.handle_of(id) {
                Some(handle) => format!("@{handle}"),
                None => format!("id {id}"),
            };
            (label, degree)
        })
        .collect();

    CrawlStatistics {
        total_ids: graph.len(),
        ids_by_phase,
        blacklisted: graph.blacklist_len(),
        total_edges,
        distance_histogram,
        top_by_degree,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total ids discovered: {}", stats.total_ids);
    println!("  Follower edges recorded: {}", stats.total_edges);
    println!("  Blacklisted ids: {}", stats.blacklisted);
    println!();

    println!("Ids by Phase:");
    // Sort phases by count (descending)
    let mut phase_counts: Vec<_> = stats.ids_by_phase.iter().collect();
    phase_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (phase, count) in phase_counts {
        let percentage = if stats.total_ids > 0 {
            (*count as f64 / stats.total_ids as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", phase, count, percentage);
    }
    println!();

    if !stats.distance_histogram.is_empty() {
        println!("Ids by Distance from Seeds:");
        for (distance, count) in &stats.distance_histogram {
            println!("  {} hops: {}", distance, count);
        }
        println!();
    }

    if !stats.top_by_degree.is_empty() {
        println!("Most Followed ({}):", stats.top_by_degree.len());
        for (label, degree) in &stats.top_by_degree {
            println!("  - {} (observed {} times)", label, degree);
        }
    }
}
