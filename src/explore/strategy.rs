//! Candidate selection strategies
//!
//! When the explicit frontier runs dry, the explorer draws the next expansion
//! candidate with a weighted mix of three strategies: the most-observed
//! unexpanded account, a randomized deep walk down follower lists, and a
//! breadth-first pick of the nearest unexpanded id. A strategy that comes up
//! empty falls back to the breadth-first pick, which doubles as the
//! authoritative exhaustion check.

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::CrawlConfig;
use crate::state::GraphState;

/// Draws the next expansion candidate, or `None` when the graph holds no
/// eligible id at all
pub fn select_candidate(
    graph: &GraphState,
    crawl: &CrawlConfig,
    rng: &mut StdRng,
) -> Option<u64> {
    let r: f64 = rng.random();
    let choice = if r < crawl.popular_weight {
        popular_candidate(graph)
    } else if r < crawl.popular_weight + crawl.deep_walk_weight {
        deep_walk_candidate(graph, crawl, rng)
    } else {
        nearest_candidate(graph)
    };
    choice.or_else(|| nearest_candidate(graph))
}

/// The unexpanded id observed as a follower most often
fn popular_candidate(graph: &GraphState) -> Option<u64> {
    graph
        .expansion_candidates()
        .max_by_key(|&id| graph.degree(id))
}

/// Randomly descends follower lists from the nearest-to-seed id until the
/// walk leaves the expanded region
///
/// A walk that dead-ends on a blacklisted or already-expanded id restarts,
/// up to the configured bound.
fn deep_walk_candidate(graph: &GraphState, crawl: &CrawlConfig, rng: &mut StdRng) -> Option<u64> {
    let start = graph.lowest_distance_id()?;

    for _ in 0..crawl.walk_restarts {
        let mut current = start;
        for _ in 0..crawl.max_walk_hops {
            match graph.followers_of(current) {
                Some(followers) if !followers.is_empty() => {
                    current = followers[rng.random_range(0..followers.len())];
                    if graph.is_blacklisted(current) {
                        break;
                    }
                }
                _ => break,
            }
        }
        if !graph.is_blacklisted(current) && !graph.is_expanded(current) {
            return Some(current);
        }
    }
    None
}

/// Breadth-first pick: the unexpanded id with the lowest recorded distance
fn nearest_candidate(graph: &GraphState) -> Option<u64> {
    graph
        .expansion_candidates()
        .min_by_key(|&id| graph.distance(id).unwrap_or(u32::MAX))
}
