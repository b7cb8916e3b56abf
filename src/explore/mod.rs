//! Explorer: the foreground expansion loop
//!
//! Drains the explicit frontier first, then draws candidates through the
//! weighted strategy mix until the expansion budget is spent, the graph is
//! exhausted, or a shutdown is requested. A failed expansion blacklists the
//! candidate and spends no budget.

mod strategy;

use std::collections::VecDeque;

use tokio::sync::watch;

use crate::annotate::annotate_by_ids;
use crate::api::FOLLOWERS_ENDPOINT;
use crate::crawler::{CrawlContext, CrawlOutcome};
use crate::Result;

/// Runs the expansion loop to completion
pub async fn run_explorer(
    ctx: &CrawlContext,
    frontier: Vec<u64>,
    shutdown: watch::Receiver<bool>,
) -> Result<CrawlOutcome> {
    let mut frontier: VecDeque<u64> = frontier.into();
    let mut budget = ctx.config.crawl.max_expansions;

    tracing::info!(
        budget,
        frontier = frontier.len(),
        "Explorer started"
    );

    while budget > 0 {
        if *shutdown.borrow() {
            tracing::info!(budget, "Shutdown requested, stopping explorer");
            return Ok(CrawlOutcome::Interrupted);
        }

        let candidate = match frontier.pop_front() {
            Some(id) => id,
            None => {
                let graph = ctx.graph.lock().await;
                let mut rng = ctx.rng.lock().await;
                match strategy::select_candidate(&graph, &ctx.config.crawl, &mut rng) {
                    Some(id) => id,
                    None => {
                        tracing::info!(budget, "No expandable accounts left");
                        return Ok(CrawlOutcome::FrontierExhausted);
                    }
                }
            }
        };

        if expand_candidate(ctx, candidate).await? {
            budget -= 1;
        }
    }

    tracing::info!("Expansion budget spent");
    Ok(CrawlOutcome::BudgetExhausted)
}

/// Expands one candidate; returns whether a budget unit was spent
///
/// An unannotated candidate is looked up first (the batcher pads the call);
/// if it still has no profile afterwards it was blacklisted and is skipped.
/// Every follower page consumes one quota slot. A failed page fetch
/// blacklists the candidate and discards any pages already fetched.
async fn expand_candidate(ctx: &CrawlContext, id: u64) -> Result<bool> {
    {
        let graph = ctx.graph.lock().await;
        if graph.phase(id).is_terminal() {
            tracing::debug!(id, phase = %graph.phase(id), "Skipping terminal candidate");
            return Ok(false);
        }
    }

    let pending_annotation = {
        let graph = ctx.graph.lock().await;
        if graph.is_annotated(id) {
            None
        } else {
            Some(graph.distance(id).unwrap_or(0))
        }
    };
    if let Some(distance) = pending_annotation {
        annotate_by_ids(ctx, vec![(id, distance)]).await?;
        let graph = ctx.graph.lock().await;
        if !graph.is_annotated(id) {
            tracing::info!(id, "Candidate could not be annotated, skipping");
            return Ok(false);
        }
    }

    let page_size = ctx.config.crawl.page_size;
    let mut cursor: i64 = -1;
    let mut fetched: Vec<u64> = Vec::new();

    loop {
        ctx.limits.acquire(FOLLOWERS_ENDPOINT).await?;
        match ctx.api.follower_ids(id, cursor, page_size).await {
            Ok(page) => {
                let next_cursor = page.next_cursor;
                fetched.extend(page.ids);
                if next_cursor == 0 {
                    break;
                }
                cursor = next_cursor;
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Follower fetch failed, blacklisting");
                ctx.graph.lock().await.blacklist_id(id);
                return Ok(false);
            }
        }
    }

    let mut graph = ctx.graph.lock().await;
    let added = graph.commit_followers(id, &fetched)?;
    tracing::info!(
        id,
        handle = graph.handle_of(id).unwrap_or("?"),
        followers = fetched.len(),
        new = added,
        "Expanded account"
    );
    Ok(true)
}
