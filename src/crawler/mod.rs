//! Crawl engine: shared context and run orchestration
//!
//! A run wires three cooperative tasks over one shared [`CrawlContext`]: the
//! foreground explorer, the background annotator, and the periodic snapshot
//! task. Shutdown is a watch channel flipped on interrupt or when the
//! explorer finishes; the snapshot task writes a final snapshot either way.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{watch, Mutex};

use crate::annotate;
use crate::api::RemoteApi;
use crate::config::Config;
use crate::explore;
use crate::limits::RateLimitTracker;
use crate::persist;
use crate::state::GraphState;
use crate::Result;

/// Attempts to fetch the initial rate-limit map before giving up
const STARTUP_REFRESH_ATTEMPTS: u32 = 5;

/// Shared state for one crawl run
pub struct CrawlContext {
    pub config: Config,
    pub api: Arc<dyn RemoteApi>,
    pub limits: RateLimitTracker,
    pub graph: Mutex<GraphState>,
    pub rng: Mutex<StdRng>,
}

impl CrawlContext {
    pub fn new(config: Config, api: Arc<dyn RemoteApi>, graph: GraphState) -> Self {
        let rng = match config.crawl.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            limits: RateLimitTracker::new(api.clone()),
            api,
            graph: Mutex::new(graph),
            rng: Mutex::new(rng),
            config,
        }
    }
}

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The configured expansion budget was spent
    BudgetExhausted,

    /// No eligible candidate remained in the graph
    FrontierExhausted,

    /// Shutdown was requested before the run finished
    Interrupted,
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BudgetExhausted => "expansion budget spent",
            Self::FrontierExhausted => "no expandable accounts left",
            Self::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// Runs one crawl to completion over a loaded (or fresh) graph
///
/// Resolves whatever seeds are not yet annotated, builds the initial
/// frontier from unexpanded seeds, and drives the explorer with the
/// annotator and snapshot tasks alongside. Returns after the final snapshot
/// is on disk.
pub async fn run_crawl(
    config: Config,
    api: Arc<dyn RemoteApi>,
    graph: GraphState,
) -> Result<CrawlOutcome> {
    let ctx = Arc::new(CrawlContext::new(config, api, graph));

    refresh_limits_with_retry(&ctx).await?;
    seed_graph(&ctx).await?;
    let frontier = seed_frontier(&ctx).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let annotator = tokio::spawn(annotate::run_background_annotator(
        ctx.clone(),
        shutdown_rx.clone(),
    ));
    let snapshotter = tokio::spawn(persist::run_snapshot_task(
        ctx.clone(),
        shutdown_rx.clone(),
    ));

    let outcome = tokio::select! {
        res = explore::run_explorer(&ctx, frontier, shutdown_rx) => res?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, shutting down");
            CrawlOutcome::Interrupted
        }
    };

    // Stop the side tasks; the snapshot task flushes on its way out
    let _ = shutdown_tx.send(true);
    let _ = annotator.await;
    match snapshotter.await {
        Ok(result) => result?,
        Err(e) => tracing::error!(error = %e, "Snapshot task panicked"),
    }

    {
        let graph = ctx.graph.lock().await;
        tracing::info!(
            outcome = %outcome,
            accounts = graph.accounts().len(),
            ids = graph.len(),
            blacklisted = graph.blacklist_len(),
            "Crawl finished"
        );
    }
    Ok(outcome)
}

/// Fetches the initial quota map, retrying transient failures a few times
///
/// Nothing can run without the quota map, so persistent failure here aborts
/// the run.
async fn refresh_limits_with_retry(ctx: &CrawlContext) -> Result<()> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match ctx.limits.refresh().await {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= STARTUP_REFRESH_ATTEMPTS => return Err(e),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Initial rate-limit fetch failed, retrying");
                tokio::time::sleep(Duration::from_secs(5 * attempt as u64)).await;
            }
        }
    }
}

/// Annotates configured seeds that the loaded graph does not know yet
async fn seed_graph(ctx: &CrawlContext) -> Result<()> {
    let pending: Vec<(String, u32)> = {
        let graph = ctx.graph.lock().await;
        ctx.config
            .crawl
            .seeds
            .iter()
            .filter(|handle| seed_id(&graph, handle).is_none())
            .map(|handle| (handle.clone(), 0))
            .collect()
    };

    if !pending.is_empty() {
        tracing::info!(count = pending.len(), "Resolving seed handles");
    }
    annotate::annotate_by_names(ctx, pending).await
}

/// Initial frontier: resolved seed ids that still lack a follower list
async fn seed_frontier(ctx: &CrawlContext) -> Vec<u64> {
    let graph = ctx.graph.lock().await;
    ctx.config
        .crawl
        .seeds
        .iter()
        .filter_map(|handle| seed_id(&graph, handle))
        .filter(|&id| !graph.is_expanded(id) && !graph.is_blacklisted(id))
        .collect()
}

/// Case-insensitive seed lookup; the remote service canonicalizes handle case
fn seed_id(graph: &GraphState, handle: &str) -> Option<u64> {
    graph
        .accounts()
        .iter()
        .find(|(stored, _)| stored.eq_ignore_ascii_case(handle))
        .and_then(|(_, account)| account.profile.as_ref())
        .map(|profile| profile.id)
}

/// Loads the graph for this run according to the resume mode
pub async fn load_graph(config: &Config, fresh: bool) -> Result<GraphState> {
    if fresh {
        tracing::info!("Starting with an empty graph");
        return Ok(GraphState::new());
    }
    persist::load_snapshot(Path::new(&config.output.state_path)).await
}
