//! Snapshot persistence for the crawl state
//!
//! The persisted form is a JSON object keyed by handle, each value carrying
//! the profile (with its recorded distance) and the follower list. Snapshots
//! are written to a temporary file and renamed into place so an interrupted
//! write never clobbers the previous good snapshot. Everything else the graph
//! tracks (identity index, distances, degrees) is rebuilt by replay at load.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::crawler::CrawlContext;
use crate::state::{Account, GraphState};
use crate::Result;

/// Writes the current account map to `path` atomically
pub async fn write_snapshot(ctx: &CrawlContext, path: &Path) -> Result<()> {
    let encoded = {
        let graph = ctx.graph.lock().await;
        serde_json::to_vec_pretty(graph.accounts())?
    };

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &encoded).await?;
    tokio::fs::rename(&tmp, path).await?;

    tracing::info!(path = %path.display(), bytes = encoded.len(), "Snapshot written");
    Ok(())
}

/// Loads the graph from a snapshot, or starts empty if none exists
///
/// A present-but-unreadable or corrupt snapshot is fatal; silently starting
/// fresh would throw away the work the file represents.
pub async fn load_snapshot(path: &Path) -> Result<GraphState> {
    if !tokio::fs::try_exists(path).await? {
        tracing::info!(path = %path.display(), "No snapshot found, starting fresh");
        return Ok(GraphState::new());
    }

    let raw = tokio::fs::read(path).await?;
    let accounts: HashMap<String, Account> = serde_json::from_slice(&raw)?;
    let graph = GraphState::from_accounts(accounts)?;

    tracing::info!(
        path = %path.display(),
        accounts = graph.accounts().len(),
        ids = graph.len(),
        "Snapshot loaded"
    );
    Ok(graph)
}

/// Periodically snapshots the graph until shutdown, then writes a final one
///
/// A failed periodic write is logged and retried at the next tick; only the
/// final write's failure is surfaced.
pub async fn run_snapshot_task(
    ctx: Arc<CrawlContext>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let path = Path::new(&ctx.config.output.state_path).to_path_buf();
    let interval = Duration::from_secs(ctx.config.output.snapshot_interval_secs);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(interval) => {
                if let Err(e) = write_snapshot(&ctx, &path).await {
                    tracing::warn!(error = %e, "Periodic snapshot failed");
                }
            }
        }
    }

    write_snapshot(&ctx, &path).await
}
