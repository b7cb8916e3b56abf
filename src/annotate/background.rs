//! Background annotation loop
//!
//! Opportunistically spends leftover lookup quota on ids the explorer has
//! discovered but not yet resolved. The loop always leaves a reserve of
//! lookup calls untouched so the explorer never stalls waiting for quota the
//! annotator burned.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::annotate::annotate_by_ids;
use crate::api::LOOKUP_ENDPOINT;
use crate::crawler::CrawlContext;
use crate::Result;

/// Runs annotation cycles until the shutdown signal flips
///
/// Cycle errors are logged and absorbed; a broken cycle reschedules at the
/// idle interval instead of killing the task.
pub async fn run_background_annotator(ctx: Arc<CrawlContext>, mut shutdown: watch::Receiver<bool>) {
    let poll = Duration::from_secs(ctx.config.annotator.poll_interval_secs);
    let idle = Duration::from_secs(ctx.config.annotator.idle_interval_secs);

    tracing::debug!(
        poll_secs = poll.as_secs(),
        idle_secs = idle.as_secs(),
        "Background annotator started"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        let delay = match annotation_cycle(&ctx).await {
            Ok(true) => poll,
            Ok(false) => idle,
            Err(e) => {
                tracing::warn!(error = %e, "Background annotation cycle failed");
                idle
            }
        };

        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!("Background annotator stopped");
}

/// One annotation cycle; returns whether a batch was actually sent
///
/// Skips the cycle when the lookup quota is at or below the configured
/// reserve, or when fewer than half a batch of unannotated ids is pending.
async fn annotation_cycle(ctx: &CrawlContext) -> Result<bool> {
    let reserve = ctx.config.annotator.lookup_reserve;
    let remaining = ctx.limits.remaining(LOOKUP_ENDPOINT).await;
    if remaining <= reserve {
        tracing::trace!(remaining, reserve, "Lookup quota at reserve, skipping cycle");
        return Ok(false);
    }

    let batch_size = ctx.config.crawl.batch_size;
    let pending = {
        let graph = ctx.graph.lock().await;
        graph.unannotated_ids(batch_size)
    };
    if pending.len() < batch_size / 2 {
        tracing::trace!(
            pending = pending.len(),
            "Not enough unannotated ids for a worthwhile batch"
        );
        return Ok(false);
    }

    annotate_by_ids(ctx, pending).await?;
    Ok(true)
}
