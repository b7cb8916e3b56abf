//! Rate limit tracker gating every remote call
//!
//! The tracker holds the per-endpoint quota map refreshed wholesale from the
//! remote status call. Both polling loops (explorer and background annotator)
//! go through [`RateLimitTracker::acquire`]; the check-and-decrement happens
//! under one mutex guard, so two concurrent loops can never both observe the
//! last remaining call and overshoot the quota.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::api::{EndpointLimit, RemoteApi};
use crate::{CrawlError, Result};

/// Safety margin added on top of the advertised reset time
const RESET_MARGIN: Duration = Duration::from_secs(1);

/// Tracks remaining calls and reset times per remote endpoint
pub struct RateLimitTracker {
    api: Arc<dyn RemoteApi>,
    limits: Mutex<HashMap<String, EndpointLimit>>,
}

impl RateLimitTracker {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            limits: Mutex::new(HashMap::new()),
        }
    }

    /// Repopulates the full endpoint quota map with one status call
    ///
    /// Failure is fatal to the current cycle only; callers retry later rather
    /// than crash the process.
    pub async fn refresh(&self) -> Result<()> {
        let fresh = self
            .api
            .rate_limit_status()
            .await
            .map_err(CrawlError::LimitsUnavailable)?;

        tracing::debug!("Refreshed rate limits for {} endpoints", fresh.len());
        *self.limits.lock().await = fresh;
        Ok(())
    }

    /// Consumes one call from the endpoint's quota, waiting for the window to
    /// reset when none remain
    ///
    /// The decision to decrement is atomic with respect to concurrent
    /// acquirers. When the quota is exhausted the caller suspends until
    /// `reset_at` plus a small margin, refreshes, and retries.
    pub async fn acquire(&self, endpoint: &str) -> Result<()> {
        let mut refreshed_for_unknown = false;

        loop {
            let wait = {
                let mut limits = self.limits.lock().await;
                match limits.get_mut(endpoint) {
                    Some(limit) if limit.remaining > 0 => {
                        limit.remaining -= 1;
                        tracing::trace!(
                            endpoint,
                            remaining = limit.remaining,
                            "Acquired rate limit slot"
                        );
                        return Ok(());
                    }
                    Some(limit) => {
                        let until_reset = limit.reset_at - Utc::now().timestamp();
                        Some(Duration::from_secs(until_reset.max(0) as u64) + RESET_MARGIN)
                    }
                    None => None,
                }
            };

            match wait {
                Some(delay) => {
                    tracing::info!(
                        endpoint,
                        wait_secs = delay.as_secs(),
                        "Quota exhausted, deferring call until reset"
                    );
                    tokio::time::sleep(delay).await;
                    self.refresh().await?;
                }
                None => {
                    // Endpoint not in the map yet: one refresh may reveal it
                    if refreshed_for_unknown {
                        return Err(CrawlError::UnknownEndpoint(endpoint.to_string()));
                    }
                    self.refresh().await?;
                    refreshed_for_unknown = true;
                }
            }
        }
    }

    /// Non-consuming read of an endpoint's remaining quota
    ///
    /// Used by the background annotator to leave a reserve floor for the
    /// explorer's own annotation needs.
    pub async fn remaining(&self, endpoint: &str) -> u32 {
        self.limits
            .lock()
            .await
            .get(endpoint)
            .map(|limit| limit.remaining)
            .unwrap_or(0)
    }
}
