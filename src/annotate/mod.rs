//! Annotation batcher
//!
//! Resolves profile metadata for discovered ids in batches against the lookup
//! endpoint. Under-sized batches are padded with randomly sampled unannotated
//! ids so a quota slot is never wasted on a near-empty call. Ids the remote
//! service silently drops are blacklisted; absence is a permanent failure,
//! not retried. A failed batched call blacklists every id in the batch, since
//! the service gives no way to tell which element caused the failure.

mod background;

pub use background::run_background_annotator;

use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::api::{UserQuery, LOOKUP_ENDPOINT};
use crate::crawler::CrawlContext;
use crate::Result;

/// Annotates a set of (id, known distance) pairs in one batched lookup
///
/// Pads the batch up to the configured batch size by sampling uniformly at
/// random from known-but-unannotated, non-blacklisted ids. For each returned
/// profile the committed distance is the minimum of the requested distance
/// and any distance already recorded. Batch members without a returned
/// profile are blacklisted.
pub async fn annotate_by_ids(ctx: &CrawlContext, pairs: Vec<(u64, u32)>) -> Result<()> {
    let batch_size = ctx.config.crawl.batch_size;
    let mut batch = pairs;
    batch.truncate(batch_size);

    // Pad with random unannotated ids while we're at it
    {
        let graph = ctx.graph.lock().await;
        let mut rng = ctx.rng.lock().await;

        let mut in_batch: HashSet<u64> = batch.iter().map(|&(id, _)| id).collect();
        let pool = graph.unannotated_ids(usize::MAX);
        let mut attempts = batch_size.saturating_mul(10);

        while batch.len() < batch_size && !pool.is_empty() && attempts > 0 {
            attempts -= 1;
            let pick = pool[rng.random_range(0..pool.len())];
            if in_batch.insert(pick.0) {
                batch.push(pick);
            }
        }
    }

    if batch.is_empty() {
        return Ok(());
    }

    ctx.limits.acquire(LOOKUP_ENDPOINT).await?;

    // The acquire may have slept through a whole quota window; drop anything
    // the explorer blacklisted in the meantime
    {
        let graph = ctx.graph.lock().await;
        batch.retain(|&(id, _)| !graph.is_blacklisted(id));
    }
    if batch.is_empty() {
        return Ok(());
    }

    let requested: HashMap<u64, u32> = batch.iter().copied().collect();
    let ids: Vec<u64> = batch.iter().map(|&(id, _)| id).collect();
    tracing::debug!(count = ids.len(), "Annotating ids");

    let profiles = match ctx.api.lookup_users(UserQuery::Ids(ids)).await {
        Ok(profiles) => profiles,
        Err(e) => {
            // No way to tell which element failed; exclude them all
            tracing::warn!(error = %e, count = batch.len(), "Lookup batch failed, blacklisting batch");
            let mut graph = ctx.graph.lock().await;
            for &(id, _) in &batch {
                graph.blacklist_id(id);
            }
            return Ok(());
        }
    };

    let mut graph = ctx.graph.lock().await;
    for profile in profiles {
        match requested.get(&profile.id) {
            Some(&distance) => graph.commit_profile(profile, distance),
            // A profile we never asked for; ignore it
            None => tracing::debug!(id = profile.id, "Unrequested profile in lookup result"),
        }
    }

    // Whatever the service silently dropped is gone for good
    for &(id, _) in &batch {
        if !graph.is_annotated(id) {
            tracing::info!(id, "Id not resolved by lookup, blacklisting");
            graph.blacklist_id(id);
        }
    }

    Ok(())
}

/// Annotates the explicit seed set, keyed by handle
///
/// Returns immediately with no remote call if `pairs` is empty. Seed handles
/// the service cannot resolve are logged and skipped; no numeric id was ever
/// learned, so there is nothing to blacklist.
pub async fn annotate_by_names(ctx: &CrawlContext, pairs: Vec<(String, u32)>) -> Result<()> {
    if pairs.is_empty() {
        return Ok(());
    }

    let mut batch = pairs;
    batch.truncate(ctx.config.crawl.batch_size);

    ctx.limits.acquire(LOOKUP_ENDPOINT).await?;

    let names: Vec<String> = batch.iter().map(|(name, _)| name.clone()).collect();
    tracing::debug!(?names, "Annotating seed handles");

    let profiles = match ctx.api.lookup_users(UserQuery::Names(names)).await {
        Ok(profiles) => profiles,
        Err(e) => {
            tracing::warn!(error = %e, "Seed lookup failed, continuing without unresolved seeds");
            return Ok(());
        }
    };

    let mut graph = ctx.graph.lock().await;
    let mut resolved: HashSet<String> = HashSet::new();
    for profile in profiles {
        let requested = batch
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&profile.screen_name));
        match requested {
            Some((name, distance)) => {
                resolved.insert(name.clone());
                graph.commit_profile(profile, *distance);
            }
            None => tracing::debug!(
                handle = %profile.screen_name,
                "Unrequested profile in seed lookup result"
            ),
        }
    }

    for (name, _) in &batch {
        if !resolved.contains(name) {
            tracing::warn!(handle = %name, "Seed handle could not be resolved, skipping");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, EndpointLimit, FollowerPage, Profile, RemoteApi};
    use crate::config::Config;
    use crate::state::GraphState;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::result::Result;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    fn test_config() -> Config {
        toml::from_str(
            r#"
[api]
bearer-token = "test-token"

[crawl]
seeds = ["alice"]
max-expansions = 5
rng-seed = 42

[output]
state-path = "./accounts.json"
"#,
        )
        .unwrap()
    }

    /// Mock API that resolves a fixed set of profiles and records queries
    struct LookupApi {
        known: Vec<Profile>,
        fail_lookups: bool,
        queries: StdMutex<Vec<UserQuery>>,
    }

    impl LookupApi {
        fn new(known: Vec<Profile>) -> Self {
            Self {
                known,
                fail_lookups: false,
                queries: StdMutex::new(vec![]),
            }
        }

        fn failing() -> Self {
            Self {
                known: vec![],
                fail_lookups: true,
                queries: StdMutex::new(vec![]),
            }
        }

        fn queries(&self) -> Vec<UserQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteApi for LookupApi {
        async fn rate_limit_status(
            &self,
        ) -> Result<std::collections::HashMap<String, EndpointLimit>, ApiError> {
            let generous = EndpointLimit {
                remaining: 900,
                reset_at: Utc::now().timestamp() + 900,
            };
            Ok(std::collections::HashMap::from([
                (LOOKUP_ENDPOINT.to_string(), generous),
                (crate::api::FOLLOWERS_ENDPOINT.to_string(), generous),
            ]))
        }

        async fn lookup_users(&self, query: UserQuery) -> Result<Vec<Profile>, ApiError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_lookups {
                return Err(ApiError::Status {
                    endpoint: LOOKUP_ENDPOINT,
                    status: 500,
                });
            }
            Ok(match query {
                UserQuery::Ids(ids) => self
                    .known
                    .iter()
                    .filter(|p| ids.contains(&p.id))
                    .cloned()
                    .collect(),
                UserQuery::Names(names) => self
                    .known
                    .iter()
                    .filter(|p| names.iter().any(|n| n.eq_ignore_ascii_case(&p.screen_name)))
                    .cloned()
                    .collect(),
            })
        }

        async fn follower_ids(
            &self,
            _id: u64,
            _cursor: i64,
            _page_size: u32,
        ) -> Result<FollowerPage, ApiError> {
            Ok(FollowerPage {
                ids: vec![],
                next_cursor: 0,
            })
        }
    }

    async fn context_with(api: LookupApi, graph: GraphState) -> (CrawlContext, Arc<LookupApi>) {
        let api = Arc::new(api);
        let ctx = CrawlContext::new(test_config(), api.clone(), graph);
        ctx.limits.refresh().await.unwrap();
        (ctx, api)
    }

    #[tokio::test]
    async fn test_annotate_by_ids_commits_profiles() {
        let mut graph = GraphState::new();
        graph.record_distance(1, 1);
        let (ctx, _api) = context_with(LookupApi::new(vec![Profile::bare(1, "alice")]), graph).await;

        annotate_by_ids(&ctx, vec![(1, 1)]).await.unwrap();

        let graph = ctx.graph.lock().await;
        assert!(graph.is_annotated(1));
        assert_eq!(graph.handle_of(1), Some("alice"));
        assert_eq!(graph.distance(1), Some(1));
    }

    #[tokio::test]
    async fn test_batch_padded_with_unannotated_ids() {
        // 150 placeholder ids known to the graph; asking for one id should
        // still fill the batch to the full lookup limit
        let mut graph = GraphState::new();
        graph.commit_profile(Profile::bare(1, "alice"), 0);
        let followers: Vec<u64> = (100..250).collect();
        graph.commit_followers(1, &followers).unwrap();
        let (ctx, api) = context_with(LookupApi::new(vec![]), graph).await;

        annotate_by_ids(&ctx, vec![(100, 1)]).await.unwrap();

        let queries = api.queries();
        assert_eq!(queries.len(), 1);
        match &queries[0] {
            UserQuery::Ids(ids) => {
                assert_eq!(ids.len(), 100);
                assert!(ids.contains(&100));
                // Padded ids are unique
                let unique: HashSet<u64> = ids.iter().copied().collect();
                assert_eq!(unique.len(), ids.len());
            }
            other => panic!("expected id query, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blacklisted_id_never_sent_to_lookup() {
        // Id 2 gets blacklisted after the batch was assembled (the quota wait
        // in acquire can outlast an explorer cycle); the lookup query must
        // not carry it and the exclusion must survive the batch
        let mut graph = GraphState::new();
        graph.record_distance(1, 1);
        graph.record_distance(2, 1);
        graph.blacklist_id(2);
        let (ctx, api) = context_with(LookupApi::new(vec![Profile::bare(1, "alice")]), graph).await;

        annotate_by_ids(&ctx, vec![(1, 1), (2, 1)]).await.unwrap();

        match &api.queries()[0] {
            UserQuery::Ids(ids) => assert_eq!(ids, &vec![1]),
            other => panic!("expected id query, got {other:?}"),
        }
        let graph = ctx.graph.lock().await;
        assert!(graph.is_annotated(1));
        assert!(graph.is_blacklisted(2));
        assert!(!graph.is_annotated(2));
    }

    #[tokio::test]
    async fn test_unresolved_ids_are_blacklisted() {
        let mut graph = GraphState::new();
        graph.record_distance(1, 1);
        graph.record_distance(2, 1);
        let (ctx, _api) = context_with(LookupApi::new(vec![Profile::bare(1, "alice")]), graph).await;

        annotate_by_ids(&ctx, vec![(1, 1), (2, 1)]).await.unwrap();

        let graph = ctx.graph.lock().await;
        assert!(graph.is_annotated(1));
        assert!(graph.is_blacklisted(2));
    }

    #[tokio::test]
    async fn test_failed_batch_blacklists_everything() {
        let mut graph = GraphState::new();
        graph.record_distance(1, 1);
        graph.record_distance(2, 1);
        let (ctx, _api) = context_with(LookupApi::failing(), graph).await;

        annotate_by_ids(&ctx, vec![(1, 1), (2, 1)]).await.unwrap();

        let graph = ctx.graph.lock().await;
        assert!(graph.is_blacklisted(1));
        assert!(graph.is_blacklisted(2));
    }

    #[tokio::test]
    async fn test_shorter_recorded_distance_wins() {
        let mut graph = GraphState::new();
        graph.record_distance(2, 1);
        let (ctx, _api) = context_with(LookupApi::new(vec![Profile::bare(2, "bob")]), graph).await;

        // Request carries the longer distance from a different path
        annotate_by_ids(&ctx, vec![(2, 2)]).await.unwrap();

        let graph = ctx.graph.lock().await;
        assert_eq!(graph.distance(2), Some(1));
        let stored = graph.account("bob").unwrap().profile.as_ref().unwrap();
        assert_eq!(stored.distance, Some(1));
    }

    #[tokio::test]
    async fn test_annotate_by_names_empty_makes_no_call() {
        let (ctx, api) = context_with(LookupApi::new(vec![]), GraphState::new()).await;

        annotate_by_names(&ctx, vec![]).await.unwrap();

        assert!(api.queries().is_empty());
    }

    #[tokio::test]
    async fn test_annotate_by_names_resolves_seeds() {
        let (ctx, _api) =
            context_with(LookupApi::new(vec![Profile::bare(1, "Alice")]), GraphState::new()).await;

        annotate_by_names(&ctx, vec![("alice".to_string(), 0), ("ghost".to_string(), 0)])
            .await
            .unwrap();

        let graph = ctx.graph.lock().await;
        // Case-insensitive match against the canonicalized handle
        assert!(graph.is_annotated(1));
        assert_eq!(graph.distance(1), Some(0));
        // The unresolved seed is skipped without creating state
        assert_eq!(graph.len(), 1);
    }
}
