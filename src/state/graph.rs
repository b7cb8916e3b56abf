//! Resumable in-memory graph state
//!
//! Holds the handle-keyed account map (the persisted record), the numeric
//! identity index, the distance and degree bookkeeping, and the per-run
//! blacklist. Every other component mutates the graph through this type, so
//! the distance invariant (monotonically non-increasing per id) and the
//! blacklist invariant (a blacklisted id never re-enters the live index) are
//! enforced in one place.

use std::collections::{HashMap, HashSet};

use crate::api::Profile;
use crate::state::{Account, AccountPhase};
use crate::{CrawlError, Result};

/// The crawl's mutable graph model
#[derive(Debug, Default)]
pub struct GraphState {
    /// Persisted record: handle -> account
    accounts: HashMap<String, Account>,

    /// Identity index: id -> owning handle, `None` while a placeholder
    ids: HashMap<u64, Option<String>>,

    /// Minimal known hop count from any seed
    distances: HashMap<u64, u32>,

    /// Times an id was observed as a follower of an expanded account
    degrees: HashMap<u64, u32>,

    /// Ids permanently excluded for this run
    blacklist: HashSet<u64>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the full state from a persisted handle -> account map
    ///
    /// Replays every account's recorded profile distance and follower list to
    /// reconstruct the identity index, distance map, and degree map. An
    /// annotated account without a distance indicates corrupted persisted
    /// state and fails fatally.
    pub fn from_accounts(accounts: HashMap<String, Account>) -> Result<Self> {
        let mut graph = Self {
            accounts,
            ..Self::default()
        };

        for (handle, account) in &graph.accounts {
            let profile = account.profile.as_ref().ok_or_else(|| {
                CrawlError::CorruptState(format!("account {handle} has no profile"))
            })?;
            let distance = profile.distance.ok_or_else(|| {
                CrawlError::CorruptState(format!("account {handle} has no recorded distance"))
            })?;

            graph.ids.insert(profile.id, Some(handle.clone()));
            let entry = graph.distances.entry(profile.id).or_insert(distance);
            *entry = (*entry).min(distance);

            if let Some(followers) = &account.followers {
                for &follower in followers {
                    graph.ids.entry(follower).or_insert(None);
                    let entry = graph.distances.entry(follower).or_insert(distance + 1);
                    *entry = (*entry).min(distance + 1);
                    *graph.degrees.entry(follower).or_insert(0) += 1;
                }
            }
        }

        Ok(graph)
    }

    /// Persisted view of the state
    pub fn accounts(&self) -> &HashMap<String, Account> {
        &self.accounts
    }

    pub fn handle_of(&self, id: u64) -> Option<&str> {
        self.ids.get(&id).and_then(|h| h.as_deref())
    }

    pub fn account(&self, handle: &str) -> Option<&Account> {
        self.accounts.get(handle)
    }

    pub fn account_by_id(&self, id: u64) -> Option<&Account> {
        self.handle_of(id).and_then(|h| self.accounts.get(h))
    }

    pub fn distance(&self, id: u64) -> Option<u32> {
        self.distances.get(&id).copied()
    }

    pub fn degree(&self, id: u64) -> u32 {
        self.degrees.get(&id).copied().unwrap_or(0)
    }

    pub fn is_blacklisted(&self, id: u64) -> bool {
        self.blacklist.contains(&id)
    }

    pub fn is_annotated(&self, id: u64) -> bool {
        self.account_by_id(id).is_some_and(Account::is_annotated)
    }

    pub fn is_expanded(&self, id: u64) -> bool {
        self.account_by_id(id).is_some_and(Account::is_expanded)
    }

    pub fn followers_of(&self, id: u64) -> Option<&[u64]> {
        self.account_by_id(id)
            .and_then(|a| a.followers.as_deref())
    }

    /// Current lifecycle phase of an id
    pub fn phase(&self, id: u64) -> AccountPhase {
        if self.is_blacklisted(id) {
            AccountPhase::Blacklisted
        } else if self.is_expanded(id) {
            AccountPhase::Expanded
        } else if self.is_annotated(id) {
            AccountPhase::Annotated
        } else {
            AccountPhase::Unknown
        }
    }

    /// Lowers the recorded distance for an id, never raises it
    pub fn record_distance(&mut self, id: u64, distance: u32) {
        let entry = self.distances.entry(id).or_insert(distance);
        *entry = (*entry).min(distance);
    }

    /// Commits an annotation result
    ///
    /// The stored distance is the minimum of the caller-resolved distance and
    /// anything already recorded for the id. A profile for a blacklisted id
    /// is dropped; the exclusion is permanent and must not re-enter the live
    /// index through a late annotation.
    pub fn commit_profile(&mut self, mut profile: Profile, distance: u32) {
        if self.blacklist.contains(&profile.id) {
            return;
        }
        let distance = self
            .distances
            .get(&profile.id)
            .copied()
            .unwrap_or(distance)
            .min(distance);
        profile.distance = Some(distance);
        self.distances.insert(profile.id, distance);

        let id = profile.id;
        let handle = profile.screen_name.clone();
        self.ids.insert(id, Some(handle.clone()));
        self.accounts.entry(handle).or_default().profile = Some(profile);
    }

    /// Merges fetched follower ids into an annotated account
    ///
    /// Deduplicates against the existing list, bumps each fetched follower's
    /// degree, and records distance candidate+1 for every follower (only if
    /// lower than any existing value). Returns the number of newly observed
    /// follower ids.
    pub fn commit_followers(&mut self, id: u64, fetched: &[u64]) -> Result<usize> {
        let distance = self.distance(id).unwrap_or(0);
        let handle = self
            .handle_of(id)
            .ok_or_else(|| CrawlError::CorruptState(format!("no annotated account for id {id}")))?
            .to_string();

        let account = self.accounts.entry(handle).or_default();
        let followers = account.followers.get_or_insert_with(Vec::new);
        let mut known: HashSet<u64> = followers.iter().copied().collect();

        let mut added = 0;
        for &follower in fetched {
            if known.insert(follower) {
                followers.push(follower);
                added += 1;
            }
        }

        for &follower in fetched {
            self.ids.entry(follower).or_insert(None);
            self.record_distance(follower, distance + 1);
            *self.degrees.entry(follower).or_insert(0) += 1;
        }

        Ok(added)
    }

    /// Drops an id from the live index and excludes it for the rest of the run
    ///
    /// This is the only destructive transition: the owning account record (if
    /// any) is removed along with the index entry.
    pub fn blacklist_id(&mut self, id: u64) {
        if let Some(Some(handle)) = self.ids.remove(&id) {
            self.accounts.remove(&handle);
        }
        self.blacklist.insert(id);
    }

    /// Known-but-unannotated, non-blacklisted ids with their distances
    ///
    /// Iteration order follows the identity index; callers that need a bound
    /// pass `limit`.
    pub fn unannotated_ids(&self, limit: usize) -> Vec<(u64, u32)> {
        self.ids
            .keys()
            .copied()
            .filter(|&id| !self.is_blacklisted(id) && !self.is_annotated(id))
            .take(limit)
            .map(|id| (id, self.distances.get(&id).copied().unwrap_or(0)))
            .collect()
    }

    /// Ids eligible for expansion: followers unset, not blacklisted
    pub fn expansion_candidates(&self) -> impl Iterator<Item = u64> + '_ {
        self.ids
            .keys()
            .copied()
            .filter(|&id| !self.is_blacklisted(id) && !self.is_expanded(id))
    }

    /// Id with the lowest recorded distance (a seed, normally)
    pub fn lowest_distance_id(&self) -> Option<u64> {
        self.distances
            .iter()
            .filter(|(id, _)| !self.blacklist.contains(id))
            .min_by_key(|(_, &d)| d)
            .map(|(&id, _)| id)
    }

    /// All recorded (id, distance) pairs, blacklisted ids excluded
    pub fn distances(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.distances
            .iter()
            .filter(|(id, _)| !self.blacklist.contains(id))
            .map(|(&id, &d)| (id, d))
    }

    /// All recorded (id, degree) pairs, blacklisted ids excluded
    pub fn degrees(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.degrees
            .iter()
            .filter(|(id, _)| !self.blacklist.contains(id))
            .map(|(&id, &d)| (id, d))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated(graph: &mut GraphState, id: u64, handle: &str, distance: u32) {
        graph.commit_profile(Profile::bare(id, handle), distance);
    }

    #[test]
    fn test_commit_profile_records_identity_and_distance() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 1, "alice", 0);

        assert_eq!(graph.handle_of(1), Some("alice"));
        assert_eq!(graph.distance(1), Some(0));
        assert!(graph.is_annotated(1));
        assert_eq!(graph.phase(1), AccountPhase::Annotated);
    }

    #[test]
    fn test_distance_never_increases() {
        let mut graph = GraphState::new();
        graph.record_distance(9, 2);
        graph.record_distance(9, 1);
        assert_eq!(graph.distance(9), Some(1));

        // A later, longer path must not raise it back
        graph.record_distance(9, 4);
        assert_eq!(graph.distance(9), Some(1));
    }

    #[test]
    fn test_commit_profile_keeps_shorter_recorded_distance() {
        // bob observed at distance 2 via one path, annotated at distance 1
        // via a later-discovered path: stored distance must be 1
        let mut graph = GraphState::new();
        graph.record_distance(2, 2);
        annotated(&mut graph, 2, "bob", 1);
        assert_eq!(graph.distance(2), Some(1));
        assert_eq!(graph.account("bob").unwrap().profile.as_ref().unwrap().distance, Some(1));

        // And the other way around: annotation request carrying the longer
        // distance must not overwrite the shorter one
        let mut graph = GraphState::new();
        graph.record_distance(2, 1);
        annotated(&mut graph, 2, "bob", 2);
        assert_eq!(graph.distance(2), Some(1));
    }

    #[test]
    fn test_commit_followers_merges_and_counts() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 1, "alice", 0);

        let added = graph.commit_followers(1, &[2, 3]).unwrap();
        assert_eq!(added, 2);
        assert_eq!(graph.followers_of(1), Some(&[2, 3][..]));
        assert_eq!(graph.distance(2), Some(1));
        assert_eq!(graph.distance(3), Some(1));
        assert_eq!(graph.degree(2), 1);
        assert_eq!(graph.degree(3), 1);
        assert!(graph.is_expanded(1));

        // A second expansion of another account listing id 2 again
        annotated(&mut graph, 5, "carol", 0);
        graph.commit_followers(5, &[2]).unwrap();
        assert_eq!(graph.degree(2), 2);
    }

    #[test]
    fn test_commit_followers_deduplicates() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 1, "alice", 0);
        graph.commit_followers(1, &[2, 2, 3]).unwrap();
        assert_eq!(graph.followers_of(1), Some(&[2, 3][..]));

        let added = graph.commit_followers(1, &[3, 4]).unwrap();
        assert_eq!(added, 1);
        assert_eq!(graph.followers_of(1), Some(&[2, 3, 4][..]));
    }

    #[test]
    fn test_blacklist_removes_account_and_index() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 7, "mallory", 1);

        graph.blacklist_id(7);
        assert!(graph.is_blacklisted(7));
        assert!(graph.account("mallory").is_none());
        assert_eq!(graph.handle_of(7), None);
        assert_eq!(graph.phase(7), AccountPhase::Blacklisted);
        assert!(!graph.expansion_candidates().any(|id| id == 7));
    }

    #[test]
    fn test_commit_profile_ignores_blacklisted_id() {
        // A late annotation result for an id blacklisted in the meantime must
        // not resurrect it in the live index
        let mut graph = GraphState::new();
        graph.record_distance(7, 1);
        graph.blacklist_id(7);

        graph.commit_profile(Profile::bare(7, "mallory"), 1);

        assert!(graph.is_blacklisted(7));
        assert!(!graph.is_annotated(7));
        assert!(graph.account("mallory").is_none());
        assert_eq!(graph.handle_of(7), None);
    }

    #[test]
    fn test_expansion_candidates_exclude_expanded() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 1, "alice", 0);
        graph.commit_followers(1, &[2, 3]).unwrap();

        let candidates: Vec<u64> = graph.expansion_candidates().collect();
        assert!(!candidates.contains(&1));
        assert!(candidates.contains(&2));
        assert!(candidates.contains(&3));
    }

    #[test]
    fn test_unannotated_ids_skip_annotated() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 1, "alice", 0);
        graph.commit_followers(1, &[2, 3]).unwrap();
        annotated(&mut graph, 2, "bob", 1);

        let pending = graph.unannotated_ids(10);
        assert_eq!(pending, vec![(3, 1)]);
    }

    #[test]
    fn test_from_accounts_replays_distances_and_degrees() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 1, "alice", 0);
        graph.commit_followers(1, &[2, 3]).unwrap();
        annotated(&mut graph, 2, "bob", 1);
        graph.commit_followers(2, &[3]).unwrap();

        let rebuilt = GraphState::from_accounts(graph.accounts().clone()).unwrap();
        assert_eq!(rebuilt.distance(1), Some(0));
        assert_eq!(rebuilt.distance(2), Some(1));
        assert_eq!(rebuilt.distance(3), Some(1));
        assert_eq!(rebuilt.degree(3), 2);
        assert_eq!(rebuilt.handle_of(2), Some("bob"));
        assert!(rebuilt.is_expanded(1));
        assert!(!rebuilt.is_annotated(3));
    }

    #[test]
    fn test_from_accounts_rejects_missing_distance() {
        let accounts = HashMap::from([(
            "alice".to_string(),
            Account {
                profile: Some(Profile::bare(1, "alice")),
                followers: None,
            },
        )]);

        let err = GraphState::from_accounts(accounts).unwrap_err();
        assert!(matches!(err, CrawlError::CorruptState(_)));
    }

    #[test]
    fn test_lowest_distance_id() {
        let mut graph = GraphState::new();
        annotated(&mut graph, 1, "alice", 0);
        graph.commit_followers(1, &[2]).unwrap();
        assert_eq!(graph.lowest_distance_id(), Some(1));
    }
}
