//! Remote API surface for the crawler
//!
//! The crawl engine needs exactly three remote operations: the rate-limit
//! status call, batched user lookup, and paginated follower-id fetch. They are
//! modeled as the [`RemoteApi`] trait so the engine can run against the HTTP
//! implementation or an in-memory test double.

mod http;

pub use http::HttpApi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Endpoint key for the batched user lookup quota
pub const LOOKUP_ENDPOINT: &str = "/users/lookup";

/// Endpoint key for the follower-ids quota
pub const FOLLOWERS_ENDPOINT: &str = "/followers/ids";

/// Errors from remote API calls
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error on {endpoint}: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} on {endpoint}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("Malformed response on {endpoint}: {message}")]
    Malformed {
        endpoint: &'static str,
        message: String,
    },
}

/// A user profile as returned by the lookup endpoint
///
/// `distance` is maintained locally (minimal hop count from a seed) and is
/// never supplied by the remote service. Unknown remote fields are preserved
/// in `extra` so snapshots round-trip exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub screen_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friends_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    /// Bare profile with just the cross-reference keys, for tests and fixtures
    pub fn bare(id: u64, screen_name: &str) -> Self {
        Self {
            id,
            screen_name: screen_name.to_string(),
            name: None,
            description: None,
            followers_count: None,
            friends_count: None,
            distance: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Quota state for one endpoint, as reported by the status call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointLimit {
    /// Calls left in the current window
    pub remaining: u32,

    /// Unix-seconds timestamp when the window resets
    #[serde(rename = "reset")]
    pub reset_at: i64,
}

/// Batch lookup keyed either by numeric id or by handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    Ids(Vec<u64>),
    Names(Vec<String>),
}

impl UserQuery {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Names(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One page of follower ids
#[derive(Debug, Clone, Deserialize)]
pub struct FollowerPage {
    pub ids: Vec<u64>,

    /// Cursor for the next page; `0` means this was the last page
    #[serde(default)]
    pub next_cursor: i64,
}

/// The three remote operations the crawl engine depends on
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetches the full endpoint quota map in one call
    async fn rate_limit_status(&self) -> Result<HashMap<String, EndpointLimit>, ApiError>;

    /// Resolves up to 100 ids or handles to profiles
    ///
    /// Profiles for unresolvable entries are simply absent from the result.
    async fn lookup_users(&self, query: UserQuery) -> Result<Vec<Profile>, ApiError>;

    /// Fetches one page of follower ids for an account
    async fn follower_ids(
        &self,
        id: u64,
        cursor: i64,
        page_size: u32,
    ) -> Result<FollowerPage, ApiError>;
}
