//! Flockmap: an incremental follower-graph crawler
//!
//! This crate discovers a directed social-follower graph by repeatedly querying
//! a quota-limited remote API, persisting partial progress so a crawl can resume
//! after interruption. Exploration mixes popularity, deep-walk, and breadth-first
//! strategies so no single high-degree account starves the crawl.

pub mod annotate;
pub mod api;
pub mod config;
pub mod crawler;
pub mod explore;
pub mod limits;
pub mod output;
pub mod persist;
pub mod state;

use thiserror::Error;

/// Main error type for flockmap operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Rate limit status unavailable: {0}")]
    LimitsUnavailable(#[source] api::ApiError),

    #[error("Unknown rate-limited endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Corrupted persisted state: {0}")]
    CorruptState(String),

    #[error("Snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for flockmap operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::{EndpointLimit, Profile, RemoteApi, UserQuery};
pub use config::Config;
pub use crawler::{CrawlContext, CrawlOutcome};
pub use state::{Account, AccountPhase, GraphState};
