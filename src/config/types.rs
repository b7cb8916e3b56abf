use serde::Deserialize;

/// Main configuration structure for flockmap
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub annotator: AnnotatorConfig,
    pub output: OutputConfig,
}

/// Remote API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the remote API
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Bearer token used for authentication
    #[serde(rename = "bearer-token")]
    pub bearer_token: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Crawl behavior configuration
///
/// The strategy weights, batch limit, and walk bounds are tunable parameters;
/// the defaults reproduce the stock exploration mix.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed handles to start the crawl from
    pub seeds: Vec<String>,

    /// Number of accounts to expand before terminating
    #[serde(rename = "max-expansions")]
    pub max_expansions: u32,

    /// Follower ids fetched per page (remote maximum is 5000)
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Lookup batch size (remote maximum is 100)
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Probability of the popular-unexplored strategy
    #[serde(rename = "popular-weight", default = "default_popular_weight")]
    pub popular_weight: f64,

    /// Probability of the randomized deep-walk strategy
    #[serde(rename = "deep-walk-weight", default = "default_deep_walk_weight")]
    pub deep_walk_weight: f64,

    /// Restarts allowed when a deep walk hops onto a blacklisted id
    #[serde(rename = "walk-restarts", default = "default_walk_restarts")]
    pub walk_restarts: u32,

    /// Hop bound for a single deep walk
    #[serde(rename = "max-walk-hops", default = "default_max_walk_hops")]
    pub max_walk_hops: u32,

    /// Optional RNG seed for reproducible strategy selection
    #[serde(rename = "rng-seed", default)]
    pub rng_seed: Option<u64>,
}

/// Background annotator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotatorConfig {
    /// Lookup calls held in reserve for the explorer's own annotation needs
    #[serde(rename = "lookup-reserve", default = "default_lookup_reserve")]
    pub lookup_reserve: u32,

    /// Delay between cycles after a successful batch (seconds)
    #[serde(rename = "poll-interval-secs", default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Delay when there is not enough work or quota (seconds)
    #[serde(rename = "idle-interval-secs", default = "default_idle_interval")]
    pub idle_interval_secs: u64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            lookup_reserve: default_lookup_reserve(),
            poll_interval_secs: default_poll_interval(),
            idle_interval_secs: default_idle_interval(),
        }
    }
}

/// Output and persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON state snapshot
    #[serde(rename = "state-path")]
    pub state_path: String,

    /// Interval between periodic snapshots (seconds)
    #[serde(rename = "snapshot-interval-secs", default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,
}

fn default_base_url() -> String {
    "https://api.twitter.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    5000
}

fn default_batch_size() -> usize {
    100
}

fn default_popular_weight() -> f64 {
    0.5
}

fn default_deep_walk_weight() -> f64 {
    0.25
}

fn default_walk_restarts() -> u32 {
    5
}

fn default_max_walk_hops() -> u32 {
    64
}

fn default_snapshot_interval() -> u64 {
    900
}

fn default_lookup_reserve() -> u32 {
    20
}

fn default_poll_interval() -> u64 {
    3
}

fn default_idle_interval() -> u64 {
    30
}
