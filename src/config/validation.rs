use crate::config::types::Config;
use crate::ConfigError;

/// Remote batch lookup limit; batches above this are rejected by the service.
pub const LOOKUP_BATCH_LIMIT: usize = 100;

/// Remote follower-page limit.
pub const FOLLOWER_PAGE_LIMIT: u32 = 5000;

/// Validates a parsed configuration
///
/// Checks that the crawl has at least one seed, that tunables stay within
/// the remote service's hard limits, and that the strategy weights leave
/// room for the breadth-first fallback.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawl.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed handle is required".to_string(),
        ));
    }

    if config.crawl.seeds.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "seed handles must not be empty".to_string(),
        ));
    }

    if config.crawl.max_expansions == 0 {
        return Err(ConfigError::Validation(
            "max-expansions must be greater than zero".to_string(),
        ));
    }

    if config.crawl.batch_size == 0 || config.crawl.batch_size > LOOKUP_BATCH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and {}",
            LOOKUP_BATCH_LIMIT
        )));
    }

    if config.crawl.page_size == 0 || config.crawl.page_size > FOLLOWER_PAGE_LIMIT {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}",
            FOLLOWER_PAGE_LIMIT
        )));
    }

    let popular = config.crawl.popular_weight;
    let deep = config.crawl.deep_walk_weight;
    if !(0.0..=1.0).contains(&popular) || !(0.0..=1.0).contains(&deep) {
        return Err(ConfigError::Validation(
            "strategy weights must be within [0, 1]".to_string(),
        ));
    }
    if popular + deep > 1.0 {
        return Err(ConfigError::Validation(
            "popular-weight + deep-walk-weight must not exceed 1.0".to_string(),
        ));
    }

    if config.api.bearer_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api bearer-token must not be empty".to_string(),
        ));
    }

    if config.output.state_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output state-path must not be empty".to_string(),
        ));
    }

    if config.output.snapshot_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "snapshot-interval-secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{AnnotatorConfig, ApiConfig, CrawlConfig, OutputConfig};

    fn valid_config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "https://api.example.com".to_string(),
                bearer_token: "token".to_string(),
                timeout_secs: 30,
            },
            crawl: CrawlConfig {
                seeds: vec!["alice".to_string()],
                max_expansions: 100,
                page_size: 5000,
                batch_size: 100,
                popular_weight: 0.5,
                deep_walk_weight: 0.25,
                walk_restarts: 5,
                max_walk_hops: 64,
                rng_seed: None,
            },
            annotator: AnnotatorConfig::default(),
            output: OutputConfig {
                state_path: "./accounts.json".to_string(),
                snapshot_interval_secs: 900,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_seeds_rejected() {
        let mut config = valid_config();
        config.crawl.seeds.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_expansions_rejected() {
        let mut config = valid_config();
        config.crawl.max_expansions = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let mut config = valid_config();
        config.crawl.batch_size = 101;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_oversized_page_rejected() {
        let mut config = valid_config();
        config.crawl.page_size = 5001;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_weights_exceeding_one_rejected() {
        let mut config = valid_config();
        config.crawl.popular_weight = 0.8;
        config.crawl.deep_walk_weight = 0.3;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = valid_config();
        config.api.bearer_token = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_snapshot_interval_rejected() {
        let mut config = valid_config();
        config.output.snapshot_interval_secs = 0;
        assert!(validate(&config).is_err());
    }
}
