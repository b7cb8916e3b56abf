//! HTTP implementation of the remote API
//!
//! Thin `reqwest` client against the v1.1-style JSON endpoints:
//! - `GET /1.1/application/rate_limit_status.json`
//! - `GET /1.1/users/lookup.json`
//! - `GET /1.1/followers/ids.json`
//!
//! The base URL is configurable so tests can point the client at a mock
//! server.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::api::{
    ApiError, EndpointLimit, FollowerPage, Profile, RemoteApi, UserQuery, FOLLOWERS_ENDPOINT,
    LOOKUP_ENDPOINT,
};
use crate::config::ApiConfig;

const STATUS_ENDPOINT: &str = "/application/rate_limit_status";

/// Rate-limit status response: per-category maps of endpoint path to limit
#[derive(Debug, Deserialize)]
struct StatusResponse {
    resources: HashMap<String, HashMap<String, EndpointLimit>>,
}

/// `reqwest`-backed [`RemoteApi`] implementation
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Builds the HTTP client from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(format!("flockmap/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                let mut auth = reqwest::header::HeaderValue::from_str(&format!(
                    "Bearer {}",
                    config.bearer_token
                ))
                .unwrap_or_else(|_| reqwest::header::HeaderValue::from_static("Bearer invalid"));
                auth.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, auth);
                headers
            })
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Http { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Malformed {
                endpoint,
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn rate_limit_status(&self) -> Result<HashMap<String, EndpointLimit>, ApiError> {
        let status: StatusResponse = self
            .get_json(
                STATUS_ENDPOINT,
                "/1.1/application/rate_limit_status.json",
                &[],
            )
            .await?;

        // Flatten the per-category maps into a single endpoint -> limit map
        let mut limits = HashMap::new();
        for endpoints in status.resources.into_values() {
            limits.extend(endpoints);
        }
        Ok(limits)
    }

    async fn lookup_users(&self, query: UserQuery) -> Result<Vec<Profile>, ApiError> {
        let param = match &query {
            UserQuery::Ids(ids) => (
                "user_id",
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            UserQuery::Names(names) => ("screen_name", names.join(",")),
        };

        self.get_json(LOOKUP_ENDPOINT, "/1.1/users/lookup.json", &[param])
            .await
    }

    async fn follower_ids(
        &self,
        id: u64,
        cursor: i64,
        page_size: u32,
    ) -> Result<FollowerPage, ApiError> {
        self.get_json(
            FOLLOWERS_ENDPOINT,
            "/1.1/followers/ids.json",
            &[
                ("user_id", id.to_string()),
                ("cursor", cursor.to_string()),
                ("count", page_size.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_api(base_url: &str) -> HttpApi {
        HttpApi::new(&ApiConfig {
            base_url: base_url.to_string(),
            bearer_token: "test-token".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_rate_limit_status_flattens_categories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/application/rate_limit_status.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"resources": {
                    "users": {"/users/lookup": {"limit": 900, "remaining": 899, "reset": 1700000000}},
                    "followers": {"/followers/ids": {"limit": 15, "remaining": 15, "reset": 1700000900}}
                }}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let limits = test_api(&server.uri()).rate_limit_status().await.unwrap();
        assert_eq!(limits.len(), 2);
        assert_eq!(limits["/users/lookup"].remaining, 899);
        assert_eq!(limits["/followers/ids"].reset_at, 1700000900);
    }

    #[tokio::test]
    async fn test_lookup_users_by_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/users/lookup.json"))
            .and(query_param("user_id", "1,2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"id": 1, "screen_name": "alice"}, {"id": 2, "screen_name": "bob"}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let profiles = test_api(&server.uri())
            .lookup_users(UserQuery::Ids(vec![1, 2]))
            .await
            .unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].screen_name, "alice");
    }

    #[tokio::test]
    async fn test_follower_ids_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/followers/ids.json"))
            .and(query_param("user_id", "7"))
            .and(query_param("cursor", "-1"))
            .and(query_param("count", "5000"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"ids": [10, 11, 12], "next_cursor": 0}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let page = test_api(&server.uri())
            .follower_ids(7, -1, 5000)
            .await
            .unwrap();
        assert_eq!(page.ids, vec![10, 11, 12]);
        assert_eq!(page.next_cursor, 0);
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/followers/ids.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = test_api(&server.uri())
            .follower_ids(7, -1, 5000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status {
                endpoint: FOLLOWERS_ENDPOINT,
                status: 401
            }
        ));
    }
}
