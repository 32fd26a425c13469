//! GitHub repository search (developer-activity signal)
//!
//! Only `total_count` of `/search/repositories` is used. Unauthenticated
//! search is limited to 10 requests/minute; `GITHUB_TOKEN` raises that.

use serde::Deserialize;

use super::http::{build_client, send_json};
use crate::models::errors::AppResult;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
}

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> AppResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
            token,
        })
    }

    /// Number of repositories matching a search query
    pub async fn repository_count(&self, query: &str) -> AppResult<u64> {
        let url = format!("{}/search/repositories", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("q", query), ("sort", "stars"), ("order", "desc"), ("per_page", "1")])
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body: SearchResponse = send_json(request, "github").await?;
        Ok(body.total_count)
    }
}
