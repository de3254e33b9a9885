//! HTTP client for a running cinesearch server, used by the terminal client.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::movie::{Genre, MovieDetail, MovieSummary};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    kind: String,
    message: String,
}

#[derive(Clone)]
pub struct CinesearchClient {
    client: Client,
    base_url: String,
}

impl CinesearchClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_shared_client(Client::new(), base_url)
    }

    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Calling cinesearch server");

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to reach cinesearch server at {}", self.base_url))?;

        let status = resp.status();
        let envelope: Envelope<T> = resp
            .json()
            .await
            .with_context(|| format!("Unexpected response from server ({status})"))?;

        if !envelope.success {
            let (kind, message) = envelope
                .error
                .map_or_else(|| ("unknown".to_string(), status.to_string()), |e| (e.kind, e.message));
            bail!("{message} ({kind})");
        }

        envelope.data.context("Server response is missing data")
    }

    pub async fn search(&self, query: &str, genre: Option<i64>) -> Result<Vec<MovieSummary>> {
        let mut params = vec![("query", query.to_string())];
        if let Some(genre) = genre {
            params.push(("genre", genre.to_string()));
        }
        self.get("/api/movies/search", &params).await
    }

    pub async fn genres(&self) -> Result<Vec<Genre>> {
        self.get("/api/movies/genres", &[]).await
    }

    pub async fn movie_details(&self, id: i64) -> Result<MovieDetail> {
        self.get(&format!("/api/movies/details/{id}"), &[]).await
    }
}
