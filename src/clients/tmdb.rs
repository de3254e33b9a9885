//! TMDB (The Movie Database) API client.
//!
//! Covers the three provider calls the search gateway needs: title search,
//! per-movie detail, and the genre taxonomy.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::TmdbConfig;
use crate::models::movie::{Genre, MovieDetail};

pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "w1280";
pub const ORIGINAL_SIZE: &str = "original";

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("TMDB request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("TMDB resource not found: {0}")]
    NotFound(String),

    #[error("TMDB {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: Option<String>,
}

impl TmdbClient {
    #[must_use]
    pub fn with_shared_client(client: Client, api_key: String, config: &TmdbConfig) -> Self {
        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        let url = format!("{}{path}", self.base_url);

        let mut params: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        if let Some(language) = &self.language {
            params.push(("language", language.as_str()));
        }
        params.extend_from_slice(extra_params);

        let resp = self.client.get(&url).query(&params).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TmdbError::Status { status, body });
        }

        Ok(resp.json::<T>().await?)
    }

    pub async fn search_movies(&self, query: &str) -> Result<Vec<TmdbSearchResult>, TmdbError> {
        let resp: TmdbSearchResponse = self.get("/search/movie", &[("query", query)]).await?;
        Ok(resp.results)
    }

    /// Extended detail used to enrich a search hit.
    pub async fn get_movie(&self, id: i64) -> Result<TmdbMovie, TmdbError> {
        self.get(&format!("/movie/{id}"), &[]).await
    }

    /// Full detail with videos, credits and images attached in one request.
    pub async fn get_movie_detail(&self, id: i64) -> Result<MovieDetail, TmdbError> {
        self.get(
            &format!("/movie/{id}"),
            &[("append_to_response", "videos,credits,images")],
        )
        .await
    }

    pub async fn list_genres(&self) -> Result<Vec<Genre>, TmdbError> {
        let resp: TmdbGenreResponse = self.get("/genre/movie/list", &[]).await?;
        Ok(resp.genres)
    }

    /// Absolute asset URL, e.g. `image_url("w500", Some("/abc.jpg"))`.
    #[must_use]
    pub fn image_url(&self, size: &str, path: Option<&str>) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| format!("{}/{size}{p}", self.image_base_url))
    }
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenreResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResult {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub vote_average: Option<f64>,
    pub genres: Option<Vec<Genre>>,
    pub runtime: Option<i32>,
    pub tagline: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TmdbClient {
        TmdbClient::with_shared_client(Client::new(), "key".to_string(), &TmdbConfig::default())
    }

    #[test]
    fn image_urls_use_size_and_path() {
        let tmdb = client();
        assert_eq!(
            tmdb.image_url(POSTER_SIZE, Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            tmdb.image_url(ORIGINAL_SIZE, Some("/b.png")).as_deref(),
            Some("https://image.tmdb.org/t/p/original/b.png")
        );
        assert!(tmdb.image_url(BACKDROP_SIZE, None).is_none());
        assert!(tmdb.image_url(BACKDROP_SIZE, Some("")).is_none());
    }

    #[test]
    fn search_result_tolerates_missing_fields() {
        let hit: TmdbSearchResult = serde_json::from_value(serde_json::json!({
            "id": 272,
            "title": "Batman Begins"
        }))
        .unwrap();
        assert!(hit.genre_ids.is_empty());
        assert!(hit.poster_path.is_none());
    }
}
