//! Movie search with a persistent result cache, plus genre and detail lookups.

use futures::future::join_all;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::tmdb::{
    BACKDROP_SIZE, ORIGINAL_SIZE, POSTER_SIZE, TmdbClient, TmdbError, TmdbSearchResult,
};
use crate::db::Store;
use crate::models::movie::{Genre, MovieDetail, MovieSummary};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),

    #[error("TMDB API key is not configured")]
    MissingApiKey,

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Provider(#[from] TmdbError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Cache key for a search, `"{query}_{genre}"` when a genre filter applies.
#[must_use]
pub fn cache_key(query: &str, genre: Option<i64>) -> String {
    match genre {
        Some(genre) => format!("{query}_{genre}"),
        None => query.to_string(),
    }
}

pub struct SearchService {
    store: Store,
    tmdb: Option<TmdbClient>,
    cache_ttl: Option<chrono::Duration>,
    enrichment_stagger: Duration,
}

impl SearchService {
    #[must_use]
    pub const fn new(
        store: Store,
        tmdb: Option<TmdbClient>,
        cache_ttl: Option<chrono::Duration>,
        enrichment_stagger: Duration,
    ) -> Self {
        Self {
            store,
            tmdb,
            cache_ttl,
            enrichment_stagger,
        }
    }

    fn tmdb(&self) -> Result<&TmdbClient, SearchError> {
        self.tmdb.as_ref().ok_or(SearchError::MissingApiKey)
    }

    /// Cached results when an enriched entry exists, otherwise a fresh
    /// provider search whose matches are enriched concurrently and cached.
    pub async fn search(
        &self,
        query: &str,
        genre: Option<i64>,
    ) -> Result<Vec<MovieSummary>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::Validation("Query is required".to_string()));
        }
        if let Some(genre) = genre
            && genre <= 0
        {
            return Err(SearchError::Validation(format!(
                "Invalid genre ID: {genre}. Genre must be a positive integer"
            )));
        }
        let tmdb = self.tmdb()?;

        let key = cache_key(query, genre);

        if let Some(cached) = self.store.get_cached_search(&key, self.cache_ttl).await?
            && cached.first().is_some_and(MovieSummary::is_enriched)
        {
            metrics::counter!("search_cache_hits_total").increment(1);
            debug!(cache_key = %key, results = cached.len(), "Serving search from cache");
            return Ok(cached);
        }
        metrics::counter!("search_cache_misses_total").increment(1);

        let mut hits = tmdb.search_movies(query).await?;
        if let Some(genre) = genre {
            hits.retain(|hit| hit.genre_ids.contains(&genre));
        }

        let results: Vec<MovieSummary> = join_all(
            hits.into_iter()
                .enumerate()
                .map(|(index, hit)| self.enrich(tmdb, index, hit)),
        )
        .await;

        self.store.cache_search_results(&key, &results).await?;

        info!(
            cache_key = %key,
            results = results.len(),
            "Search fetched from provider and cached"
        );

        Ok(results)
    }

    /// Each fetch starts `index * stagger` after the first so a large result
    /// page does not burst the provider. A failed fetch keeps the movie with
    /// the detail fields left empty.
    async fn enrich(&self, tmdb: &TmdbClient, index: usize, hit: TmdbSearchResult) -> MovieSummary {
        let delay = self
            .enrichment_stagger
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut summary = MovieSummary {
            id: hit.id,
            title: hit.title,
            overview: hit.overview,
            poster: tmdb.image_url(POSTER_SIZE, hit.poster_path.as_deref()),
            backdrop: tmdb.image_url(BACKDROP_SIZE, hit.backdrop_path.as_deref()),
            release_date: hit.release_date,
            rating: None,
            genres: None,
            runtime: None,
            tagline: None,
        };

        match tmdb.get_movie(hit.id).await {
            Ok(detail) => {
                summary.rating = detail.vote_average;
                summary.genres = Some(
                    detail
                        .genres
                        .unwrap_or_default()
                        .into_iter()
                        .map(|g| g.name)
                        .collect(),
                );
                summary.runtime = detail.runtime;
                summary.tagline = detail.tagline.filter(|t| !t.trim().is_empty());
            }
            Err(e) => {
                metrics::counter!("movie_enrichment_failures_total").increment(1);
                warn!(movie_id = hit.id, error = %e, "Failed to fetch movie detail, keeping partial data");
            }
        }

        summary
    }

    pub async fn list_genres(&self) -> Result<Vec<Genre>, SearchError> {
        Ok(self.tmdb()?.list_genres().await?)
    }

    /// Provider detail decorated with full asset URLs and YouTube trailers.
    pub async fn get_movie_detail(&self, id: i64) -> Result<MovieDetail, SearchError> {
        if id <= 0 {
            return Err(SearchError::Validation(format!(
                "Invalid movie ID: {id}. ID must be a positive integer"
            )));
        }
        let tmdb = self.tmdb()?;

        let mut detail = match tmdb.get_movie_detail(id).await {
            Ok(detail) => detail,
            Err(TmdbError::NotFound(_)) => {
                return Err(SearchError::NotFound(format!("Movie {id} not found")));
            }
            Err(e) => return Err(e.into()),
        };

        detail.poster_path_full = tmdb.image_url(POSTER_SIZE, detail.poster_path.as_deref());
        detail.backdrop_path_full = tmdb.image_url(ORIGINAL_SIZE, detail.backdrop_path.as_deref());
        detail.trailers = Some(
            detail
                .videos
                .as_ref()
                .map(|videos| {
                    videos
                        .results
                        .iter()
                        .filter(|v| v.is_youtube_trailer())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        );

        Ok(detail)
    }
}
