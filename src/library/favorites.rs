//! Liked movies and watchlist for the terminal client.
//!
//! Callers only see [`FavoritesRepository`], so the JSON file store can be
//! swapped for a server-backed one later.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieList {
    Liked,
    Watchlist,
}

impl fmt::Display for MovieList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liked => write!(f, "liked"),
            Self::Watchlist => write!(f, "watchlist"),
        }
    }
}

pub trait FavoritesRepository: Send + Sync {
    /// Movie ids in insertion order.
    fn list(&self, list: MovieList) -> Vec<i64>;

    fn contains(&self, list: MovieList, movie_id: i64) -> bool {
        self.list(list).contains(&movie_id)
    }

    /// Returns `false` when the movie was already present.
    fn add(&mut self, list: MovieList, movie_id: i64) -> Result<bool>;

    /// Returns `false` when the movie was not present.
    fn remove(&mut self, list: MovieList, movie_id: i64) -> Result<bool>;

    /// Adds or removes; returns whether the movie is now in the list.
    fn toggle(&mut self, list: MovieList, movie_id: i64) -> Result<bool> {
        if self.contains(list, movie_id) {
            self.remove(list, movie_id)?;
            Ok(false)
        } else {
            self.add(list, movie_id)?;
            Ok(true)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FavoritesFile {
    liked_movies: Vec<i64>,
    bookmarked_movies: Vec<i64>,
}

impl FavoritesFile {
    const fn ids(&self, list: MovieList) -> &Vec<i64> {
        match list {
            MovieList::Liked => &self.liked_movies,
            MovieList::Watchlist => &self.bookmarked_movies,
        }
    }

    const fn ids_mut(&mut self, list: MovieList) -> &mut Vec<i64> {
        match list {
            MovieList::Liked => &mut self.liked_movies,
            MovieList::Watchlist => &mut self.bookmarked_movies,
        }
    }
}

/// Both lists in one JSON document, rewritten on every change.
#[derive(Debug)]
pub struct JsonFavoritesStore {
    path: PathBuf,
    data: FavoritesFile,
}

impl JsonFavoritesStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read favorites file: {}", path.display()))?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt favorites file");
                FavoritesFile::default()
            })
        } else {
            FavoritesFile::default()
        };

        Ok(Self { path, data })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write favorites file: {}", self.path.display()))
    }
}

impl FavoritesRepository for JsonFavoritesStore {
    fn list(&self, list: MovieList) -> Vec<i64> {
        self.data.ids(list).clone()
    }

    fn add(&mut self, list: MovieList, movie_id: i64) -> Result<bool> {
        let ids = self.data.ids_mut(list);
        if ids.contains(&movie_id) {
            return Ok(false);
        }
        ids.push(movie_id);
        self.persist()?;
        Ok(true)
    }

    fn remove(&mut self, list: MovieList, movie_id: i64) -> Result<bool> {
        let ids = self.data.ids_mut(list);
        let before = ids.len();
        ids.retain(|id| *id != movie_id);
        if ids.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }
}
