pub mod favorites;
pub mod history;

pub use favorites::{FavoritesRepository, JsonFavoritesStore, MovieList};
pub use history::SearchHistory;

use crate::config::ClientConfig;

pub const HISTORY_FILE: &str = "search_history.json";
pub const FAVORITES_FILE: &str = "favorites.json";

pub fn open_history(config: &ClientConfig) -> anyhow::Result<SearchHistory> {
    SearchHistory::load(config.data_dir().join(HISTORY_FILE), config.history_limit)
}

pub fn open_favorites(config: &ClientConfig) -> anyhow::Result<JsonFavoritesStore> {
    JsonFavoritesStore::open(config.data_dir().join(FAVORITES_FILE))
}
