mod details;
mod favorites;
mod history;
mod search;

pub use details::cmd_details;
pub use favorites::{cmd_favorites_add, cmd_favorites_list, cmd_favorites_remove};
pub use history::{cmd_history_clear, cmd_history_list, cmd_history_remove};
pub use search::{cmd_genres, cmd_search};
