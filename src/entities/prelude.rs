pub use super::accounts::Entity as Accounts;
pub use super::search_cache::Entity as SearchCache;
