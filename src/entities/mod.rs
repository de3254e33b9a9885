pub mod prelude;

pub mod accounts;
pub mod search_cache;
