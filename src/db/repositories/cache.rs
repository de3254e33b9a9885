use crate::entities::{prelude::*, search_cache};
use crate::models::movie::MovieSummary;
use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::warn;

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Most recent entry for `cache_key`. With a `ttl`, older rows are
    /// ignored and opportunistically removed.
    pub async fn get_cached_search(
        &self,
        cache_key: &str,
        ttl: Option<chrono::Duration>,
    ) -> Result<Option<Vec<MovieSummary>>> {
        let mut query = SearchCache::find().filter(search_cache::Column::CacheKey.eq(cache_key));

        if let Some(ttl) = ttl {
            let cutoff = (chrono::Utc::now() - ttl).to_rfc3339();

            if let Err(e) = SearchCache::delete_many()
                .filter(search_cache::Column::CreatedAt.lt(&cutoff))
                .exec(&self.conn)
                .await
            {
                warn!(error = %e, "Failed to purge expired search cache entries");
            }

            query = query.filter(search_cache::Column::CreatedAt.gte(cutoff));
        }

        let entry = query
            .order_by_desc(search_cache::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query search cache")?;

        match entry {
            Some(e) => {
                let results: Vec<MovieSummary> = serde_json::from_str(&e.results_json)
                    .context("Corrupt search cache entry")?;
                Ok(Some(results))
            }
            None => Ok(None),
        }
    }

    /// Replace whatever is stored under `cache_key`. No transaction: two
    /// writers racing on one key can leave two rows, and reads take the newest.
    pub async fn cache_search_results(
        &self,
        cache_key: &str,
        results: &[MovieSummary],
    ) -> Result<()> {
        let results_json = serde_json::to_string(results)?;

        SearchCache::delete_many()
            .filter(search_cache::Column::CacheKey.eq(cache_key))
            .exec(&self.conn)
            .await?;

        let active_model = search_cache::ActiveModel {
            cache_key: Set(cache_key.to_string()),
            results_json: Set(results_json),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        SearchCache::insert(active_model).exec(&self.conn).await?;

        Ok(())
    }
}
