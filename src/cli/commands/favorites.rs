use futures::future::join_all;
use tracing::debug;

use crate::clients::cinesearch::CinesearchClient;
use crate::config::Config;
use crate::library::{self, FavoritesRepository, MovieList};

pub async fn cmd_favorites_list(
    config: &Config,
    client: &CinesearchClient,
    list: MovieList,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    let favorites = library::open_favorites(&config.client)?;
    let ids = favorites.list(list);

    if ids.is_empty() {
        println!("Your {list} list is empty.");
        return Ok(());
    }

    let details = join_all(ids.iter().map(|id| client.movie_details(*id))).await;

    let filter = filter.map(str::to_lowercase);
    let mut shown = 0;

    for (id, detail) in ids.iter().zip(details) {
        let detail = match detail {
            Ok(detail) => detail,
            Err(e) => {
                debug!(movie_id = id, error = %e, "Skipping saved movie that failed to load");
                continue;
            }
        };

        let title = detail.title().unwrap_or("Untitled");
        if let Some(filter) = &filter
            && !title.to_lowercase().contains(filter)
        {
            continue;
        }

        let year = detail
            .field("release_date")
            .and_then(serde_json::Value::as_str)
            .and_then(|d| d.get(..4))
            .unwrap_or("????");
        println!("• {title} ({year}) | ID: {id}");
        shown += 1;
    }

    if shown == 0 {
        println!("No saved movies match.");
    }

    Ok(())
}

pub fn cmd_favorites_add(config: &Config, list: MovieList, id: i64) -> anyhow::Result<()> {
    let mut favorites = library::open_favorites(&config.client)?;

    if favorites.add(list, id)? {
        println!("Added movie {id} to {list}");
    } else {
        println!("Movie {id} is already in {list}");
    }

    Ok(())
}

pub fn cmd_favorites_remove(config: &Config, list: MovieList, id: i64) -> anyhow::Result<()> {
    let mut favorites = library::open_favorites(&config.client)?;

    if favorites.remove(list, id)? {
        println!("Movie removed");
    } else {
        println!("Movie {id} is not in {list}");
    }

    Ok(())
}
