use crate::clients::cinesearch::CinesearchClient;
use serde_json::Value;

/// `name` fields of a provider array such as `genres` or `credits.cast`.
fn names(items: Option<&Value>, limit: usize) -> Vec<String> {
    items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .take(limit)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub async fn cmd_details(client: &CinesearchClient, id: i64) -> anyhow::Result<()> {
    let detail = client.movie_details(id).await?;

    println!("{}", detail.title().unwrap_or("Untitled"));
    println!("{:-<60}", "");

    if let Some(tagline) = detail
        .field("tagline")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    {
        println!("\"{tagline}\"");
        println!();
    }

    if let Some(date) = detail.field("release_date").and_then(Value::as_str) {
        println!("Released: {date}");
    }
    if let Some(runtime) = detail.field("runtime").and_then(Value::as_i64) {
        println!("Runtime:  {runtime} min");
    }
    if let Some(rating) = detail.field("vote_average").and_then(Value::as_f64) {
        println!("Rating:   {rating:.1}/10");
    }

    let genres = names(detail.field("genres"), usize::MAX);
    if !genres.is_empty() {
        println!("Genres:   {}", genres.join(", "));
    }

    let cast = names(detail.field("credits").and_then(|c| c.get("cast")), 5);
    if !cast.is_empty() {
        println!("Cast:     {}", cast.join(", "));
    }

    if let Some(overview) = detail.field("overview").and_then(Value::as_str) {
        println!();
        println!("{overview}");
    }

    if let Some(poster) = &detail.poster_path_full {
        println!();
        println!("Poster:   {poster}");
    }
    if let Some(backdrop) = &detail.backdrop_path_full {
        println!("Backdrop: {backdrop}");
    }

    for trailer in detail.trailers.iter().flatten() {
        if let Some(key) = &trailer.key {
            println!(
                "Trailer:  https://www.youtube.com/watch?v={key} ({})",
                trailer.name.as_deref().unwrap_or("Trailer")
            );
        }
    }

    Ok(())
}
