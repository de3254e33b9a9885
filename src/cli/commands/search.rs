use crate::clients::cinesearch::CinesearchClient;
use crate::config::Config;
use crate::library;
use crate::models::movie::MovieSummary;

fn print_summary(movie: &MovieSummary) {
    let year = movie
        .release_date
        .as_deref()
        .and_then(|d| d.get(..4))
        .unwrap_or("????");
    let rating = movie
        .rating
        .map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}"));

    println!("• {} ({year})  ★ {rating}  | ID: {}", movie.title, movie.id);

    let mut facts = Vec::new();
    if let Some(genres) = movie.genres.as_ref().filter(|g| !g.is_empty()) {
        facts.push(genres.join(", "));
    }
    if let Some(runtime) = movie.runtime.filter(|r| *r > 0) {
        facts.push(format!("{runtime} min"));
    }
    if !facts.is_empty() {
        println!("  {}", facts.join(" | "));
    }
    if let Some(tagline) = &movie.tagline {
        println!("  \"{tagline}\"");
    }
    println!();
}

pub async fn cmd_search(
    config: &Config,
    client: &CinesearchClient,
    query: &str,
    genre: Option<i64>,
) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    let results = client.search(query, genre).await?;

    if results.is_empty() {
        println!("No movies found matching '{query}'");
        return Ok(());
    }

    let mut history = library::open_history(&config.client)?;
    history.add(query);
    history.save()?;

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for movie in &results {
        print_summary(movie);
    }

    println!("For details: cinesearch details <id>");

    Ok(())
}

pub async fn cmd_genres(client: &CinesearchClient) -> anyhow::Result<()> {
    let genres = client.genres().await?;

    println!("{:<8} Name", "ID");
    println!("{:-<30}", "");
    for genre in genres {
        println!("{:<8} {}", genre.id, genre.name);
    }

    Ok(())
}
