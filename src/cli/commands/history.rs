use crate::config::Config;
use crate::library;

pub fn cmd_history_list(config: &Config) -> anyhow::Result<()> {
    let history = library::open_history(&config.client)?;

    if history.terms().is_empty() {
        println!("No recent searches.");
        return Ok(());
    }

    println!("Recent searches:");
    for (i, term) in history.terms().iter().enumerate() {
        println!("{:>3}. {term}", i + 1);
    }

    Ok(())
}

pub fn cmd_history_remove(config: &Config, term: &str) -> anyhow::Result<()> {
    let mut history = library::open_history(&config.client)?;

    if history.remove(term) {
        history.save()?;
        println!("Removed '{term}' from history");
    } else {
        println!("'{term}' is not in history");
    }

    Ok(())
}

pub fn cmd_history_clear(config: &Config) -> anyhow::Result<()> {
    let mut history = library::open_history(&config.client)?;
    history.clear();
    history.save()?;
    println!("Search history cleared");
    Ok(())
}
