use anyhow::{Context, Result};
use cheevos::{Client, ConsoleId};

pub fn run(client: &Client, console: ConsoleId, json: bool) -> Result<()> {
    let entries = client
        .fetch_hash_library(console)?
        .wait()
        .context("Failed to fetch hash library")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{}  {}", entry.hash, entry.game_id);
    }
    eprintln!("{} hashes for {}", entries.len(), console);
    Ok(())
}
