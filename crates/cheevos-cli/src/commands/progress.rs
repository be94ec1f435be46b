use anyhow::{Context, Result};
use cheevos::{Client, ConsoleId};

use super::login::restore_session;

pub fn run(client: &Client, console: ConsoleId, json: bool) -> Result<()> {
    restore_session(client)?;
    let entries = client
        .fetch_all_user_progress(console)?
        .wait()
        .context("Failed to fetch progress")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{} ({} games)", console, entries.len());
    println!("{:>8}  {:>9}  {:>9}  {:>5}", "game", "softcore", "hardcore", "total");
    for entry in &entries {
        println!(
            "{:>8}  {:>9}  {:>9}  {:>5}",
            entry.game_id,
            entry.num_unlocked_achievements,
            entry.num_unlocked_achievements_hardcore,
            entry.num_achievements
        );
    }
    Ok(())
}
