//! Login command and stored credentials.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cheevos::{Client, Credential};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    host: String,
    username: String,
    token: String,
}

fn credentials_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(config_dir.join("cheevos").join("credentials.toml"))
}

pub fn run(client: &Client, username: &str, password: &str) -> Result<()> {
    let user = client
        .login(username, Credential::Password(password.to_string()))?
        .wait()
        .context("Login failed")?;

    let stored = StoredCredentials {
        host: client.config().host.clone(),
        username: user.username.clone(),
        token: user.token.clone(),
    };
    let cred_path = credentials_path()?;
    save_credentials(&cred_path, &stored)?;

    println!("Logged in as {} ({} points)", user.display_name, user.score);
    if user.num_unread_messages > 0 {
        println!("{} unread messages", user.num_unread_messages);
    }
    println!("Credentials saved to: {}", cred_path.display());
    Ok(())
}

pub fn logout() -> Result<()> {
    let cred_path = credentials_path()?;
    if cred_path.exists() {
        fs::remove_file(&cred_path).context("Failed to remove credentials file")?;
        println!("Removed {}", cred_path.display());
    } else {
        println!("Not logged in");
    }
    Ok(())
}

/// Log `client` in with the stored token.
pub fn restore_session(client: &Client) -> Result<()> {
    let cred_path = credentials_path()?;
    let stored = load_credentials(&cred_path)?;
    if stored.host != client.config().host {
        tracing::warn!(
            "Stored credentials are for {}, not {}",
            stored.host,
            client.config().host
        );
    }
    client
        .login(&stored.username, Credential::Token(stored.token))?
        .wait()
        .context("Stored token was rejected, run `cheevos login` again")?;
    Ok(())
}

fn save_credentials(path: &PathBuf, credentials: &StoredCredentials) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let content =
        toml::to_string_pretty(credentials).context("Failed to serialize credentials")?;
    fs::write(path, content).context("Failed to write credentials file")?;
    Ok(())
}

fn load_credentials(path: &PathBuf) -> Result<StoredCredentials> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("No stored credentials at {}", path.display()))?;
    toml::from_str(&content).context("Failed to parse credentials file")
}
