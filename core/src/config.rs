//! Bot configuration read once from the process environment: Telegram token, image
//! host base URL and API key, working directory for transient downloads. The struct
//! is passed by reference into the client and pipeline constructors; there is no
//! global config state.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Configuration for one bot process.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    /// Base URL of the image-hosting service, stored without a trailing slash
    /// (e.g. `https://img.example.com`). Also the prefix of the public links.
    pub api_base_url: String,
    pub api_key: String,
    /// Directory for transient attachment downloads. Default: the system temp dir.
    pub working_dir: PathBuf,
}

impl Config {
    /// Read configuration from the environment: `TELEGRAM_BOT_TOKEN`, `URL`,
    /// `API_KEY` (required, non-empty) and optional `WORKING_DIR`.
    pub fn from_env() -> Result<Self> {
        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let api_base_url = required("URL")?;
        let api_key = required("API_KEY")?;

        let working_dir = std::env::var("WORKING_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            bot_token,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key,
            working_dir,
        })
    }
}

fn required(name: &str) -> Result<String> {
    let value = std::env::var(name).with_context(|| format!("{name} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        bail!("{name} is set but empty");
    }
    Ok(value)
}
