//! Standalone PicBed bot binary. Loads `.env`, reads the environment config,
//! installs tracing, then runs the Telegram dispatcher until it stops.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use common::config::Config;
use common::im::telegram;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!(
        api_base_url = %config.api_base_url,
        working_dir = %config.working_dir.display(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(telegram::run_telegram_bot(config))
}

/// Console logging with `RUST_LOG` override; defaults to info.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .init();
}
