mod app;
mod config;
mod effects;
mod logging;
mod ui;

use client_logging::client_info;

fn main() -> anyhow::Result<()> {
    logging::initialize(logging::LogDestination::File);

    let dir = std::env::current_dir()?;
    let config = config::load_config(&dir);
    config::ensure_config_file(&dir, &config);
    client_info!("photoseek starting at {}", chrono::Utc::now().to_rfc3339());

    app::run(config)
}
