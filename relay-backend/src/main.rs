use dotenv::dotenv;
use std::sync::Arc;

mod ai;
mod channels;
mod commands;
mod config;
mod discord;

use ai::{Completer, GroqClient};
use channels::ActivationStore;
use config::Config;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    log::info!("Relaybot v{}", env!("CARGO_PKG_VERSION"));

    // Credentials are required; stop here rather than connect half-configured
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("Loaded config: {:?}", config);

    let store = Arc::new(ActivationStore::load(&config.active_channels_file));
    log::info!(
        "Loaded {} active channel(s) from {}",
        store.len(),
        store.path().display()
    );

    let completer = GroqClient::from_config(&config);
    log::info!("Using completion model {}", completer.model());
    let completer: Arc<dyn Completer> = Arc::new(completer);

    if let Err(e) = discord::run(&config, store, completer).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
