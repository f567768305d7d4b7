mod config;
mod error;
mod health;
mod http;
mod logger;
mod pages;
mod pipeline;
mod server;

use std::sync::Arc;

use config::{AppState, Config};
use error::AppError;

fn main() -> Result<(), AppError> {
    // Optional first argument names the config file stem (default "config")
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), AppError> {
    let addr = cfg.socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(AppState::new(cfg));

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    logger::log_server_start(&addr, &state.config);

    server::run(listener, state, Arc::clone(&signals.shutdown)).await;
    Ok(())
}
