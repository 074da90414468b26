use std::process;

use ridewise::config::Config;
use ridewise::engine::Engine;
use ridewise::error::Error;
use ridewise::server::serve;
use tracing_subscriber::EnvFilter;

fn refuse_to_start(err: Error) -> ! {
    tracing::error!("refusing to start: {}", err);
    process::exit(1)
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().unwrap_or_else(|err| refuse_to_start(err));
    let engine = Engine::from_config(&config).unwrap_or_else(|err| refuse_to_start(err));

    serve(engine, config.addr()).await;
}
