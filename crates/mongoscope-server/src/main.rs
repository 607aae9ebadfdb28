//! mongoscope server binary

use clap::Parser;
use mongoscope_server::{init_logging, run_server, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    let config = Config::parse();
    init_logging(&config.log_level);

    run_server(config).await
}
