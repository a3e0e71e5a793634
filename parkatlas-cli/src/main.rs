//! Entry point for the park atlas batch harvester.
#![forbid(unsafe_code)]

use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(error) = parkatlas_cli::run().await {
        eprintln!("parkatlas: {error}");
        process::exit(1);
    }
}
