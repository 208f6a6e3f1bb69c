//! Playlister CLI binary entry point.

use playlister::cli::{commands, errors, Cli};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv(); // load .env if present, ignore error
    let cli = Cli::parse_args();
    init_logging(&cli.log_level);

    if let Err(e) = commands::run(cli).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {}", errors::format_error_help(&e));
        std::process::exit(1);
    }
}

fn init_logging(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_level(false)
        .init();
}
