use clap::Parser;
use mission_app::app::{run, AppConfig, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let config = AppConfig::from_env().unwrap_or_default();
    if let Err(err) = run(config, cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
