use tp_harness::{tune, TuneConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::var("TUNEPLEX_CONFIG")
        .ok()
        .or_else(|| std::env::args().nth(1));

    let config = match path {
        Some(path) => TuneConfig::load(&path)?,
        None => {
            tracing::info!("No config given; running the built-in oscillator demo");
            TuneConfig::default()
        }
    };

    let outcome = tune::run(config)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
