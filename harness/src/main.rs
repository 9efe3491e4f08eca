mod schema;
mod settings;
mod web;

use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "authz-harness",
    version,
    about = "Demo GraphQL endpoint guarded by graphql-authz"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "harness.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // schema metadata + policies
    let state = web::AppState::new()?;

    // start web server
    web::serve(settings, state).await
}
