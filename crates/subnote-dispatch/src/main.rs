//! CLI entry point: one dispatch run, then exit.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use subnote_core::Settings;
use subnote_graph::GraphClient;

use subnote_dispatch::runner::run_once;

#[derive(Parser)]
#[command(name = "subnote-dispatch")]
#[command(about = "Queue notification emails for submissions that have not been announced yet")]
struct Cli {
    /// Config file prefix (default: subnote).
    #[arg(short, long, default_value = "subnote")]
    config: String,

    /// Build and log every insert without writing to the store.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let graph = GraphClient::connect(&settings)?;

    let report = run_once(&graph, &settings.email, cli.dry_run).await?;
    println!("{}", serde_json::to_string(&report)?);

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} recipients could not be notified",
            report.failed,
            report.recipients
        );
    }
    Ok(())
}
