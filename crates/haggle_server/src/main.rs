//! Haggle API Server
//!
//! Price negotiation backend: bargaining sessions and voice call tracking

use std::path::PathBuf;

use clap::Parser;
use haggle_server::{ServerConfig, start_server};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "haggle_api=debug,haggle_server=debug,haggle_core=debug";

#[derive(Parser, Debug)]
#[command(name = "haggle-server", version, about = "Price negotiation API server")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config file
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .with_syntax_highlighting(miette::highlighters::SyntectHighlighter::default())
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();

    // RUST_LOG wins over the built-in filter when set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .pretty()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path).await.into_diagnostic()?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    start_server(config).await.into_diagnostic()?;

    Ok(())
}
