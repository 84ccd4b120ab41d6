//! search-dl command line runner.
//!
//! Owns process concerns the library leaves out: argument parsing, log
//! output, and wiring the HTTP adapters into the controller.

mod cli;

use clap::Parser;
use cli::Args;
use search_dl::{
    DownloadManager, HttpSearchClient, HttpTransfer, Result, SearchController, Services,
    TerminalPrompt,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    ExitCode::from(cli::exit_status(run(args).await))
}

fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let local = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("warn,search_dl={local}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<u8> {
    let config = args.load_config()?;
    let queries = args.query_queue()?;
    let base_url = config.server.url()?;

    tracing::debug!(
        queries = queries.len(),
        server = %base_url,
        interactive = config.search.interactive,
        mode = %config.search.mode,
        quality = config.search.quality,
        "starting"
    );

    let downloads = DownloadManager::new(
        Arc::new(HttpTransfer::new(base_url.clone())?),
        config.download.destination.clone(),
        config.download.max_concurrent,
    );
    let services = Services {
        search: Arc::new(HttpSearchClient::new(base_url)?),
        downloads: Arc::new(downloads.clone()),
        prompt: Arc::new(TerminalPrompt::default()),
    };

    let mut controller = SearchController::new(config.search.clone(), Box::new(queries), services);
    let outcome = controller.run().await?;

    Ok(cli::finish(outcome, &downloads, &mut std::io::stdout()).await)
}
