use colored::Colorize;
use commands::command_argument_builder;
use sitechunk::handlers::{handle_crawl, handle_ingest, init_logging};
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod commands;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let quiet = matches.get_flag("quiet");
    let verbose = matches.get_flag("verbose");

    init_logging(verbose, quiet);

    // First ctrl-C stops the run and keeps what was gathered so far
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing with partial results");
            interrupt.cancel();
        }
    });

    let result = match matches.subcommand() {
        Some(("crawl", sub_matches)) => handle_crawl(sub_matches, quiet, cancel).await,
        Some(("ingest", sub_matches)) => handle_ingest(sub_matches, quiet, cancel).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
