use crate::CLAP_STYLING;
use clap::{arg, command};

fn chunking_args() -> [clap::Arg; 4] {
    [
        arg!(--"chunk-size" <CHARS>)
            .required(false)
            .help("Target chunk length in characters")
            .value_parser(clap::value_parser!(usize))
            .default_value("500"),
        arg!(--"chunk-overlap" <CHARS>)
            .required(false)
            .help("Characters repeated between neighbouring chunks")
            .value_parser(clap::value_parser!(usize))
            .default_value("50"),
        arg!(--"max-tags" <NUM>)
            .required(false)
            .help("Maximum keyword tags attached to each chunk")
            .value_parser(clap::value_parser!(usize))
            .default_value("5"),
        arg!(--"known-corpus" <PATH>)
            .required(false)
            .help("Existing corpus.json whose chunks are treated as already emitted")
            .value_parser(clap::value_parser!(std::path::PathBuf)),
    ]
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <DIR>)
        .required(false)
        .help("Directory for corpus.json (and saved pages)")
        .default_value("./sitechunk-output")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitechunk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitechunk")
        .styles(CLAP_STYLING)
        .about("Crawl a site or a document tree into a deduplicated chunk corpus")
        .arg(
            arg!(-q --"quiet" "Suppress progress, report and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log per-link and per-chunk decisions")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about("Crawl a website breadth-first and chunk every page it reaches")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Seed URL to start crawling from"),
                )
                .arg(
                    arg!(-m --"max-pages" <MAX_PAGES>)
                        .required(false)
                        .help("Stop after fetching this many pages (default: unbounded)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(false)
                        .help("Allowed domain suffix; repeatable (default: the seed's host)")
                        .action(clap::ArgAction::Append),
                )
                .arg(output_arg())
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of concurrent fetches")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("4"),
                )
                .arg(
                    arg!(--"timeout" <SECS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"no-save-pages")
                        .required(false)
                        .help("Do not keep a copy of each fetched page under <DIR>/pages")
                        .action(clap::ArgAction::SetTrue),
                )
                .args(chunking_args()),
        )
        .subcommand(
            command!("ingest")
                .about("Chunk every supported document under a local directory")
                .arg(
                    arg!(-p --"path" <DIR>)
                        .required(true)
                        .help("Root directory to walk")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-e --"ext" <EXT>)
                        .required(false)
                        .help("File extension to include; repeatable (default: html, htm, pdf, txt, md)")
                        .action(clap::ArgAction::Append),
                )
                .arg(output_arg())
                .args(chunking_args()),
        )
}
