use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use sitechunk_core::chunker::ChunkerConfig;
use sitechunk_core::corpus::{CORPUS_FILE_NAME, read_corpus, write_corpus};
use sitechunk_core::pipeline::{self, PipelineOptions, PipelineOutput};
use sitechunk_core::{DeduplicationState, KeywordTagger};
use sitechunk_scanner::{Crawler, HttpFetcher, LocalSource, Source, WebSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

pub use sitechunk_core::pipeline::generate_corpus_report;

/// Saved page copies live here, under the output directory.
pub const PAGES_DIR: &str = "pages";

/// Settings shared by every command that produces a corpus
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub chunker: ChunkerConfig,
    pub max_tags: usize,
    pub known_corpus: Option<PathBuf>,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub seed: Url,
    pub max_pages: Option<usize>,
    pub allowed_domains: Vec<String>,
    pub workers: usize,
    pub timeout: Duration,
    pub save_pages: bool,
    pub run: RunSettings,
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub run: RunSettings,
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(line)
        && url.host_str().is_some()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("https://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some_and(|h| h.contains('.') || h == "localhost")
    {
        return Some(with_scheme);
    }

    None
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// The seed's host, minus a leading `www.` so sibling subdomains stay in scope.
pub fn default_allowed_domains(seed: &Url) -> Vec<String> {
    seed.host_str()
        .map(|host| {
            let host = host.to_ascii_lowercase();
            vec![host.strip_prefix("www.").unwrap_or(&host).to_string()]
        })
        .unwrap_or_default()
}

pub fn resolve_output_dir(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn run_settings(args: &ArgMatches, quiet: bool) -> anyhow::Result<RunSettings> {
    let output = args
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("./sitechunk-output");
    let chunk_size = args.get_one::<usize>("chunk-size").copied().unwrap_or(500);
    let chunk_overlap = args.get_one::<usize>("chunk-overlap").copied().unwrap_or(50);

    Ok(RunSettings {
        output_dir: resolve_output_dir(output),
        chunker: ChunkerConfig::new(chunk_size, chunk_overlap)?,
        max_tags: args.get_one::<usize>("max-tags").copied().unwrap_or(5),
        known_corpus: args
            .get_one::<PathBuf>("known-corpus")
            .map(|p| resolve_output_dir(&p.to_string_lossy())),
        quiet,
    })
}

impl CrawlSettings {
    pub fn from_matches(args: &ArgMatches, quiet: bool) -> anyhow::Result<Self> {
        let raw = args
            .get_one::<String>("url")
            .ok_or_else(|| anyhow!("--url is required"))?;
        let seed = parse_url_line(raw).ok_or_else(|| anyhow!("Invalid seed URL '{}'", raw))?;
        let seed = Crawler::parse_seed(&seed)?;

        let allowed_domains = match args.get_many::<String>("domain") {
            Some(domains) => domains.cloned().collect(),
            None => default_allowed_domains(&seed),
        };

        Ok(Self {
            seed,
            max_pages: args.get_one::<u64>("max-pages").map(|m| *m as usize),
            allowed_domains,
            workers: args.get_one::<u64>("threads").map(|t| *t as usize).unwrap_or(4),
            timeout: Duration::from_secs(args.get_one::<u64>("timeout").copied().unwrap_or(10)),
            save_pages: !args.get_flag("no-save-pages"),
            run: run_settings(args, quiet)?,
        })
    }
}

impl IngestSettings {
    pub fn from_matches(args: &ArgMatches, quiet: bool) -> anyhow::Result<Self> {
        let root = args
            .get_one::<PathBuf>("path")
            .ok_or_else(|| anyhow!("--path is required"))?;

        Ok(Self {
            root: resolve_output_dir(&root.to_string_lossy()),
            extensions: args
                .get_many::<String>("ext")
                .map(|exts| exts.cloned().collect())
                .unwrap_or_default(),
            run: run_settings(args, quiet)?,
        })
    }
}

pub async fn load_known_corpus(path: Option<&Path>) -> anyhow::Result<DeduplicationState> {
    let Some(path) = path else {
        return Ok(DeduplicationState::new());
    };

    let records = read_corpus(path)
        .await
        .with_context(|| format!("Failed to read known corpus {}", path.display()))?;
    info!("Seeded {} known chunks from {}", records.len(), path.display());
    Ok(DeduplicationState::from_records(&records))
}

/// Run the pipeline over `source` and write `corpus.json` into the output directory.
async fn execute(
    source: &dyn Source,
    run: &RunSettings,
    spinner: Option<indicatif::ProgressBar>,
    cancel: &CancellationToken,
) -> anyhow::Result<PipelineOutput> {
    let dedup = load_known_corpus(run.known_corpus.as_deref()).await?;

    let mut options = PipelineOptions::default()
        .with_chunker(run.chunker)
        .with_max_tags(run.max_tags);
    if let Some(pb) = spinner {
        options = options.with_progress(pb);
    }

    let tagger = KeywordTagger::new();
    let output = pipeline::run_pipeline(source, &tagger, dedup, &options, cancel).await?;

    let corpus_path = run.output_dir.join(CORPUS_FILE_NAME);
    write_corpus(&corpus_path, &output.records)
        .await
        .with_context(|| format!("Failed to write {}", corpus_path.display()))?;

    Ok(output)
}

pub async fn run_crawl(
    settings: &CrawlSettings,
    cancel: &CancellationToken,
) -> anyhow::Result<PipelineOutput> {
    let spinner = (!settings.run.quiet).then(|| pipeline::spinner("Starting crawl..."));

    let fetcher = HttpFetcher::with_timeout(settings.timeout)?;
    let mut crawler = Crawler::with_fetcher(Arc::new(fetcher))
        .with_workers(settings.workers)
        .with_fetch_timeout(settings.timeout)
        .with_allowed_domains(settings.allowed_domains.iter().cloned());

    if let Some(max_pages) = settings.max_pages {
        crawler = crawler.with_max_pages(max_pages);
    }
    if settings.save_pages {
        crawler = crawler.with_save_dir(settings.run.output_dir.join(PAGES_DIR));
    }
    if let Some(ref pb) = spinner {
        let pb = pb.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |fetched: usize, url: String| {
            pb.set_message(format!(
                "Crawling... {} pages fetched, next {}",
                fetched,
                extract_url_path(&url)
            ));
        }));
    }

    let source = WebSource::new(crawler, settings.seed.as_str());
    execute(&source, &settings.run, spinner, cancel).await
}

pub async fn run_ingest(
    settings: &IngestSettings,
    cancel: &CancellationToken,
) -> anyhow::Result<PipelineOutput> {
    let spinner = (!settings.run.quiet).then(|| pipeline::spinner("Walking documents..."));
    let source = LocalSource::new(&settings.root).with_extensions(settings.extensions.iter().cloned());
    execute(&source, &settings.run, spinner, cancel).await
}

fn print_summary(output: &PipelineOutput, run: &RunSettings) {
    if run.quiet {
        return;
    }

    println!();
    print!("{}", generate_corpus_report(&output.stats, &output.records));

    if !output.failures.is_empty() {
        println!("{} {} locations failed:", "⚠".yellow().bold(), output.failures.len());
        for failure in &output.failures {
            println!("  {} {}", "•".yellow(), failure);
        }
        println!();
    }

    if output.stats.cancelled {
        println!(
            "{} Interrupted, corpus contains partial results",
            "⚠".yellow().bold()
        );
    }
    println!(
        "{} Wrote {} chunks to {}",
        "✓".green().bold(),
        output.records.len(),
        run.output_dir
            .join(CORPUS_FILE_NAME)
            .display()
            .to_string()
            .bright_white()
    );
}

pub async fn handle_crawl(
    args: &ArgMatches,
    quiet: bool,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let settings = CrawlSettings::from_matches(args, quiet)?;

    if !quiet {
        println!(
            "\n{} Crawling {}",
            "→".blue().bold(),
            settings.seed.as_str().bright_white()
        );
        println!("Workers: {}", settings.workers);
        match settings.max_pages {
            Some(max) => println!("Max pages: {}", max),
            None => println!("Max pages: unbounded"),
        }
        println!("Domains: {}\n", settings.allowed_domains.join(", "));
    }

    let output = run_crawl(&settings, &cancel).await?;
    print_summary(&output, &settings.run);
    Ok(())
}

pub async fn handle_ingest(
    args: &ArgMatches,
    quiet: bool,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let settings = IngestSettings::from_matches(args, quiet)?;

    if !quiet {
        println!(
            "\n{} Ingesting {}\n",
            "→".blue().bold(),
            settings.root.display().to_string().bright_white()
        );
    }

    let output = run_ingest(&settings, &cancel).await?;
    print_summary(&output, &settings.run);
    Ok(())
}

/// Install the global fmt subscriber. Logs go to stderr so stdout stays readable.
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
