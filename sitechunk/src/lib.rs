// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{
    CrawlSettings, IngestSettings, RunSettings, default_allowed_domains, extract_url_path,
    load_known_corpus, parse_url_line, resolve_output_dir, run_crawl, run_ingest,
};

pub use sitechunk_core::pipeline::{PipelineOptions, PipelineOutput, generate_corpus_report};
