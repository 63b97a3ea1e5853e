pub mod assemble;
pub mod chunker;
pub mod corpus;
pub mod dedup;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod tagging;

pub use assemble::{AcceptedChunk, CorpusAssembler};
pub use chunker::{Chunker, ChunkerConfig};
pub use dedup::{Admission, DeduplicationState, chunk_id};
pub use error::CorpusError;
pub use model::{ChunkRecord, PageIdentity, PageRegistry};
pub use normalize::{clean, normalize_for_hash};
pub use pipeline::{
    PipelineOptions, PipelineOutput, PipelineStats, generate_corpus_report, process_documents,
    run_pipeline,
};
pub use tagging::{KeywordTagger, Tagger};
