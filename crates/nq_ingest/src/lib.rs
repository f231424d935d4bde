pub mod extractor;
pub mod fetcher;
pub mod pipeline;

pub use extractor::{Extraction, LlmExtractor, SemanticExtractor};
pub use fetcher::{ContentFetcher, FetchedPage, HttpFetcher};
pub use pipeline::{ingest_all, IngestFailure, IngestPipeline, IngestReport, DEFAULT_CONCURRENCY};

pub mod prelude {
    pub use super::{ingest_all, ContentFetcher, IngestPipeline, SemanticExtractor};
    pub use nq_core::{Article, Error, Ingestor, Result};
}
