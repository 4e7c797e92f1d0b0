pub mod answer;
pub mod chunking;
pub mod classifier;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod llm;
pub mod mmr;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod store;
pub mod stores;
pub mod traits;

pub use answer::{
    Answer, AnswerKind, Assistant, GREETING_RESPONSE, NOISE_RESPONSE, NOT_FOUND_RESPONSE,
    RATE_LIMIT_RESPONSE, RETRIEVAL_ERROR_RESPONSE, SCOPE_RESPONSE,
};
pub use chunking::{build_chunks, normalize_whitespace, split_text, ChunkingConfig};
pub use classifier::{classify, is_greeting, is_noise, QueryKind};
pub use embeddings::{
    CharacterNgramEmbedder, Embedder, OllamaEmbedder, OpenAiEmbedder,
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_OLLAMA_MODEL, MINILM_DIMENSIONS,
};
pub use error::{EmbeddingError, IngestError, LlmError, SearchError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{discover_pdf_files, ingest_path, ingest_path_with, IngestionReport, SkippedPdf};
pub use llm::{GeminiChat, GeminiConfig, DEFAULT_GEMINI_MODEL};
pub use mmr::{mmr_rerank, MmrCandidate};
pub use models::{DocumentFingerprint, IngestionOptions, Passage, PdfChunk, RetrievalOptions};
pub use retrieval::VectorRetriever;
pub use store::StoreHit;
pub use stores::{QdrantStore, DEFAULT_COLLECTION, DEFAULT_QDRANT_URL};
pub use traits::{ChatModel, Retriever, VectorIndex};
