mod cors;
mod probe;
mod rate_limit;
mod server;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cors::CorsConfig;
use doc_assistant_core::{
    ingest_path, Assistant, CharacterNgramEmbedder, ChatModel, Embedder, GeminiChat,
    GeminiConfig, IngestionOptions, OllamaEmbedder, OpenAiEmbedder, QdrantStore, Retriever,
    RetrievalOptions, VectorIndex, VectorRetriever, DEFAULT_COLLECTION, DEFAULT_GEMINI_MODEL,
    DEFAULT_OLLAMA_MODEL, DEFAULT_QDRANT_URL, MINILM_DIMENSIONS,
};
use rate_limit::{RateLimitConfig, RateLimiter};
use server::AppState;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, env = "QDRANT_URL", default_value = DEFAULT_QDRANT_URL)]
    qdrant_url: String,

    /// Qdrant API key, for hosted clusters
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    qdrant_api_key: Option<String>,

    /// Qdrant collection holding the document chunks
    #[arg(long, env = "QDRANT_COLLECTION", default_value = DEFAULT_COLLECTION)]
    qdrant_collection: String,

    /// Embedding backend; ingestion and serving must use the same one.
    #[arg(long, env = "EMBEDDER", value_enum, default_value_t = EmbedderKind::Ollama)]
    embedder: EmbedderKind,

    /// Embedding model name
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_OLLAMA_MODEL)]
    embedding_model: String,

    /// Embedding API base URL (defaults per backend)
    #[arg(long, env = "EMBEDDING_URL")]
    embedding_url: Option<String>,

    /// Embedding vector size
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = MINILM_DIMENSIONS)]
    embedding_dimensions: usize,

    /// API key for the OpenAI-compatible embedder
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EmbedderKind {
    Ollama,
    Openai,
    /// Offline character-trigram hashing.
    Ngram,
}

#[derive(Args)]
struct LlmArgs {
    /// Google Generative Language API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: String,

    /// Gemini model
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// Seconds before a generation request is abandoned
    #[arg(long, default_value = "15")]
    llm_timeout_secs: u64,
}

#[derive(Args)]
struct RetrievalArgs {
    /// Passages handed to the model
    #[arg(long, default_value = "4")]
    k: usize,

    /// Candidates fetched before diversity re-ranking
    #[arg(long, default_value = "10")]
    fetch_k: usize,

    /// Relevance/diversity balance, 1.0 = relevance only
    #[arg(long, default_value = "0.5")]
    lambda: f32,
}

#[derive(Subcommand)]
enum Command {
    /// Load a PDF (or folder of PDFs), chunk it, embed the chunks and store them.
    Ingest {
        /// PDF file or folder containing PDFs.
        #[arg(long, default_value = "icic.pdf")]
        path: String,
        /// Drop and recreate the collection first.
        #[arg(long, default_value_t = false)]
        recreate: bool,
        /// Characters per chunk.
        #[arg(long, default_value = "1000")]
        chunk_size: usize,
        /// Characters shared between neighbouring chunks.
        #[arg(long, default_value = "200")]
        chunk_overlap: usize,
        /// Chunks per embedding request.
        #[arg(long, default_value = "32")]
        batch_size: usize,
    },
    /// Serve the chat API.
    Serve {
        /// Listen address
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
        /// Chat requests allowed per client per minute
        #[arg(long, env = "RATE_LIMIT_PER_MINUTE", default_value = "50")]
        rate_limit: usize,
        /// Allowed CORS origin; repeat to allow several (defaults to local dev servers)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
        #[command(flatten)]
        llm: LlmArgs,
        #[command(flatten)]
        retrieval: RetrievalArgs,
    },
    /// Answer a single question from the command line.
    Ask {
        /// Question to answer
        #[arg(long)]
        question: String,
        #[command(flatten)]
        llm: LlmArgs,
        #[command(flatten)]
        retrieval: RetrievalArgs,
    },
    /// Send a fixed set of questions to a running server and print the answers.
    Probe {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-assistant boot"
    );

    match &cli.command {
        Command::Ingest {
            path,
            recreate,
            chunk_size,
            chunk_overlap,
            batch_size,
        } => {
            let options = IngestionOptions {
                chunk_size: *chunk_size,
                chunk_overlap: *chunk_overlap,
            };
            run_ingest(&cli, Path::new(path), &options, *recreate, *batch_size).await?;
        }
        Command::Serve {
            bind,
            rate_limit,
            cors_origins,
            llm,
            retrieval,
        } => {
            let assistant = build_assistant(&cli, llm, retrieval).await?;
            let limiter = Arc::new(RateLimiter::new(RateLimitConfig::per_minute(*rate_limit)));
            let cors_config = if cors_origins.is_empty() {
                CorsConfig::default()
            } else {
                CorsConfig {
                    allowed_origins: cors_origins.clone(),
                }
            };

            let app = server::router(AppState { assistant }, limiter, cors_config);
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            info!(address = %bind, "listening; POST /chat");

            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        }
        Command::Ask {
            question,
            llm,
            retrieval,
        } => {
            let assistant = build_assistant(&cli, llm, retrieval).await?;
            let answer = assistant.answer(question).await;
            info!(kind = ?answer.kind, "answered");
            println!("{}", answer.text);
        }
        Command::Probe { url } => probe::run(url).await?,
    }

    Ok(())
}

fn build_embedder(cli: &Cli) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match cli.embedder {
        EmbedderKind::Ollama => Arc::new(OllamaEmbedder::new(
            &cli.embedding_model,
            cli.embedding_url.clone(),
            cli.embedding_dimensions,
        )?),
        EmbedderKind::Openai => {
            let api_key = cli
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY is required for the openai embedder")?;
            Arc::new(OpenAiEmbedder::new(
                api_key,
                &cli.embedding_model,
                cli.embedding_url.clone(),
                cli.embedding_dimensions,
            )?)
        }
        EmbedderKind::Ngram => Arc::new(CharacterNgramEmbedder {
            dimensions: cli.embedding_dimensions,
        }),
    };
    Ok(embedder)
}

fn build_store(cli: &Cli, vector_size: usize) -> anyhow::Result<QdrantStore> {
    Ok(
        QdrantStore::new(&cli.qdrant_url, &cli.qdrant_collection, vector_size)?
            .with_api_key(cli.qdrant_api_key.clone()),
    )
}

async fn run_ingest(
    cli: &Cli,
    path: &Path,
    options: &IngestionOptions,
    recreate: bool,
    batch_size: usize,
) -> anyhow::Result<()> {
    let report = ingest_path(path, options)?;

    if !report.skipped_files.is_empty() {
        warn!(
            "skipped_files={} for path={}",
            report.skipped_files.len(),
            path.display()
        );
        for skipped in &report.skipped_files {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
        }
    }

    println!("Loaded {} pages", report.pages);
    println!("Created {} chunks", report.chunks.len());

    let chunks = report.chunks;
    if chunks.is_empty() {
        anyhow::bail!("no chunks were produced from {}", path.display());
    }

    let embedder = build_embedder(cli)?;
    info!(
        model = embedder.model_name(),
        chunk_count = chunks.len(),
        "embedding chunks"
    );

    let mut embeddings = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        embeddings.extend(embedder.embed_batch(&texts).await?);
    }

    let store = build_store(cli, embedder.dimensions())?;
    println!("Qdrant endpoint: {}", store.endpoint());
    println!("Collection: {}", store.collection());

    store.ensure_collection(recreate).await?;
    store.index_vector_chunks(&chunks, &embeddings).await?;

    println!(
        "{} chunks indexed at {}",
        chunks.len(),
        Utc::now().to_rfc3339()
    );
    Ok(())
}

async fn build_assistant(
    cli: &Cli,
    llm: &LlmArgs,
    retrieval: &RetrievalArgs,
) -> anyhow::Result<Assistant> {
    let embedder = build_embedder(cli)?;
    let store = build_store(cli, embedder.dimensions())?;

    // An unreachable or missing index is not fatal: the service still answers
    // greetings and reports retrieval trouble for everything else.
    let retriever: Option<Arc<dyn Retriever>> = match store.collection_exists().await {
        Ok(true) => {
            let options = RetrievalOptions {
                k: retrieval.k,
                fetch_k: retrieval.fetch_k,
                lambda: retrieval.lambda,
            };
            Some(Arc::new(VectorRetriever::new(embedder, store, options)) as Arc<dyn Retriever>)
        }
        Ok(false) => {
            error!(
                collection = %cli.qdrant_collection,
                "qdrant collection does not exist; run `doc-assistant ingest` first"
            );
            None
        }
        Err(err) => {
            error!(error = %err, url = %cli.qdrant_url, "failed to connect to qdrant at startup");
            None
        }
    };

    let mut config = GeminiConfig::new(llm.google_api_key.clone());
    config.model = llm.gemini_model.clone();
    config.timeout = Duration::from_secs(llm.llm_timeout_secs);
    let chat: Arc<dyn ChatModel> = Arc::new(GeminiChat::new(config)?);

    Ok(Assistant::new(retriever, chat))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
