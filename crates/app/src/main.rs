mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_chat_core::{
    assemble, build_messages, AudioTranscriber, ChatClient, ChatConfig, DocumentStore,
    ExtractorSet, GenerationOptions, IngestionReport, Ingestor, PassageRanker, RankingOptions,
    SamplingOptions, TranscriberConfig, DEFAULT_SYSTEM_PREAMBLE,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use server::{run_server, AppState, ServerContext};

#[derive(Parser)]
#[command(name = "doc-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory scanned for documents. Repeat for multiple directories.
    #[arg(long = "dir", default_value = "documents")]
    directories: Vec<PathBuf>,

    /// OpenAI-compatible API base URL.
    #[arg(
        long,
        env = "OPENAI_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    openai_base_url: String,

    /// API key for the chat completion endpoint.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "")]
    openai_api_key: String,

    /// Chat completion model.
    #[arg(long, default_value = "gpt-3.5-turbo")]
    model: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address.
        #[arg(long, default_value = "127.0.0.1:5001")]
        addr: String,
    },
    /// Ingest the configured directories and answer one question.
    Ask {
        /// Question to answer from the documents.
        question: String,
        /// Print the assembled context instead of calling the model.
        #[arg(long, default_value_t = false)]
        context_only: bool,
    },
    /// Extraction dry run: ingest and report without serving or answering.
    Ingest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-chat boot"
    );

    let transcriber = match TranscriberConfig::from_env() {
        Some(config) => Some(
            AudioTranscriber::new(config).map_err(|error| anyhow::anyhow!(error.to_string()))?,
        ),
        None => None,
    };
    let ingestor = Ingestor::new(ExtractorSet::with_defaults(transcriber));
    let ranker = PassageRanker::new(RankingOptions::default())
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let sampling = SamplingOptions::default();

    let chat_client = if cli.openai_api_key.trim().is_empty() {
        warn!("OPENAI_API_KEY not set, chat completion disabled");
        None
    } else {
        let generation = GenerationOptions {
            model: cli.model.clone(),
            ..GenerationOptions::default()
        };
        let config = ChatConfig {
            base_url: cli.openai_base_url.clone(),
            api_key: cli.openai_api_key.clone(),
            generation,
        };
        Some(ChatClient::new(config).map_err(|error| anyhow::anyhow!(error.to_string()))?)
    };

    match cli.command {
        Command::Serve { addr } => {
            let addr: SocketAddr = addr
                .parse()
                .with_context(|| "invalid listen address for doc-chat")?;
            let state = AppState::new(ServerContext {
                store: DocumentStore::new(),
                ingestor,
                ranker,
                sampling,
                directories: cli.directories.clone(),
                chat: chat_client,
                preamble: DEFAULT_SYSTEM_PREAMBLE.to_string(),
            });
            run_server(addr, state).await?;
        }
        Command::Ask {
            question,
            context_only,
        } => {
            let (documents, report) = ingestor.ingest_directories(&cli.directories).await;
            report_skips(&report);

            if documents.is_empty() {
                println!("no documents ingested, nothing to answer from");
                return Ok(());
            }
            info!(documents = documents.len(), "collection ready");

            let ranked = ranker.rank(&question, &documents);
            let context = assemble(&ranked, &documents, &sampling);

            if context_only {
                println!("{}", context.text);
                return Ok(());
            }

            let Some(chat_client) = chat_client else {
                anyhow::bail!("OPENAI_API_KEY is required to generate an answer");
            };
            let messages = build_messages(DEFAULT_SYSTEM_PREAMBLE, &context.text, &[], &question);
            let answer = chat_client
                .complete(&messages)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("{answer}");
            if !context.sources.is_empty() {
                let listed = context
                    .sources
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("\nsources: {listed}");
            }
        }
        Command::Ingest => {
            let (documents, report) = ingestor.ingest_directories(&cli.directories).await;
            report_skips(&report);

            for summary in &report.documents {
                println!(
                    "{} ({} chars, sha256 {})",
                    summary.filename,
                    summary.chars,
                    &summary.digest[..12]
                );
            }
            println!(
                "{} documents ingested at {}",
                documents.len(),
                report.ingested_at.to_rfc3339()
            );
        }
    }

    Ok(())
}

fn report_skips(report: &IngestionReport) {
    for skipped in &report.skipped {
        warn!(path = %skipped.path, reason = %skipped.reason, "skipped file");
    }
}
