use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use doc_chat_core::{
    assemble, build_messages, digest_text, ChatClient, ChatMessage, DocumentStore,
    DocumentSummary, IngestionReport, Ingestor, PassageRanker, RankingOptions, SamplingOptions,
    ScoredPassage,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Everything the handlers share. The store carries its own interior lock;
/// the rest is immutable after startup.
pub struct ServerContext {
    pub store: DocumentStore,
    pub ingestor: Ingestor,
    pub ranker: PassageRanker,
    pub sampling: SamplingOptions,
    pub directories: Vec<PathBuf>,
    pub chat: Option<ChatClient>,
    pub preamble: String,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<ServerContext>,
}

impl AppState {
    pub fn new(context: ServerContext) -> Self {
        Self {
            inner: Arc::new(context),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources_used: Vec<String>,
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_passages: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/chat", post(chat))
        .route("/search", post(search))
        .route("/documents", get(list_documents))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("doc-chat listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "doc-chat"}))
}

async fn ingest(State(state): State<AppState>) -> Json<IngestionReport> {
    let (documents, report) = state
        .inner
        .ingestor
        .ingest_directories(&state.inner.directories)
        .await;
    info!(
        documents = report.documents.len(),
        skipped = report.skipped.len(),
        "ingestion complete"
    );
    state.inner.store.replace(documents);
    Json(report)
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorBody>)> {
    let documents = state.inner.store.snapshot();
    if documents.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Please process documents first",
        ));
    }
    let Some(chat) = &state.inner.chat else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "chat completion endpoint is not configured",
        ));
    };

    info!(documents = documents.len(), "processing chat request");

    let ranked = state.inner.ranker.rank(&request.message, &documents);
    let context = assemble(&ranked, &documents, &state.inner.sampling);
    info!(
        context_chars = context.text.chars().count(),
        sources = context.sources.len(),
        "assembled context"
    );

    let messages = build_messages(
        &state.inner.preamble,
        &context.text,
        &request.history,
        &request.message,
    );
    let mut response = match chat.complete(&messages).await {
        Ok(content) => content,
        Err(chat_error) => {
            error!(error = %chat_error, "chat completion failed");
            return Err(error_response(
                StatusCode::BAD_GATEWAY,
                "Could not process your request. Please try again.",
            ));
        }
    };

    if !context.sources.is_empty() && !response.contains("[Source:") {
        let listed = context
            .sources
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        response.push_str(&format!("\n\n[Based on content from: {listed}]"));
    }

    let mut conversation_history = request.history;
    conversation_history.push(ChatMessage::user(request.message.clone()));
    conversation_history.push(ChatMessage::assistant(response.clone()));

    Ok(Json(ChatResponse {
        response,
        sources_used: context.sources.iter().cloned().collect(),
        conversation_history,
    }))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<ScoredPassage>>, (StatusCode, Json<ErrorBody>)> {
    let documents = state.inner.store.snapshot();

    let ranked = match request.max_passages {
        Some(max_passages) => {
            let options = RankingOptions {
                max_passages,
                ..*state.inner.ranker.options()
            };
            let ranker = PassageRanker::new(options).map_err(|ranker_error| {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &ranker_error.to_string())
            })?;
            ranker.rank(&request.query, &documents)
        }
        None => state.inner.ranker.rank(&request.query, &documents),
    };

    Ok(Json(ranked))
}

async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentSummary>> {
    let documents = state.inner.store.snapshot();
    let summaries = documents
        .iter()
        .map(|document| DocumentSummary {
            filename: document.filename().to_string(),
            chars: document.content().chars().count(),
            digest: digest_text(document.content()),
        })
        .collect();
    Json(summaries)
}
