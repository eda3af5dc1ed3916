use crate::error::{ServerError, ServerResult};
use crate::middleware::RequestId;
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use lexsrt::{DocumentResult, PretaggedTokenizer, TaggedDocument, TaggedSentence};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /api/v1/resolve`.
///
/// Sentences arrive already tagged; their texts, in order, form the document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolveRequest {
    /// ISO 639-1 or 639-2 code of the document language.
    pub language: String,
    /// Name of the model that produced the tags.
    #[serde(default)]
    pub model: String,
    pub sentences: Vec<TaggedSentence>,
    /// Attach a lexeme report to the result.
    #[serde(default)]
    pub report: bool,
}

/// Resolve a tagged document.
///
/// Failures that leave partial results behind (an unreachable Wikidata, a
/// cancelled run) return them under `error.partial`.
pub async fn resolve_document(
    State(state): State<Arc<ServerState>>,
    request_id: Option<Extension<RequestId>>,
    Json(request): Json<ResolveRequest>,
) -> ServerResult<Json<DocumentResult>> {
    if request.report && state.fetcher.is_none() {
        return Err(ServerError::BadRequest(
            "lexeme reports are disabled on this server".to_string(),
        ));
    }

    let document = TaggedDocument {
        model: request.model,
        sentences: request.sentences,
    };
    let texts = document.sentence_texts();
    let tokenizer = Arc::new(PretaggedTokenizer::new(&document));
    let resolver = state.resolver(tokenizer, request.report);

    tracing::debug!(
        request_id = request_id.as_ref().map(|Extension(id)| id.0.as_str()).unwrap_or(""),
        language = %request.language,
        sentences = texts.len(),
        "resolving document"
    );

    let result = resolver
        .resolve_document(&texts, &request.language, &document.model)
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageResponse {
    pub code: String,
    /// Wikidata item of the language, `None` when no language has the code.
    pub item: Option<String>,
}

/// `GET /api/v1/languages/{code}`: the language item a code resolves to.
pub async fn resolve_language(
    State(state): State<Arc<ServerState>>,
    Path(code): Path<String>,
) -> ServerResult<Json<LanguageResponse>> {
    let language = state.matcher.languages().resolve(&code).await?;
    let item = (!language.is_not_found()).then(|| language.as_str().to_string());
    Ok(Json(LanguageResponse { code, item }))
}
