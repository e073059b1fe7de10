use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::compose::{ComposeError, Composer, CorpusSnapshot, Form};
use crate::oracle::PronunciationOracle;
use crate::poem::Poem;

const DEFAULT_METERED_LINES: usize = 4;

#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<dyn PronunciationOracle + Send + Sync>,
    /// Filtered once at startup; used when a request does not bring its own corpus.
    pub snapshot: Arc<CorpusSnapshot>,
    pub max_corpus_lines: usize,
}

impl AppState {
    pub fn new<S: AsRef<str>>(
        oracle: Arc<dyn PronunciationOracle + Send + Sync>,
        corpus: &[S],
        max_corpus_lines: usize,
    ) -> Self {
        let snapshot = Arc::new(CorpusSnapshot::new(&*oracle, corpus));
        Self {
            oracle,
            snapshot,
            max_corpus_lines,
        }
    }

    fn composer(&self) -> Composer<'_, dyn PronunciationOracle + Send + Sync> {
        Composer::with_snapshot(&*self.oracle, &self.snapshot)
    }
}

#[derive(Deserialize)]
pub struct AcrosticQuery {
    pub key: Option<String>,
}

#[derive(Deserialize)]
pub struct RhymeQuery {
    pub scheme: Option<String>,
}

#[derive(Deserialize)]
pub struct SyllablesQuery {
    pub pattern: Option<String>,
}

#[derive(Deserialize)]
pub struct MeteredQuery {
    pub lines: Option<usize>,
}

/// Body of `POST /v1/compose`.
#[derive(Deserialize)]
pub struct ComposeRequest {
    pub form: String,
    pub corpus: Option<Vec<String>>,
    pub scheme: Option<String>,
    pub pattern: Option<String>,
    pub key: Option<String>,
    pub lines: Option<usize>,
}

#[derive(Serialize)]
pub struct PoemResponse {
    title: Option<String>,
    stanzas: Vec<Vec<String>>,
    text: String,
}

impl From<Poem> for PoemResponse {
    fn from(poem: Poem) -> Self {
        let text = poem.to_string();
        Self {
            title: poem.title,
            stanzas: poem.stanzas,
            text,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct InsufficientResponse {
    error: &'static str,
    reason: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/stats", get(stats))
        .route("/v1/couplets", get(couplets))
        .route("/v1/haiku", get(haiku))
        .route("/v1/villanelle", get(villanelle))
        .route("/v1/acrostic", get(acrostic))
        .route("/v1/rhyme", get(rhyme))
        .route("/v1/syllables", get(syllables))
        .route("/v1/metered", get(metered))
        .route("/v1/compose", post(compose))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn stats(State(state): State<AppState>) -> Response {
    Json(state.composer().stats()).into_response()
}

async fn couplets(State(state): State<AppState>) -> Result<Response, ApiError> {
    render(&state.composer(), &Form::Couplets)
}

async fn haiku(State(state): State<AppState>) -> Result<Response, ApiError> {
    render(&state.composer(), &Form::Haiku)
}

async fn villanelle(State(state): State<AppState>) -> Result<Response, ApiError> {
    render(&state.composer(), &Form::Villanelle)
}

async fn acrostic(
    State(state): State<AppState>,
    params: Result<Query<AcrosticQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let key = required(params.key, "key")?;
    render(&state.composer(), &Form::Acrostic { key })
}

async fn rhyme(
    State(state): State<AppState>,
    params: Result<Query<RhymeQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let scheme = required(params.scheme, "scheme")?;
    render(&state.composer(), &Form::Rhyme { scheme })
}

async fn syllables(
    State(state): State<AppState>,
    params: Result<Query<SyllablesQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let pattern = required(params.pattern, "pattern")?;
    render(&state.composer(), &Form::Syllables { pattern })
}

async fn metered(
    State(state): State<AppState>,
    params: Result<Query<MeteredQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let lines = params.lines.unwrap_or(DEFAULT_METERED_LINES);
    render(&state.composer(), &Form::Metered { lines })
}

async fn compose(
    State(state): State<AppState>,
    request: Result<Json<ComposeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request?;
    let form = parse_form(&request)?;
    match &request.corpus {
        Some(corpus) => {
            if corpus.len() > state.max_corpus_lines {
                return Err(ApiError::bad_request(format!(
                    "corpus must have at most {} lines",
                    state.max_corpus_lines
                )));
            }
            render(&Composer::new(&*state.oracle, corpus.as_slice()), &form)
        }
        None => render(&state.composer(), &form),
    }
}

fn parse_form(request: &ComposeRequest) -> Result<Form, ApiError> {
    let form = match request.form.trim().to_ascii_lowercase().as_str() {
        "couplets" => Form::Couplets,
        "haiku" => Form::Haiku,
        "villanelle" => Form::Villanelle,
        "acrostic" => Form::Acrostic {
            key: required(request.key.clone(), "key")?,
        },
        "rhyme" => Form::Rhyme {
            scheme: required(request.scheme.clone(), "scheme")?,
        },
        "syllables" => Form::Syllables {
            pattern: required(request.pattern.clone(), "pattern")?,
        },
        "metered" => Form::Metered {
            lines: request.lines.unwrap_or(DEFAULT_METERED_LINES),
        },
        other => return Err(ApiError::bad_request(format!("unknown form {other:?}"))),
    };
    Ok(form)
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))
}

/// Build one poem on the calling thread; the RNG never crosses an await.
fn render<O>(composer: &Composer<'_, O>, form: &Form) -> Result<Response, ApiError>
where
    O: PronunciationOracle + ?Sized,
{
    let poem = composer.compose(form, &mut rand::rng())?;
    debug!("rendered {} ({} stanzas)", form.name(), poem.stanzas.len());
    Ok((
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(PoemResponse::from(poem)),
    )
        .into_response())
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("corpus too small, try again: {0}")]
    InsufficientCorpus(String),
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::InsufficientCorpus(e) => ApiError::InsufficientCorpus(e.reason),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::InsufficientCorpus(reason) => {
                let body = Json(InsufficientResponse {
                    error: "corpus too small, try again",
                    reason,
                });
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
        }
    }
}
