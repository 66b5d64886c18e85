//! Axum HTTP front end: a single `POST /ask` route over the same
//! `answer()` entry point the CLI uses, so the two callers never diverge.

use crate::orchestrate::answer;
use crate::wiring::Wiring;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use nlq_core::types::{AnswerError, AnswerOptions, Question};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
struct AppState {
    wiring: Wiring,
}

pub fn build_router(wiring: Wiring) -> Router {
    Router::new()
        .route("/ask", post(ask_handler))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(AppState { wiring })
}

#[derive(serde::Deserialize)]
struct AskRequest {
    question: String,
    database: String,
    #[serde(default)]
    trace: bool,
}

async fn ask_handler(State(state): State<AppState>, Json(body): Json<AskRequest>) -> Response {
    let question = Question {
        text: body.question,
        database_id: body.database,
    };
    let options = AnswerOptions { include_trace: body.trace };

    match answer(&state.wiring, question, options).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => {
            let status = status_for(err.kind());
            let body = AnswerError {
                kind: err.kind(),
                message: err.message,
                partial_trace: None,
            };
            (status, Json(body)).into_response()
        }
    }
}

fn status_for(kind: nlq_core::error::ErrorKind) -> StatusCode {
    use nlq_core::error::ErrorKind;
    match kind {
        ErrorKind::ValidationBlocked | ErrorKind::NoCandidates | ErrorKind::ExplainAllFailed | ErrorKind::RepairExhausted => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::ExecutionTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::CatalogUnavailable
        | ErrorKind::EmbeddingUnavailable
        | ErrorKind::RetrievalFailed
        | ErrorKind::GeneratorUnavailable
        | ErrorKind::InfrastructureError => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ExecutionFailed => StatusCode::BAD_GATEWAY,
    }
}
