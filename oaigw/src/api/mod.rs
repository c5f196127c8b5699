//! REST APIハンドラー
//!
//! - `GET /v1/models`
//! - `POST /v1/chat/completions`
//! - `GET /health`

pub mod error;
pub mod openai;
pub mod proxy;

use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// 受け付けるリクエストボディの上限（画像入力を含むチャットを想定）
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// APIルーターを作成
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/models", get(openai::list_models))
        .route("/v1/chat/completions", post(openai::chat_completions))
        .route("/health", get(openai::health))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
