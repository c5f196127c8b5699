//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング。レスポンスはOpenAI互換の
//! `{"error": {"message", "type", "code"}}` 形式。

use crate::common::error::GatewayError;
use axum::{response::IntoResponse, Json};

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub GatewayError);

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // 詳細（バックエンドのアドレス等）はログにだけ出す
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        (status, Json(self.0.to_openai_error())).into_response()
    }
}
