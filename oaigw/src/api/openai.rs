//! OpenAI互換APIハンドラー

use crate::api::error::AppError;
use crate::api::MAX_REQUEST_BODY_BYTES;
use crate::common::error::GatewayError;
use crate::common::protocol::{ChatRoutingFields, ModelList};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode, Uri},
    response::Response,
    Json,
};
use serde_json::{json, Value};

/// GET /v1/models - 登録済みモデル一覧（名前順）
pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList::from_names(state.registry.model_names()))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "models": state.registry.len(),
    }))
}

/// POST /v1/chat/completions - 選択したエンドポイントへ転送
///
/// ボディは `model` と `stream` だけを読み、転送には受け取ったバイト列を
/// そのまま使う。
pub async fn chat_completions(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let body = body.map_err(body_rejection)?;
    let fields = ChatRoutingFields::from_slice(&body)
        .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
    let model = fields.model.as_str();

    let candidates = state.registry.get(model);
    if candidates.is_empty() {
        return Err(GatewayError::ModelNotFound(model.to_string()).into());
    }

    let selected = state.balancer.select(model, candidates).ok_or_else(|| {
        tracing::error!(model, candidates = candidates.len(), "Balancer returned no endpoint");
        GatewayError::SelectionFailed(model.to_string())
    })?;

    let Some(target) = state.targets.get(&selected.name) else {
        tracing::error!(
            model,
            endpoint = %selected.name,
            "Selected endpoint has no forwarding target"
        );
        return Err(GatewayError::NoProxy(selected.name.clone()).into());
    };

    tracing::info!(
        model,
        endpoint = %selected.name,
        stream = fields.stream,
        "Routing chat completion"
    );

    let response = target
        .forward(
            state.targets.client(),
            uri.query(),
            &headers,
            body,
            state.targets.timeout(),
        )
        .await?;
    Ok(response)
}

/// ボディ読み込み失敗をOpenAI形式のエラーにする
fn body_rejection(rejection: BytesRejection) -> GatewayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(MAX_REQUEST_BODY_BYTES)
    } else {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}
