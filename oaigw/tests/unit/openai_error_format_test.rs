//! エラーレスポンスのOpenAI互換形式

use axum::body::to_bytes;
use axum::response::IntoResponse;
use oaigw::api::error::AppError;
use oaigw::common::error::GatewayError;
use serde_json::Value;

async fn body_of(err: GatewayError) -> (u16, Value) {
    let response = AppError(err).into_response();
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn every_error_has_message_type_and_code() {
    let errors = vec![
        GatewayError::InvalidRequest("expected value".into()),
        GatewayError::ModelNotFound("m".into()),
        GatewayError::NoProxy("p".into()),
        GatewayError::SelectionFailed("m".into()),
        GatewayError::Http("refused".into()),
        GatewayError::Timeout("elapsed".into()),
        GatewayError::PayloadTooLarge(1024),
    ];
    let expected_status = [400, 404, 500, 500, 502, 504, 413];

    for (err, status) in errors.into_iter().zip(expected_status) {
        let (actual, body) = body_of(err).await;
        assert_eq!(actual, status);
        let error = &body["error"];
        assert!(error["message"].is_string());
        assert!(error["type"].is_string());
        assert_eq!(error["code"], status.to_string());
    }
}
