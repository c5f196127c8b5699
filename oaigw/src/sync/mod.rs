//! モデルディスカバリーモジュール
//!
//! 起動時に各エンドポイントの `GET /v1/models` を1回だけ呼び出し、
//! 公開しているモデルID一覧を取得する。失敗は致命的にせず、
//! 警告ログを出して空の一覧として扱う。

pub mod parser;

pub use parser::{parse_models_response, ResponseFormat};

use crate::types::EndpointDescriptor;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// ディスカバリーエラー
///
/// 呼び出し側には返さず、ログ出力にのみ使う。
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// HTTP接続エラー
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// タイムアウト
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// HTTPエラーレスポンス
    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),
    /// パースエラー
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// エンドポイントのモデル一覧を取得する
///
/// 実装はエラーを返さない。どんな失敗も空の一覧になる。
#[async_trait]
pub trait ModelDiscovery: Send + Sync {
    /// `endpoint` が提供するモデルIDを `timeout` 以内に取得
    async fn list_models(&self, endpoint: &EndpointDescriptor, timeout: Duration) -> Vec<String>;
}

/// HTTP経由のディスカバリー
#[derive(Debug, Clone)]
pub struct HttpModelDiscovery {
    client: Client,
}

impl HttpModelDiscovery {
    /// 共有クライアントからディスカバリーを作成
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// `GET {base}/v1/models` を呼び出してモデルIDを返す
    pub async fn fetch_models(
        &self,
        endpoint: &EndpointDescriptor,
        timeout: Duration,
    ) -> Result<(Vec<String>, ResponseFormat), SyncError> {
        let url = format!("{}/v1/models", endpoint.trimmed_base_url());

        let mut request = self.client.get(&url);
        if endpoint.has_api_key() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", endpoint.api_key),
            );
        }

        let response = request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::Timeout(timeout)
            } else {
                SyncError::ConnectionError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SyncError::HttpError(status, body));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::Timeout(timeout)
            } else {
                SyncError::ParseError(e.to_string())
            }
        })?;

        Ok(parse_models_response(&json))
    }
}

#[async_trait]
impl ModelDiscovery for HttpModelDiscovery {
    async fn list_models(&self, endpoint: &EndpointDescriptor, timeout: Duration) -> Vec<String> {
        match self.fetch_models(endpoint, timeout).await {
            Ok((models, format)) => {
                if format == ResponseFormat::Unknown {
                    tracing::warn!(
                        endpoint = %endpoint.name,
                        "Unrecognized /v1/models response format"
                    );
                }
                tracing::debug!(
                    endpoint = %endpoint.name,
                    count = models.len(),
                    ?format,
                    "Discovered models"
                );
                models
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %endpoint.name,
                    base_url = %endpoint.base_url,
                    error = %e,
                    "Model discovery failed"
                );
                Vec::new()
            }
        }
    }
}

/// 固定のモデル一覧を返すディスカバリー
///
/// オフライン起動やテストで使う。未登録のエンドポイントは空の一覧。
#[derive(Debug, Clone, Default)]
pub struct StaticModelDiscovery {
    models: HashMap<String, Vec<String>>,
}

impl StaticModelDiscovery {
    /// 空のディスカバリーを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// エンドポイント名に対するモデル一覧を設定
    pub fn with_models<I, S>(mut self, endpoint: impl Into<String>, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models.insert(
            endpoint.into(),
            models.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl ModelDiscovery for StaticModelDiscovery {
    async fn list_models(&self, endpoint: &EndpointDescriptor, _timeout: Duration) -> Vec<String> {
        self.models.get(&endpoint.name).cloned().unwrap_or_default()
    }
}
