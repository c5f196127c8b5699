//! バックエンドへの転送
//!
//! エンドポイントごとの転送先（`ForwardingTarget`）を起動時に構築し、
//! リクエストボディをそのまま `{base}/v1/chat/completions` に送って
//! レスポンス（ストリーミング含む）を中継する。

use crate::common::error::{CommonError, CommonResult, GatewayError, GatewayResult};
use crate::types::EndpointDescriptor;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use futures::TryStreamExt;
use reqwest::{Client, Url};
use std::{collections::HashMap, io, sync::Arc, time::Duration};

/// 転送先のパス
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// 中継しないホップバイホップヘッダー
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// 1エンドポイントへの転送先
#[derive(Debug, Clone)]
pub struct ForwardingTarget {
    endpoint: Arc<EndpointDescriptor>,
    chat_url: Url,
}

impl ForwardingTarget {
    /// エンドポイントのベースURLから転送先を作る
    ///
    /// `http` / `https` 以外やパースできないURLはエラー。
    pub fn new(endpoint: Arc<EndpointDescriptor>) -> CommonResult<Self> {
        let raw = format!("{}{}", endpoint.trimmed_base_url(), CHAT_COMPLETIONS_PATH);
        let chat_url = Url::parse(&raw).map_err(|e| {
            CommonError::Config(format!(
                "invalid base_url for endpoint '{}': {}",
                endpoint.name, e
            ))
        })?;
        if !matches!(chat_url.scheme(), "http" | "https") {
            return Err(CommonError::Config(format!(
                "unsupported scheme '{}' for endpoint '{}'",
                chat_url.scheme(),
                endpoint.name
            )));
        }
        Ok(Self { endpoint, chat_url })
    }

    /// 転送先URL（クエリなし）
    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    /// 送信するヘッダーを組み立てる
    ///
    /// ホップバイホップ・`host`・`content-length`・`authorization` を除いてコピーし、
    /// APIキーがあれば `Authorization: Bearer` を付ける。
    pub fn outbound_headers(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
        for (name, value) in inbound {
            if is_hop_by_hop(name)
                || name == header::HOST
                || name == header::CONTENT_LENGTH
                || name == header::AUTHORIZATION
            {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        if self.endpoint.has_api_key() {
            match HeaderValue::from_str(&format!("Bearer {}", self.endpoint.api_key)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::warn!(
                        endpoint = %self.endpoint.name,
                        "API key contains characters not allowed in a header; sending without it"
                    );
                }
            }
        }

        headers
    }

    /// リクエストを転送してレスポンスを中継する
    pub async fn forward(
        &self,
        client: &Client,
        query: Option<&str>,
        inbound_headers: &HeaderMap,
        body: Bytes,
        timeout: Duration,
    ) -> GatewayResult<Response> {
        let mut url = self.chat_url.clone();
        url.set_query(query);

        let response = client
            .post(url)
            .headers(self.outbound_headers(inbound_headers))
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    endpoint = %self.endpoint.name,
                    error = %e,
                    "Failed to forward request to endpoint"
                );
                GatewayError::from(e)
            })?;

        tracing::debug!(
            endpoint = %self.endpoint.name,
            status = response.status().as_u16(),
            "Endpoint responded"
        );

        Ok(forward_streaming_response(response))
    }
}

/// エンドポイント名 → 転送先
#[derive(Debug, Clone)]
pub struct ForwardingTargets {
    client: Client,
    timeout: Duration,
    targets: HashMap<String, ForwardingTarget>,
}

impl ForwardingTargets {
    /// エンドポイント一覧から転送先を構築する
    ///
    /// ベースURLが不正なエンドポイントは警告を出して転送先なしにする。
    pub fn build(client: Client, endpoints: &[Arc<EndpointDescriptor>], timeout: Duration) -> Self {
        let mut targets = HashMap::with_capacity(endpoints.len());
        for endpoint in endpoints {
            match ForwardingTarget::new(Arc::clone(endpoint)) {
                Ok(target) => {
                    targets.insert(endpoint.name.clone(), target);
                }
                Err(e) => {
                    tracing::warn!(
                        endpoint = %endpoint.name,
                        error = %e,
                        "Endpoint has no forwarding target"
                    );
                }
            }
        }
        Self {
            client,
            timeout,
            targets,
        }
    }

    /// エンドポイント名から転送先を取得
    pub fn get(&self, name: &str) -> Option<&ForwardingTarget> {
        self.targets.get(name)
    }

    /// 共有HTTPクライアント
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// 転送リクエストのタイムアウト
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 転送先の数
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// 転送先がないか
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// バックエンドのレスポンスをステータス・ヘッダー・ボディのストリームごと中継する
///
/// ボディは読み込みながら流す。クライアントが切断してレスポンスが破棄されると
/// 上流のストリームも破棄される。
pub(crate) fn forward_streaming_response(response: reqwest::Response) -> Response {
    let status = response.status();
    let headers = response.headers().clone();
    let stream = response.bytes_stream().map_err(io::Error::other);
    let body = Body::from_stream(stream);
    let mut axum_response = Response::new(body);
    *axum_response.status_mut() =
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    {
        let response_headers = axum_response.headers_mut();
        for (name, value) in headers.iter() {
            if is_hop_by_hop(name) {
                continue;
            }
            response_headers.append(name.clone(), value.clone());
        }
    }
    axum_response
}
