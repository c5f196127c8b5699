//! ゲートウェイ起動ヘルパー

use std::collections::BTreeMap;
use std::sync::Arc;

use oaigw::api::create_app;
use oaigw::bootstrap;
use oaigw::config::{GatewayConfig, RoutingMode, RoutingSection};
use oaigw::sync::{HttpModelDiscovery, ModelDiscovery};
use oaigw::types::EndpointDescriptor;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::http::{spawn_router, TestServer};

/// スタブバックエンドに `/v1/models` を生やす
#[allow(dead_code)]
pub async fn mount_models(server: &MockServer, ids: &[&str]) {
    let data: Vec<_> = ids.iter().map(|id| json!({"id": id, "object": "model"})).collect();
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
        })))
        .mount(server)
        .await;
}

/// エンドポイント定義
#[allow(dead_code)]
pub fn endpoint(name: &str, base_url: &str, api_key: &str, weight: i64) -> EndpointDescriptor {
    EndpointDescriptor::new(name, base_url, api_key, weight)
}

/// 設定を組み立てる
#[allow(dead_code)]
pub fn config(
    endpoints: Vec<EndpointDescriptor>,
    mode: RoutingMode,
    overrides: &[(&str, &[&str])],
) -> GatewayConfig {
    let model_overrides: BTreeMap<String, Vec<String>> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect();
    let mut config = GatewayConfig {
        endpoints,
        routing: RoutingSection {
            mode,
            model_overrides,
        },
        ..GatewayConfig::default()
    };
    config.server.host = "127.0.0.1".to_string();
    config
}

/// HTTPディスカバリーでゲートウェイを起動
#[allow(dead_code)]
pub async fn spawn_gateway(config: &GatewayConfig) -> TestServer {
    let client = reqwest::Client::new();
    let discovery = Arc::new(HttpModelDiscovery::new(client.clone()));
    spawn_gateway_with(config, discovery).await
}

/// ディスカバリー実装を指定してゲートウェイを起動
#[allow(dead_code)]
pub async fn spawn_gateway_with(
    config: &GatewayConfig,
    discovery: Arc<dyn ModelDiscovery>,
) -> TestServer {
    let state = bootstrap::initialize_with(config, reqwest::Client::new(), discovery).await;
    spawn_router(create_app(state)).await
}
