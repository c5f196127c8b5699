//! サーバー初期化ロジック
//!
//! 設定からエンドポイント一覧を作り、全エンドポイントのディスカバリーを
//! 並行実行してレジストリを構築し、転送先とバランサーをまとめて
//! `AppState` を返す。ディスカバリーが終わるまでサーバーは起動しない。

use crate::api::proxy::ForwardingTargets;
use crate::balancer::Balancer;
use crate::common::error::{CommonError, CommonResult};
use crate::config::{self, GatewayConfig, UPSTREAM_CONNECT_TIMEOUT_SECS};
use crate::registry::{self, ModelRegistry};
use crate::sync::{HttpModelDiscovery, ModelDiscovery};
use crate::types::EndpointDescriptor;
use crate::AppState;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// バックエンド共有のHTTPクライアントを作成
pub fn build_http_client() -> CommonResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(UPSTREAM_CONNECT_TIMEOUT_SECS))
        .pool_max_idle_per_host(32)
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .build()
        .map_err(|e| CommonError::Config(format!("failed to create HTTP client: {}", e)))
}

/// 設定のエンドポイントを共有可能な形にする
pub fn endpoint_directory(config: &GatewayConfig) -> Vec<Arc<EndpointDescriptor>> {
    config.endpoints.iter().cloned().map(Arc::new).collect()
}

/// ディスカバリーを実行してレジストリを構築する
pub async fn discover_registry(
    config: &GatewayConfig,
    endpoints: &[Arc<EndpointDescriptor>],
    discovery: Arc<dyn ModelDiscovery>,
) -> ModelRegistry {
    let timeout = config::discovery_timeout();
    info!(
        endpoints = endpoints.len(),
        timeout_secs = timeout.as_secs(),
        "Discovering models"
    );
    registry::build_registry(endpoints, discovery, &config.routing, timeout).await
}

/// HTTPディスカバリーでサーバー初期化を実行する
pub async fn initialize(config: &GatewayConfig) -> CommonResult<AppState> {
    let client = build_http_client()?;
    let discovery = Arc::new(HttpModelDiscovery::new(client.clone()));
    Ok(initialize_with(config, client, discovery).await)
}

/// ディスカバリー実装を指定してサーバー初期化を実行する
pub async fn initialize_with(
    config: &GatewayConfig,
    client: Client,
    discovery: Arc<dyn ModelDiscovery>,
) -> AppState {
    info!("oaigw v{}", env!("CARGO_PKG_VERSION"));

    let endpoints = endpoint_directory(config);
    let registry = discover_registry(config, &endpoints, discovery).await;
    let targets = ForwardingTargets::build(client, &endpoints, config::upstream_timeout());

    if registry.is_empty() {
        tracing::warn!("No models were discovered; every chat request will return 404");
    }

    AppState {
        registry,
        balancer: Arc::new(Balancer::new()),
        targets: Arc::new(targets),
    }
}
