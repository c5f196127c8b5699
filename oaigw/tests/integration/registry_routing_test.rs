//! Integration: ディスカバリー → レジストリ → ルーター を通した名前空間ポリシーの検証

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use oaigw::api::{create_app, MAX_REQUEST_BODY_BYTES};
use oaigw::balancer::Balancer;
use oaigw::bootstrap;
use oaigw::config::{GatewayConfig, RoutingMode};
use oaigw::registry::build_registry;
use oaigw::sync::StaticModelDiscovery;
use oaigw::types::EndpointDescriptor;
use serde_json::Value;
use tower::ServiceExt;

const PREFIX_CONFIG: &str = r#"
endpoints:
  - name: openai
    base_url: "http://127.0.0.1:1"
    api_key: sk-openai
  - name: azure
    base_url: "http://127.0.0.1:2"
routing:
  mode: prefix
  model_overrides:
    gpt-4: ["openai/gpt-4"]
"#;

const MERGE_CONFIG: &str = r#"
endpoints:
  - { name: provider-a, base_url: "http://127.0.0.1:1", weight: 3 }
  - { name: provider-b, base_url: "http://127.0.0.1:2" }
  - { name: provider-c, base_url: "http://127.0.0.1:3" }
routing:
  mode: merge
  model_overrides:
    gpt-4:
      - provider-a/gpt-4-turbo-preview
      - provider-b/gpt-4-0613
      - provider-c/missing-model
      - not-a-ref
    llama-3:
      - provider-a/llama3
"#;

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn model_ids(list: &Value) -> Vec<String> {
    list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn prefix_policy_exposes_qualified_names_and_ignores_overrides() {
    let config = GatewayConfig::from_yaml_str(PREFIX_CONFIG).unwrap();
    let discovery = StaticModelDiscovery::new()
        .with_models("openai", ["gpt-4", "gpt-4o"])
        .with_models("azure", ["gpt-4"]);

    let state =
        bootstrap::initialize_with(&config, reqwest::Client::new(), Arc::new(discovery)).await;
    let (status, list) = get_json(create_app(state), "/v1/models").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        model_ids(&list),
        vec!["azure/gpt-4", "openai/gpt-4", "openai/gpt-4o"]
    );
}

#[tokio::test]
async fn merge_policy_applies_partial_and_full_rules() {
    let config = GatewayConfig::from_yaml_str(MERGE_CONFIG).unwrap();
    // llama3 は provider-a と provider-c の両方が提供する
    let discovery = StaticModelDiscovery::new()
        .with_models("provider-a", ["gpt-4-turbo-preview", "llama3"])
        .with_models("provider-b", ["gpt-4-0613"])
        .with_models("provider-c", ["llama3"]);

    let endpoints = bootstrap::endpoint_directory(&config);
    let registry = build_registry(
        &endpoints,
        Arc::new(discovery),
        &config.routing,
        Duration::from_secs(1),
    )
    .await;

    assert_eq!(registry.model_names(), vec!["gpt-4", "llama-3", "llama3"]);

    let mut gpt4: Vec<&str> = registry.get("gpt-4").iter().map(|e| e.name.as_str()).collect();
    gpt4.sort();
    assert_eq!(gpt4, vec!["provider-a", "provider-b"]);

    let llama: Vec<&str> = registry.get("llama-3").iter().map(|e| e.name.as_str()).collect();
    assert_eq!(llama, vec!["provider-a"]);
    assert_eq!(registry.get("llama3").len(), 2);

    // 統合後の候補は設定のエンドポイントそのもの
    let a = registry.get("llama-3")[0].clone();
    assert!(Arc::ptr_eq(&a, &endpoints[0]));
    assert_eq!(a.weight, 3);
}

#[tokio::test]
async fn unknown_model_is_404_through_router() {
    let config = GatewayConfig::from_yaml_str(PREFIX_CONFIG).unwrap();
    let discovery = StaticModelDiscovery::new().with_models("openai", ["gpt-4"]);
    let state =
        bootstrap::initialize_with(&config, reqwest::Client::new(), Arc::new(discovery)).await;

    // prefix モードでは素のモデルIDは登録されない
    let response = create_app(state)
        .oneshot(
            Request::post("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"model":"gpt-4","messages":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_selection_from_many_tasks_keeps_round_robin_exact() {
    let candidates: Vec<Arc<EndpointDescriptor>> = (0..3)
        .map(|i| {
            Arc::new(EndpointDescriptor::new(
                format!("p{i}"),
                format!("http://p{i}"),
                "",
                0,
            ))
        })
        .collect();
    let candidates = Arc::new(candidates);
    let balancer = Arc::new(Balancer::new());

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let candidates = Arc::clone(&candidates);
        let balancer = Arc::clone(&balancer);
        tasks.spawn(async move {
            let mut picked = HashMap::<String, usize>::new();
            for _ in 0..300 {
                let selected = balancer.select("m", &candidates).unwrap();
                *picked.entry(selected.name.clone()).or_default() += 1;
                tokio::task::yield_now().await;
            }
            picked
        });
    }

    let mut totals = HashMap::<String, usize>::new();
    while let Some(joined) = tasks.join_next().await {
        for (name, n) in joined.unwrap() {
            *totals.entry(name).or_default() += n;
        }
    }

    assert_eq!(balancer.counter("m"), 12 * 300);
    for name in ["p0", "p1", "p2"] {
        assert_eq!(totals[name], 12 * 300 / 3, "{name}");
    }
}

#[tokio::test]
async fn oversized_body_is_413_in_openai_format() {
    let config = GatewayConfig::from_yaml_str(PREFIX_CONFIG).unwrap();
    let discovery = StaticModelDiscovery::new().with_models("openai", ["gpt-4"]);
    let state =
        bootstrap::initialize_with(&config, reqwest::Client::new(), Arc::new(discovery)).await;

    let response = create_app(state)
        .oneshot(
            Request::post("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(vec![b' '; MAX_REQUEST_BODY_BYTES + 1]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["code"], "413");
}
