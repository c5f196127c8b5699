//! models サブコマンド
//!
//! ディスカバリーとoverride適用を1回だけ実行し、
//! 構築されたレジストリ（モデル → エンドポイント）を表示して終了します。

use crate::bootstrap;
use crate::common::error::CommonResult;
use crate::config::GatewayConfig;
use crate::registry::ModelRegistry;
use crate::sync::HttpModelDiscovery;
use clap::Args;
use serde_json::json;
use std::sync::Arc;

/// models サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct ModelsArgs {
    /// Print the registry as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// レジストリを構築して標準出力に表示する
pub async fn execute(config: &GatewayConfig, args: &ModelsArgs) -> CommonResult<()> {
    let client = bootstrap::build_http_client()?;
    let endpoints = bootstrap::endpoint_directory(config);
    let registry = bootstrap::discover_registry(
        config,
        &endpoints,
        Arc::new(HttpModelDiscovery::new(client)),
    )
    .await;

    let output = if args.json {
        serde_json::to_string_pretty(&render_json(&registry))?
    } else {
        render_table(&registry)
    };
    println!("{}", output);
    Ok(())
}

/// `モデル名  エンドポイント, ...` の行をモデル名順に並べる
pub fn render_table(registry: &ModelRegistry) -> String {
    let names = registry.model_names();
    let width = names.iter().map(String::len).max().unwrap_or(0);
    names
        .iter()
        .map(|name| {
            let endpoints: Vec<&str> = registry
                .get(name)
                .iter()
                .map(|e| e.name.as_str())
                .collect();
            format!("{:<width$}  {}", name, endpoints.join(", "), width = width)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `{"モデル名": ["エンドポイント", ...]}`
pub fn render_json(registry: &ModelRegistry) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = registry
        .model_names()
        .into_iter()
        .map(|name| {
            let endpoints: Vec<&str> = registry
                .get(&name)
                .iter()
                .map(|e| e.name.as_str())
                .collect();
            let value = json!(endpoints);
            (name, value)
        })
        .collect();
    serde_json::Value::Object(map)
}
