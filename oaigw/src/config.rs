//! Configuration management
//!
//! YAML設定ファイル（server / endpoints / routing）の読み込みと、
//! 環境変数から読むランタイム設定のヘルパー。

use crate::common::error::{CommonError, CommonResult};
use crate::types::EndpointDescriptor;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// ディスカバリー（`GET /v1/models`）のデフォルトタイムアウト（秒）
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 10;

/// バックエンドへの転送リクエストのデフォルトタイムアウト（秒）
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 300;

/// バックエンドへの接続タイムアウト（秒）
pub const UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use oaigw::config::get_env_with_fallback;
///
/// let port = get_env_with_fallback("OAIGW_PORT", "GATEWAY_PORT");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Falls back to `default` when neither variable is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// ディスカバリーのタイムアウトを取得
///
/// 環境変数 `OAIGW_DISCOVERY_TIMEOUT_SECS`（旧: `GATEWAY_DISCOVERY_TIMEOUT_SECS`）、
/// 未設定なら 10 秒。
pub fn discovery_timeout() -> Duration {
    let secs = get_env_with_fallback_parse(
        "OAIGW_DISCOVERY_TIMEOUT_SECS",
        "GATEWAY_DISCOVERY_TIMEOUT_SECS",
        DEFAULT_DISCOVERY_TIMEOUT_SECS,
    );
    Duration::from_secs(secs)
}

/// 転送リクエストのタイムアウトを取得
///
/// ストリーミング応答の読み切りまでを含む上限。
/// 環境変数 `OAIGW_UPSTREAM_TIMEOUT_SECS`、未設定なら 300 秒。
pub fn upstream_timeout() -> Duration {
    let secs = get_env_with_fallback_parse(
        "OAIGW_UPSTREAM_TIMEOUT_SECS",
        "GATEWAY_UPSTREAM_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_TIMEOUT_SECS,
    );
    Duration::from_secs(secs)
}

/// モデル名前空間のポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// モデルIDをそのまま公開（デフォルト）
    #[default]
    Raw,
    /// `"{endpoint}/{model}"` で公開
    Prefix,
    /// モデルIDをそのまま公開し、`model_overrides` で統合
    Merge,
}

impl RoutingMode {
    /// 設定値の文字列から変換（未知の値は `Raw`）
    pub fn from_config_str(value: &str) -> Self {
        match value {
            "prefix" => Self::Prefix,
            "merge" => Self::Merge,
            _ => Self::Raw,
        }
    }
}

impl<'de> Deserialize<'de> for RoutingMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .as_deref()
            .map(Self::from_config_str)
            .unwrap_or_default())
    }
}

/// `server` セクション
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// ホストアドレス (デフォルト: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号 (デフォルト: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// ゲートウェイ自身のAPIキー
    ///
    /// 読み込むだけで、受信リクエストの認証には使わない。
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
        }
    }
}

/// `routing` セクション
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingSection {
    /// 名前空間ポリシー
    #[serde(default)]
    pub mode: RoutingMode,

    /// 統合名 → `"provider/model"` 参照の一覧（`merge` のときのみ適用）
    #[serde(default)]
    pub model_overrides: BTreeMap<String, Vec<String>>,
}

/// 設定ファイル全体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// 待ち受け設定
    #[serde(default)]
    pub server: ServerSection,
    /// バックエンド一覧
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
    /// ルーティング設定
    #[serde(default)]
    pub routing: RoutingSection,
}

impl GatewayConfig {
    /// YAML文字列から読み込んで検証する
    pub fn from_yaml_str(content: &str) -> CommonResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 設定ファイルを読み込んで検証する
    pub fn load(path: impl AsRef<Path>) -> CommonResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommonError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// エンドポイント名が空でなく一意であることを検証
    pub fn validate(&self) -> CommonResult<()> {
        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            if endpoint.name.trim().is_empty() {
                return Err(CommonError::Validation(
                    "endpoint name must not be empty".to_string(),
                ));
            }
            if !seen.insert(endpoint.name.as_str()) {
                return Err(CommonError::Validation(format!(
                    "duplicate endpoint name: {}",
                    endpoint.name
                )));
            }
        }
        Ok(())
    }

    /// `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
