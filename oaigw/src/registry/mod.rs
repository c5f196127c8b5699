//! モデルレジストリ
//!
//! 起動時のディスカバリー結果から `公開モデル名 -> [エンドポイント]` を構築する。
//! 構築後は `ModelRegistry` として凍結され、リクエスト処理中は読み取り専用。

pub mod overrides;

pub use overrides::{apply_overrides, OverrideSummary, ProviderRef};

use crate::config::{RoutingMode, RoutingSection};
use crate::sync::ModelDiscovery;
use crate::types::EndpointDescriptor;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinSet;

type Entries = HashMap<String, Vec<Arc<EndpointDescriptor>>>;

/// 凍結済みのモデルレジストリ
///
/// クローンは同じスナップショットを共有する。
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Arc<Entries>,
}

impl ModelRegistry {
    /// マップから直接作成
    pub fn from_entries(models: HashMap<String, Vec<Arc<EndpointDescriptor>>>) -> Self {
        Self {
            models: Arc::new(models),
        }
    }

    /// モデルの候補エンドポイント（未登録なら空）
    pub fn get(&self, model: &str) -> &[Arc<EndpointDescriptor>] {
        self.models.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 登録済みモデル名（昇順）
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    /// 登録モデル数
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// 登録モデルがないか
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// `(モデル名, 候補)` の反復（順序不定）
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arc<EndpointDescriptor>])> {
        self.models
            .iter()
            .map(|(name, endpoints)| (name.as_str(), endpoints.as_slice()))
    }
}

/// 構築中のレジストリ
///
/// ディスカバリータスクから並行に `register` され、追加は1つのロックで直列化する。
#[derive(Debug, Clone, Default)]
pub struct ModelRegistryBuilder {
    mode: RoutingMode,
    entries: Arc<Mutex<Entries>>,
}

impl ModelRegistryBuilder {
    /// 名前空間ポリシーを指定して作成
    pub fn new(mode: RoutingMode) -> Self {
        Self {
            mode,
            entries: Arc::default(),
        }
    }

    /// 登録キーを決める
    ///
    /// `prefix` なら `"{endpoint}/{model}"`、それ以外はモデルIDそのまま。
    pub fn registry_key(mode: RoutingMode, endpoint_name: &str, model_id: &str) -> String {
        match mode {
            RoutingMode::Prefix => format!("{}/{}", endpoint_name, model_id),
            RoutingMode::Raw | RoutingMode::Merge => model_id.to_string(),
        }
    }

    /// モデルIDに対してエンドポイントを末尾に追加
    pub fn register(&self, endpoint: &Arc<EndpointDescriptor>, model_id: &str) {
        let key = Self::registry_key(self.mode, &endpoint.name, model_id);
        self.lock().entry(key).or_default().push(Arc::clone(endpoint));
    }

    /// `merge` モードならoverrideルールを適用する（それ以外は何もしない）
    pub fn apply_overrides(&self, routing: &RoutingSection) -> Option<OverrideSummary> {
        if self.mode != RoutingMode::Merge {
            if !routing.model_overrides.is_empty() {
                tracing::debug!(
                    mode = ?self.mode,
                    "Ignoring model_overrides outside merge mode"
                );
            }
            return None;
        }
        Some(apply_overrides(&mut self.lock(), &routing.model_overrides))
    }

    /// 凍結してスナップショットにする
    pub fn freeze(self) -> ModelRegistry {
        let entries = std::mem::take(&mut *self.lock());
        ModelRegistry::from_entries(entries)
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 全エンドポイントのディスカバリーを並行実行してレジストリを構築する
///
/// 1エンドポイントにつき1タスク。すべてのタスクが終わってから
/// overrideを適用し、凍結して返す。ディスカバリーが `timeout` を超えたら
/// そのエンドポイントは空の一覧として扱う。
pub async fn build_registry(
    endpoints: &[Arc<EndpointDescriptor>],
    discovery: Arc<dyn ModelDiscovery>,
    routing: &RoutingSection,
    timeout: Duration,
) -> ModelRegistry {
    let builder = ModelRegistryBuilder::new(routing.mode);
    let mut tasks = JoinSet::new();

    for endpoint in endpoints {
        let endpoint = Arc::clone(endpoint);
        let discovery = Arc::clone(&discovery);
        let builder = builder.clone();
        tasks.spawn(async move {
            let models =
                match tokio::time::timeout(timeout, discovery.list_models(&endpoint, timeout))
                    .await
                {
                    Ok(models) => models,
                    Err(_) => {
                        tracing::warn!(
                            endpoint = %endpoint.name,
                            timeout_secs = timeout.as_secs_f64(),
                            "Model discovery timed out"
                        );
                        Vec::new()
                    }
                };
            for model in &models {
                builder.register(&endpoint, model);
            }
            (endpoint.name.clone(), models.len())
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, count)) => {
                tracing::info!(endpoint = %name, models = count, "Endpoint discovery finished");
            }
            Err(e) => {
                tracing::error!(error = %e, "Discovery task failed");
            }
        }
    }

    if let Some(summary) = builder.apply_overrides(routing) {
        tracing::info!(
            merged_rules = summary.merged_rules,
            merged_refs = summary.merged_refs,
            malformed_refs = summary.malformed_refs,
            unresolved_refs = summary.unresolved_refs,
            removed_keys = ?summary.removed_keys,
            "Model overrides applied"
        );
    }

    let registry = builder.freeze();
    tracing::info!(models = registry.len(), mode = ?routing.mode, "Model registry ready");
    registry
}
