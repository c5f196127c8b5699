//! モデル統合（override）ルールの適用
//!
//! `merge` モードでのみ使う。`統合名 -> ["provider/model", ...]` の各参照を
//! 登録済みの `(エンドポイント名, モデルキー)` で解決し、統合名に追加する。

use crate::types::EndpointDescriptor;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// `"provider/model"` 形式の参照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderRef<'a> {
    /// エンドポイント名
    pub provider: &'a str,
    /// 元のモデルID（登録キー）
    pub model: &'a str,
}

impl<'a> ProviderRef<'a> {
    /// 最初の `/` で分割する
    ///
    /// どちらかが空なら `None`。モデル側には `/` を含んでよい。
    ///
    /// ```
    /// use oaigw::registry::overrides::ProviderRef;
    ///
    /// let r = ProviderRef::parse("provider-a/org/model").unwrap();
    /// assert_eq!(r.provider, "provider-a");
    /// assert_eq!(r.model, "org/model");
    /// assert!(ProviderRef::parse("no-slash").is_none());
    /// ```
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (provider, model) = raw.split_once('/')?;
        if provider.is_empty() || model.is_empty() {
            return None;
        }
        Some(Self { provider, model })
    }
}

/// override適用結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSummary {
    /// 1件以上統合されたルール数
    pub merged_rules: usize,
    /// 統合されたエンドポイント参照の総数
    pub merged_refs: usize,
    /// 形式不正でスキップした参照数
    pub malformed_refs: usize,
    /// 解決できずスキップした参照数
    pub unresolved_refs: usize,
    /// 削除された元モデルキー
    pub removed_keys: Vec<String>,
}

/// overrideルールを登録内容に適用する
///
/// ルールは統合名の昇順で処理する。各ルールについて:
///
/// 1. 参照 `(provider, model)` ごとに、`model` キーの中から名前が `provider` の
///    最初のエンドポイントを集める
/// 2. 1件以上集まれば統合名の末尾にまとめて追加（キーがなければ作る）
/// 3. 統合できた参照の `model` キーが、この時点でエンドポイント1件だけなら削除
pub fn apply_overrides(
    entries: &mut HashMap<String, Vec<Arc<EndpointDescriptor>>>,
    rules: &BTreeMap<String, Vec<String>>,
) -> OverrideSummary {
    let mut summary = OverrideSummary::default();

    for (unified, refs) in rules {
        let mut collected = Vec::new();
        let mut merged_keys = Vec::new();

        for raw in refs {
            let Some(provider_ref) = ProviderRef::parse(raw) else {
                tracing::debug!(unified = %unified, reference = %raw, "Skipping malformed model override");
                summary.malformed_refs += 1;
                continue;
            };

            let found = entries.get(provider_ref.model).and_then(|endpoints| {
                endpoints
                    .iter()
                    .find(|e| e.name == provider_ref.provider)
                    .cloned()
            });

            match found {
                Some(endpoint) => {
                    collected.push(endpoint);
                    merged_keys.push(provider_ref.model);
                }
                None => {
                    tracing::debug!(
                        unified = %unified,
                        provider = provider_ref.provider,
                        model = provider_ref.model,
                        "Model override did not resolve"
                    );
                    summary.unresolved_refs += 1;
                }
            }
        }

        if collected.is_empty() {
            continue;
        }

        summary.merged_rules += 1;
        summary.merged_refs += collected.len();
        entries.entry(unified.clone()).or_default().extend(collected);

        for key in merged_keys {
            if entries.get(key).is_some_and(|endpoints| endpoints.len() == 1) {
                entries.remove(key);
                summary.removed_keys.push(key.to_string());
            }
        }

        tracing::info!(unified = %unified, "Applied model override");
    }

    summary
}
