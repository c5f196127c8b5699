//! エンドポイント型定義
//!
//! 設定ファイルの `endpoints[]` 1件に対応するバックエンドプロバイダ。
//! 読み込み後は不変で、レジストリからは `Arc` で共有される。

use serde::{Deserialize, Serialize};

/// バックエンドエンドポイント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// プロバイダ名（一意）
    pub name: String,
    /// ベースURL（例: `https://api.example.com`）
    pub base_url: String,
    /// バックエンドに送るAPIキー（空文字なら認証ヘッダーを付けない）
    #[serde(default)]
    pub api_key: String,
    /// 負荷分散の重み（`<= 0` は 1 として扱う）
    #[serde(default)]
    pub weight: i64,
}

impl EndpointDescriptor {
    /// 新しいエンドポイントを作成
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        weight: i64,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            weight,
        }
    }

    /// 選択時に使う重み（`<= 0` は 1）
    pub fn effective_weight(&self) -> u64 {
        if self.weight > 0 {
            self.weight as u64
        } else {
            1
        }
    }

    /// 設定された重み（`<= 0` は 0）
    ///
    /// 全候補の合計が 0 かどうかでラウンドロビンへの退避を判定する。
    pub fn configured_weight(&self) -> u64 {
        self.weight.max(0) as u64
    }

    /// 末尾スラッシュを除いたベースURL
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// APIキーが設定されているか
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}
