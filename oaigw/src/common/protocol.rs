//! OpenAI互換プロトコル定義
//!
//! `/v1/models` のレスポンスと、ルーティングに必要な
//! `/v1/chat/completions` リクエストの最小フィールド

use serde::{Deserialize, Serialize};

/// `/v1/models` の `owned_by` に入れるゲートウェイ識別子
pub const GATEWAY_OWNER: &str = "oaigw";

/// モデル一覧の1エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelObject {
    /// 公開モデル名（レジストリのキー）
    pub id: String,
    /// 常に `"model"`
    pub object: String,
    /// 所有者（ゲートウェイ識別子）
    pub owned_by: String,
}

impl ModelObject {
    /// ゲートウェイ所有のモデルエントリを作成
    pub fn owned_by_gateway(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            owned_by: GATEWAY_OWNER.to_string(),
        }
    }
}

/// `/v1/models` レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    /// 常に `"list"`
    pub object: String,
    /// モデル一覧
    pub data: Vec<ModelObject>,
}

impl ModelList {
    /// モデル名一覧からレスポンスを作成
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object: "list".to_string(),
            data: names
                .into_iter()
                .map(ModelObject::owned_by_gateway)
                .collect(),
        }
    }
}

/// チャットリクエストのうちルーティングに使うフィールドだけを取り出した型
///
/// それ以外のフィールドは無視されるが、転送時には元のボディがそのまま使われる。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatRoutingFields {
    /// 要求モデル名
    pub model: String,
    /// ストリーミング要求か
    #[serde(default)]
    pub stream: bool,
}

impl ChatRoutingFields {
    /// 生のリクエストボディからルーティングフィールドを読む
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
