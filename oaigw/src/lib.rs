//! OpenAI-compatible gateway
//!
//! 複数のOpenAI互換プロバイダを1つの `/v1/chat/completions` に束ねるゲートウェイ。
//! 同じモデルが異なる名前で公開されている場合でも名前空間を統合し、
//! 設定された重みに従ってプロバイダ間で負荷を分散する。

#![warn(missing_docs)]

/// 共通型定義（エラー型・ワイヤ形式）
pub mod common;

/// REST APIハンドラー
pub mod api;

/// ロードバランサー（重み付きランダム選択 + ラウンドロビンフォールバック）
pub mod balancer;

/// サーバー初期化（ディスカバリー → レジストリ構築 → 転送先構築）
pub mod bootstrap;

/// CLIインターフェース
pub mod cli;

/// 設定管理（YAML設定ファイル + 環境変数ヘルパー）
pub mod config;

/// ロギング初期化ユーティリティ
pub mod logging;

/// モデルレジストリ
pub mod registry;

/// axumサーバー起動・シャットダウン
pub mod server;

/// 協調的シャットダウン
pub mod shutdown;

/// モデルディスカバリー（エンドポイントの `/v1/models` 取得）
pub mod sync;

/// 型定義
pub mod types;

use std::sync::Arc;

/// アプリケーション状態
///
/// サーバー起動後は `balancer` 以外すべて読み取り専用。
#[derive(Clone)]
pub struct AppState {
    /// 凍結済みモデルレジストリ
    pub registry: registry::ModelRegistry,
    /// モデル単位のエンドポイント選択
    pub balancer: Arc<balancer::Balancer>,
    /// エンドポイント名 → 転送先
    pub targets: Arc<api::proxy::ForwardingTargets>,
}
