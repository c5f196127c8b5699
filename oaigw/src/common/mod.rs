//! 共通型定義

/// エラー型定義
pub mod error;

/// OpenAI互換のワイヤ形式
pub mod protocol;
