//! 統合テスト共通ヘルパー

pub mod gateway;
pub mod http;
