//! 型定義

/// エンドポイント型定義
pub mod endpoint;

pub use endpoint::EndpointDescriptor;
