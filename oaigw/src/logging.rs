//! ロギング初期化
//!
//! `RUST_LOG` が設定されていればそれを優先し、なければ
//! `OAIGW_LOG_LEVEL`（旧: `LOG_LEVEL`、デフォルト: `info`）から
//! フィルタを組み立てる。

use crate::config::get_env_with_fallback_or;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ロギングを初期化する
///
/// 二重初期化はエラーとして返す。
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter())
        .with(fmt::layer().with_target(true).compact())
        .try_init()
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives()))
}

/// `RUST_LOG` 未設定時のフィルタ文字列
pub fn default_directives() -> String {
    let level = get_env_with_fallback_or("OAIGW_LOG_LEVEL", "LOG_LEVEL", "info");
    format!("{level},hyper=warn,reqwest=warn")
}
