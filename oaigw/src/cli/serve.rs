//! serve サブコマンド
//!
//! ディスカバリー完了後にゲートウェイサーバーを起動します。

use crate::common::error::CommonResult;
use crate::config::{get_env_with_fallback, GatewayConfig};
use crate::shutdown::ShutdownController;
use crate::{bootstrap, server};
use clap::Args;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Listen port (overrides server.port)
    #[arg(short, long, env = "OAIGW_PORT")]
    pub port: Option<u16>,

    /// Bind address (overrides server.host)
    #[arg(short = 'H', long, env = "OAIGW_HOST")]
    pub host: Option<String>,
}

impl ServeArgs {
    /// サブコマンド省略時の引数（環境変数のみから読む）
    pub fn from_env() -> Self {
        Self {
            port: get_env_with_fallback("OAIGW_PORT", "GATEWAY_PORT").and_then(|p| p.parse().ok()),
            host: get_env_with_fallback("OAIGW_HOST", "GATEWAY_HOST"),
        }
    }

    /// 設定ファイルの値をCLI/環境変数で上書きする
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// サーバーを起動してシャットダウンまで待つ
pub async fn execute(mut config: GatewayConfig, args: &ServeArgs) -> CommonResult<()> {
    args.apply(&mut config);
    let state = bootstrap::initialize(&config).await?;
    server::run(state, &config.bind_addr(), ShutdownController::default()).await?;
    Ok(())
}
