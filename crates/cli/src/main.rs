//! # CARLA HUD CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载、命令行覆盖与验证
//! - 渲染循环与生命周期管理
//! - Ctrl+C 处理与有序清理

mod cli;
mod commands;
mod error;
mod game;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_client, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(
        ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet).with_format(cli.log_format.into()),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "CARLA HUD starting");

    let result = match &cli.command {
        Commands::Run(args) => run_client(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
    }

    result
}
