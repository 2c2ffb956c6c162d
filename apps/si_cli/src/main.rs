// apps/si_cli/src/main.rs

//! 插值评估命令行界面
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**：
//! - 只接触 `EvalConfig` 与 `EvaluationEngine`
//! - 插值器通过配置中的 `kind` 在运行时选择

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// 时间窗口空间插值评估工具
#[derive(Parser)]
#[command(name = "si_cli")]
#[command(author = "SpatialInterp Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Time-windowed spatial interpolation evaluation", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行评估
    Evaluate(commands::evaluate::EvaluateArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Evaluate(args) => commands::evaluate::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
