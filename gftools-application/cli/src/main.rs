//! gftools CLI 应用

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::checkpoint::ErrorReported;
use commands::common::{parse_key_value, AppContext};

#[derive(Parser)]
#[command(name = "gftools")]
#[command(about = "GlusterFS 卷管理工具集", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别（RUST_LOG 优先）
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// 配置文件路径（默认 ~/.config/gftools/config.toml）
    #[arg(long, global = true)]
    config: Option<String>,

    /// 通过 SSH 在指定 Gluster 节点执行 gluster 命令
    #[arg(long, global = true)]
    host: Option<String>,

    /// 禁用彩色输出
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 卷信息汇总
    Volumes(VolumesArgs),

    /// 卷空间使用情况
    #[command(disable_help_flag = true)]
    Df(DfArgs),

    /// 默认或卷上生效的选项
    Options(OptionsArgs),

    /// 检查异地复制检查点是否完成
    #[command(after_help = CHECKPOINT_EXAMPLES)]
    Checkpoint(CheckpointArgs),
}

const CHECKPOINT_EXAMPLES: &str = "\
示例:
  gftools checkpoint /mnt/gvm 6d93c9ff-6474-4806-bf22-bb023a199f4d \\
      ef94e665-04f6-45a1-af47-a2fc94b238fb \"2014-07-22 17:16:05\"
  gftools checkpoint /mnt/gvm 6d93c9ff-6474-4806-bf22-bb023a199f4d \\
      ef94e665-04f6-45a1-af47-a2fc94b238fb now --json";

/// 卷过滤参数，按 name/status/type/volumewithbrick/transport/--filter 的顺序应用
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// 按卷名过滤（忽略大小写的精确匹配或正则）
    #[arg(long)]
    pub name: Option<String>,

    /// 按状态过滤 (up/down)
    #[arg(long)]
    pub status: Option<String>,

    /// 按卷类型过滤（如 replicate、distributed_replicate）
    #[arg(long = "type")]
    pub volume_type: Option<String>,

    /// 只显示包含匹配 brick 的卷
    #[arg(long, visible_aliases = ["volumewithbricks", "brick"])]
    pub volumewithbrick: Option<String>,

    /// 按传输类型过滤 (tcp/rdma)
    #[arg(long)]
    pub transport: Option<String>,

    /// 其他过滤器（NAME=VALUE，可重复）
    #[arg(long = "filter", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub extra: Vec<(String, String)>,
}

#[derive(Args)]
pub struct VolumesArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// JSON 格式输出
    #[arg(long)]
    pub json: bool,

    /// 显示传输类型和副本/分布/条带数
    #[arg(long)]
    pub show_detail: bool,

    /// 显示 brick 列表
    #[arg(long)]
    pub show_bricks: bool,

    /// 显示卷选项
    #[arg(long)]
    pub show_options: bool,

    /// 列出可用的过滤器
    #[arg(long)]
    pub list_filters: bool,
}

#[derive(Args)]
pub struct DfArgs {
    /// 按 SIZE 缩放数值，如 -BM 以 1,048,576 字节为单位
    #[arg(short = 'B', long = "block-size", value_name = "SIZE")]
    pub block_size: Option<String>,

    /// 等同于 --block-size=1K
    #[arg(short = 'k')]
    pub kilo: bool,

    /// 人类可读格式（如 1.0K 2.5M 2.0G）
    #[arg(short = 'h', long)]
    pub human_readable: bool,

    /// 同上，但使用 1000 的幂
    #[arg(short = 'H', long)]
    pub si: bool,

    /// 追加总计行
    #[arg(long)]
    pub total: bool,

    /// 显示 inode 信息而不是块使用情况
    #[arg(short = 'i', long)]
    pub inodes: bool,

    /// 显示帮助
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// JSON 格式输出
    #[arg(long)]
    pub json: bool,

    /// 显示的字段（逗号分隔）
    #[arg(long, hide = true)]
    pub fields: Option<String>,
}

#[derive(Args)]
pub struct OptionsArgs {
    /// 卷名（显示该卷上生效的值）
    #[arg(long)]
    pub volume: Option<String>,

    /// 按选项名过滤（支持正则）
    #[arg(long)]
    pub option: Option<String>,

    /// 显示选项说明
    #[arg(long)]
    pub show_desc: bool,

    /// JSON 格式输出
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckpointArgs {
    /// 主卷挂载点
    pub mount_point: String,

    /// 主卷 UUID
    pub master_vol_uuid: String,

    /// 从卷 UUID
    pub slave_vol_uuid: String,

    /// 检查点时间，格式为 "%Y-%m-%d %H:%M:%S" 或 now
    pub target_time: String,

    /// JSON 格式输出
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志（输出到 stderr，避免干扰 JSON 输出）
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    info!("gftools 启动");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<ErrorReported>() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(cli.config.as_deref(), cli.host)?;

    // 处理命令
    match cli.command {
        Commands::Volumes(args) => commands::volumes::handle(args, &ctx).await?,
        Commands::Df(args) => commands::df::handle(args, &ctx).await?,
        Commands::Options(args) => commands::options::handle(args, &ctx).await?,
        Commands::Checkpoint(args) => commands::checkpoint::handle(args, &ctx).await?,
    }

    Ok(())
}
