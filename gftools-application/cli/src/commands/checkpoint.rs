//! 异地复制检查点命令

use anyhow::Result;
use gftools_gluster::checkpoint::{evaluate, parse_target_time};
use gftools_gluster::CheckpointStatus;
use serde_json::json;
use tracing::info;

use super::common::AppContext;

/// 错误已经以 JSON 形式写到 stdout，main 只需返回失败退出码
#[derive(Debug)]
pub struct ErrorReported;

impl std::fmt::Display for ErrorReported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("错误已输出")
    }
}

impl std::error::Error for ErrorReported {}

/// 成功时的 JSON 文档
pub fn json_success(status: &CheckpointStatus) -> serde_json::Value {
    json!({ "ok": true, "data": status })
}

/// 失败时的 JSON 文档
pub fn json_error(message: &str) -> serde_json::Value {
    json!({ "ok": false, "error": message })
}

async fn check(args: &crate::CheckpointArgs, ctx: &AppContext) -> Result<CheckpointStatus> {
    let target = parse_target_time(&args.target_time)?;

    let stime = ctx
        .client()
        .read_stime(&args.mount_point, &args.master_vol_uuid, &args.slave_vol_uuid)
        .await?;

    let status = evaluate(stime, &target)?;
    info!(
        "检查点 {}: 最后同步 {}, 完成: {}",
        status.target_time, status.last_synced_time, status.completed
    );
    Ok(status)
}

pub async fn handle(args: crate::CheckpointArgs, ctx: &AppContext) -> Result<()> {
    let result = check(&args, ctx).await;

    if !args.json {
        println!("{}", result?.message());
        return Ok(());
    }

    match result {
        Ok(status) => {
            println!("{}", json_success(&status));
            Ok(())
        }
        Err(e) => {
            // JSON 模式下错误也输出到 stdout
            println!("{}", json_error(&e.to_string()));
            Err(ErrorReported.into())
        }
    }
}
