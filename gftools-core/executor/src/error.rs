//! 执行器错误定义

use thiserror::Error;

/// 执行器操作结果类型
pub type Result<T> = std::result::Result<T, ExecError>;

/// 执行器错误类型
#[derive(Error, Debug)]
pub enum ExecError {
    /// 进程无法启动（命令不存在、权限不足等）
    #[error("无法启动命令 {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// 命令以非零状态退出
    #[error("命令执行失败 (退出码 {exit_code:?}): {message}")]
    NonZeroExit {
        exit_code: Option<i32>,
        message: String,
    },

    /// SSH 认证错误
    #[error("SSH 认证失败: {0}")]
    Authentication(String),

    /// 超时错误
    #[error("命令执行超时: {0}")]
    Timeout(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}
