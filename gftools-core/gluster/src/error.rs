//! Gluster 错误定义

use thiserror::Error;

/// Gluster 操作结果类型
pub type Result<T> = std::result::Result<T, GlusterError>;

/// 读取 stime 失败时给用户的提示
pub const STIME_UNAVAILABLE_MSG: &str = "Unable to read stime xattr from mountpoint, \
please check if volume is mounted and geo-replication session is established";

/// Gluster 错误类型
#[derive(Error, Debug)]
pub enum GlusterError {
    /// 执行器错误（进程无法启动、超时、SSH 认证失败）
    #[error("命令执行错误: {0}")]
    Exec(#[from] gftools_executor::ExecError),

    /// `gluster volume info` 失败
    #[error("获取 Gluster 卷信息失败: {0}")]
    VolumeInfoFailed(String),

    /// `gluster volume set help` 失败
    #[error("获取默认卷选项失败: {0}")]
    OptionsFailed(String),

    /// XML 格式错误
    #[error("Gluster XML 格式错误: {0}")]
    BadXmlFormat(String),

    /// 过滤器不存在
    #[error("{0} filter not available")]
    FilterNotFound(String),

    /// 过滤值不是合法的正则表达式
    #[error("过滤器 {filter} 的值 {value:?} 不是合法的正则表达式: {reason}")]
    InvalidPattern {
        filter: String,
        value: String,
        reason: String,
    },

    /// 卷不存在
    #[error("Gluster 卷不存在: {0}")]
    VolumeNotFound(String),

    /// 无法读取异地复制 stime
    #[error("{}", STIME_UNAVAILABLE_MSG)]
    StimeUnavailable(String),

    /// 检查点时间格式错误
    #[error("无效的检查点时间 {0:?}，应为 \"%Y-%m-%d %H:%M:%S\" 或 now")]
    InvalidTime(String),

    /// 空间统计失败
    #[error("空间统计失败: {0}")]
    Space(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),
}
