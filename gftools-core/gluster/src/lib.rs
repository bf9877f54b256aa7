//! gftools Gluster 工具库
//!
//! 基于 gluster 管理命令提供：
//! - 解析 `gluster volume info --xml` 获取卷信息
//! - 按名称、状态、类型、brick、传输类型过滤卷
//! - 解析 `gluster volume set help` 获取卷选项
//! - 通过已挂载客户端统计卷空间使用情况
//! - 检查异地复制检查点是否完成
//!
//! # 示例
//!
//! ```ignore
//! use std::sync::Arc;
//! use gftools_executor::{ExecConfig, Executor};
//! use gftools_gluster::GlusterClient;
//!
//! let client = GlusterClient::new(Arc::new(Executor::new(ExecConfig::local())));
//!
//! for vol in client.search(&[("status", "up")]).await? {
//!     println!("{} {} {}", vol.uuid, vol.name, vol.volume_type);
//! }
//! ```

pub mod checkpoint;
mod client;
mod error;
pub mod filters;
mod models;
mod parser;
pub mod space;

pub use client::{GlusterClient, DEFAULT_GETFATTR_BIN, DEFAULT_GLUSTER_BIN};
pub use error::{GlusterError, Result, STIME_UNAVAILABLE_MSG};
pub use filters::FilterRegistry;
pub use models::{
    CheckpointStatus, GlusterVolume, OptionInfo, SpaceUsage, Stime, Transport, VolumeOption,
    VolumeStatus,
};
pub use parser::{
    merge_volume_options, parse_default_options, parse_stime, parse_volume_info, stime_xattr_key,
};
