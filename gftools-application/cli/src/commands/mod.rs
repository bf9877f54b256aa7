//! CLI 命令处理模块

pub mod checkpoint; // 异地复制检查点
pub mod common; // 公共工具函数
pub mod df;
pub mod options;
pub mod output;
pub mod volumes;
