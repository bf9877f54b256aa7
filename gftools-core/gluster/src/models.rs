//! Gluster 数据模型

use std::fmt;

use serde::{Deserialize, Serialize};

/// 卷运行状态
///
/// `statusStr` 为 Started 时为 UP，其余一律为 DOWN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeStatus {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DOWN")]
    Down,
}

impl VolumeStatus {
    /// 从 gluster 的 statusStr 转换
    pub fn from_status_str(status: &str) -> Self {
        if status.trim().to_uppercase() == "STARTED" {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 卷传输类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "RDMA")]
    Rdma,
    #[serde(rename = "TCP,RDMA")]
    TcpRdma,
}

impl Transport {
    /// 从 gluster XML 中的传输代码转换：0=TCP，1=RDMA，其余为两者
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => Self::Tcp,
            "1" => Self::Rdma,
            _ => Self::TcpRdma,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Rdma => "RDMA",
            Self::TcpRdma => "TCP,RDMA",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 卷上设置的选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeOption {
    pub name: String,
    pub value: String,
}

impl VolumeOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Gluster 卷信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlusterVolume {
    /// 卷名
    pub name: String,
    /// 卷 ID
    pub uuid: String,
    /// 卷类型（大写，`-` 替换为 `_`，如 DISTRIBUTED_REPLICATE）
    #[serde(rename = "type")]
    pub volume_type: String,
    /// 状态
    pub status: VolumeStatus,
    /// Brick 数
    pub num_bricks: u32,
    /// 分布数
    pub distribute: u32,
    /// 条带数
    pub stripe: u32,
    /// 副本数
    pub replica: u32,
    /// 传输类型
    pub transport: Transport,
    /// Brick 列表（host:/path）
    pub bricks: Vec<String>,
    /// 已设置的卷选项
    pub options: Vec<VolumeOption>,
}

impl GlusterVolume {
    /// 规范化卷类型：`Distributed-Replicate` -> `DISTRIBUTED_REPLICATE`
    pub fn normalize_type(type_str: &str) -> String {
        type_str.trim().to_uppercase().replace('-', "_")
    }

    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }

    /// 查找卷上设置的选项值
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }
}

/// 卷选项（含默认值和说明）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub name: String,
    pub value: String,
    pub description: String,
}

/// 卷空间使用情况
///
/// 卷为 DOWN 或未挂载时数值均为 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceUsage {
    pub volume: String,
    pub status: Option<VolumeStatus>,
    /// 挂载点（未找到时为 None）
    pub mount_point: Option<String>,
    pub size: Option<u64>,
    pub used: Option<u64>,
    pub avail: Option<u64>,
    pub pcent: Option<u64>,
    pub itotal: Option<u64>,
    pub iused: Option<u64>,
    pub iavail: Option<u64>,
    pub ipcent: Option<u64>,
}

impl SpaceUsage {
    /// 没有统计数据的条目
    pub fn unavailable(volume: impl Into<String>, status: VolumeStatus) -> Self {
        Self {
            volume: volume.into(),
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn has_stats(&self) -> bool {
        self.size.is_some()
    }
}

/// 异地复制同步时间（stime 扩展属性）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stime {
    pub secs: u32,
    pub nsecs: u32,
}

impl Stime {
    pub fn new(secs: u32, nsecs: u32) -> Self {
        Self { secs, nsecs }
    }

    /// 以浮点秒表示
    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.secs) + f64::from(self.nsecs) / 1_000_000_000.0
    }
}

/// 检查点检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointStatus {
    pub last_synced_time: String,
    pub target_time: String,
    pub completed: bool,
}
