//! 卷空间统计
//!
//! 通过已挂载的 glusterfs 客户端获取卷的空间和 inode 使用情况：
//! 1. 查找卷的挂载点（配置优先，其次 /proc/mounts 中的 fuse.glusterfs 条目）
//! 2. 对挂载点执行 statvfs
//! 3. 按 df 的方式计算 size/used/avail/pcent 以及 inode 对应值

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{GlusterError, Result};
use crate::models::{GlusterVolume, SpaceUsage, VolumeStatus};

/// 默认挂载表路径
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// glusterfs 客户端挂载的文件系统类型
pub const GLUSTERFS_FSTYPE: &str = "fuse.glusterfs";

/// 大小单位符号
const SYMBOLS: [char; 8] = ['K', 'M', 'G', 'T', 'P', 'E', 'Z', 'Y'];

/// 挂载表条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// 挂载源（glusterfs 为 host:/volume）
    pub source: String,
    pub mount_point: String,
    pub fs_type: String,
}

/// 挂载表
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// 解析 /proc/mounts 格式的内容
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                Some(MountEntry {
                    source: unescape_mount_field(parts.next()?),
                    mount_point: unescape_mount_field(parts.next()?),
                    fs_type: parts.next()?.to_string(),
                })
            })
            .collect();

        Self { entries }
    }

    /// 读取挂载表文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| GlusterError::Space(format!("读取 {} 失败: {}", path.display(), e)))?;
        Ok(Self::parse(&content))
    }

    pub fn entries(&self) -> &[MountEntry] {
        &self.entries
    }

    /// 查找卷的第一个 glusterfs 挂载点
    ///
    /// 挂载源可能是 `host:/volume` 或 `host:volume`
    pub fn find_volume(&self, volume: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| e.fs_type == GLUSTERFS_FSTYPE)
            .find(|e| {
                e.source
                    .split_once(':')
                    .is_some_and(|(_, vol)| vol.trim_start_matches('/') == volume)
            })
            .map(|e| e.mount_point.as_str())
    }
}

/// 还原 /proc/mounts 中的八进制转义（如空格为 `\040`）
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let code = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(byte) = u8::try_from(code) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// statvfs 原始数据（块数以 frsize 为单位）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsStats {
    pub frsize: u64,
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub favail: u64,
}

/// 文件系统统计接口
///
/// 默认实现为 [`NixStatvfs`]，测试中可替换
pub trait SpaceProbe {
    fn statvfs(&self, path: &Path) -> Result<FsStats>;
}

/// 通过 nix 调用 statvfs(2)
#[derive(Debug, Clone, Copy, Default)]
pub struct NixStatvfs;

impl SpaceProbe for NixStatvfs {
    #[allow(clippy::unnecessary_cast)]
    fn statvfs(&self, path: &Path) -> Result<FsStats> {
        use nix::sys::statvfs::statvfs;

        let stats = statvfs(path)
            .map_err(|e| GlusterError::Space(format!("statvfs {} 失败: {}", path.display(), e)))?;

        // 块计数的单位是 f_frsize
        let frsize = if stats.fragment_size() > 0 {
            stats.fragment_size()
        } else {
            stats.block_size()
        };

        Ok(FsStats {
            frsize: frsize as u64,
            blocks: stats.blocks() as u64,
            bfree: stats.blocks_free() as u64,
            bavail: stats.blocks_available() as u64,
            files: stats.files() as u64,
            ffree: stats.files_free() as u64,
            favail: stats.files_available() as u64,
        })
    }
}

fn percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        part.saturating_mul(100) / total
    }
}

/// 由 statvfs 数据计算空间使用情况
pub fn compute_usage(volume: &str, status: VolumeStatus, mount_point: &str, stats: &FsStats) -> SpaceUsage {
    let reserved = stats.bfree.saturating_sub(stats.bavail);
    let size = stats.blocks.saturating_sub(reserved).saturating_mul(stats.frsize);
    let avail = stats.bavail.saturating_mul(stats.frsize);
    let used = size.saturating_sub(avail);

    let itotal = stats
        .files
        .saturating_sub(stats.ffree.saturating_sub(stats.favail));
    let iavail = stats.favail;
    let iused = itotal.saturating_sub(iavail);

    SpaceUsage {
        volume: volume.to_string(),
        status: Some(status),
        mount_point: Some(mount_point.to_string()),
        size: Some(size),
        used: Some(used),
        avail: Some(avail),
        pcent: Some(percent(used, size)),
        itotal: Some(itotal),
        iused: Some(iused),
        iavail: Some(iavail),
        ipcent: Some(percent(iused, itotal)),
    }
}

/// 统计一组卷的空间使用情况
///
/// # Arguments
/// * `volumes` - 卷列表
/// * `overrides` - 配置中的卷名 -> 挂载点映射（优先于挂载表）
/// * `mounts` - 挂载表
/// * `probe` - statvfs 实现
///
/// DOWN 或未挂载的卷返回没有数值的条目；statvfs 失败则整体失败
pub fn collect_usage(
    volumes: &[GlusterVolume],
    overrides: &HashMap<String, String>,
    mounts: &MountTable,
    probe: &dyn SpaceProbe,
) -> Result<Vec<SpaceUsage>> {
    let mut usages = Vec::with_capacity(volumes.len());

    for vol in volumes {
        if !vol.is_up() {
            usages.push(SpaceUsage::unavailable(&vol.name, vol.status));
            continue;
        }

        let mount_point = overrides
            .get(&vol.name)
            .map(String::as_str)
            .or_else(|| mounts.find_volume(&vol.name));

        let Some(mount_point) = mount_point else {
            warn!("卷 {} 没有找到 glusterfs 挂载点，跳过空间统计", vol.name);
            usages.push(SpaceUsage::unavailable(&vol.name, vol.status));
            continue;
        };

        debug!("卷 {} 挂载点: {}", vol.name, mount_point);
        let stats = probe.statvfs(Path::new(mount_point))?;
        usages.push(compute_usage(&vol.name, vol.status, mount_point, &stats));
    }

    Ok(usages)
}

/// 汇总所有有统计数据的条目（`--total`）
pub fn grand_total(usages: &[SpaceUsage]) -> SpaceUsage {
    let measured: Vec<&SpaceUsage> = usages.iter().filter(|u| u.has_stats()).collect();
    let sum = |field: fn(&SpaceUsage) -> Option<u64>| -> u64 {
        measured.iter().filter_map(|u| field(u)).sum()
    };

    let size = sum(|u| u.size);
    let used = sum(|u| u.used);
    let itotal = sum(|u| u.itotal);
    let iused = sum(|u| u.iused);

    SpaceUsage {
        volume: "total".to_string(),
        status: None,
        mount_point: None,
        size: Some(size),
        used: Some(used),
        avail: Some(sum(|u| u.avail)),
        pcent: Some(percent(used, size)),
        itotal: Some(itotal),
        iused: Some(iused),
        iavail: Some(sum(|u| u.iavail)),
        ipcent: Some(percent(iused, itotal)),
    }
}

/// 数值的显示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeFormat {
    /// 除以块大小后取整（Z/Y 超出 u64 范围）
    Blocks(u128),
    /// 人类可读（基数为 1024 或 1000）
    Human(u64),
}

impl Default for SizeFormat {
    fn default() -> Self {
        Self::Blocks(1)
    }
}

impl SizeFormat {
    /// 解析 `-B SIZE`：可选整数加可选单位（K/M/G/... 为 1024 的幂）
    ///
    /// 如 `1K` = 1024，`M` = 1048576，`512` = 512
    pub fn parse_block_size(value: &str) -> Result<Self> {
        let value = value.trim();
        let invalid = || GlusterError::ParseError(format!("Unknown value for -B: {:?}", value));

        if value.is_empty() {
            return Err(invalid());
        }

        let re = Regex::new(r"^(\d+)?([KMGTPEZY])?$")
            .map_err(|e| GlusterError::ParseError(e.to_string()))?;
        let caps = re.captures(value).ok_or_else(invalid)?;

        let numeric: u128 = match caps.get(1) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => 1,
        };

        let multiplier = match caps.get(2) {
            Some(m) => {
                let power = SYMBOLS
                    .iter()
                    .position(|s| m.as_str().starts_with(*s))
                    .ok_or_else(invalid)? as u32
                    + 1;
                1024u128.checked_pow(power).ok_or_else(invalid)?
            }
            None => 1,
        };

        let size = numeric.checked_mul(multiplier).ok_or_else(invalid)?;
        if size == 0 {
            return Err(invalid());
        }

        Ok(Self::Blocks(size))
    }

    /// 格式化数值
    pub fn format(&self, num: u64) -> String {
        match *self {
            Self::Blocks(size) => (u128::from(num) / size.max(1)).to_string(),
            Self::Human(base) => {
                let base = base as f64;
                let value = num as f64;
                for (idx, symbol) in SYMBOLS.iter().enumerate().rev() {
                    let unit = base.powi(idx as i32 + 1);
                    if value >= unit {
                        return format!("{:.1}{}", value / unit, symbol);
                    }
                }
                num.to_string()
            }
        }
    }
}
