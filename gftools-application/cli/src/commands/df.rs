//! 卷空间统计命令（类似 df）

use anyhow::{Context, Result};
use gftools_gluster::space::{
    collect_usage, grand_total, MountTable, NixStatvfs, SizeFormat, PROC_MOUNTS,
};
use gftools_gluster::SpaceUsage;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::common::AppContext;
use super::output::{print_json, print_text, render_table, Cell, Column, TableRow};

/// 可显示的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfField {
    Volume,
    Size,
    Used,
    Avail,
    Pcent,
    Itotal,
    Iused,
    Iavail,
    Ipcent,
    Status,
}

impl DfField {
    const ALL: [DfField; 10] = [
        DfField::Volume,
        DfField::Size,
        DfField::Used,
        DfField::Avail,
        DfField::Pcent,
        DfField::Itotal,
        DfField::Iused,
        DfField::Iavail,
        DfField::Ipcent,
        DfField::Status,
    ];

    /// 默认字段
    pub const BLOCKS: [DfField; 6] = [
        DfField::Volume,
        DfField::Size,
        DfField::Used,
        DfField::Avail,
        DfField::Pcent,
        DfField::Status,
    ];

    /// `-i` 时的字段
    pub const INODES: [DfField; 6] = [
        DfField::Volume,
        DfField::Itotal,
        DfField::Iused,
        DfField::Iavail,
        DfField::Ipcent,
        DfField::Status,
    ];

    /// `--fields` 和 JSON 中使用的键
    pub fn key(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Size => "size",
            Self::Used => "used",
            Self::Avail => "avail",
            Self::Pcent => "pcent",
            Self::Itotal => "itotal",
            Self::Iused => "iused",
            Self::Iavail => "iavail",
            Self::Ipcent => "ipcent",
            Self::Status => "status",
        }
    }

    pub fn column(&self) -> Column {
        match self {
            Self::Volume => Column::new("Volume", 25),
            Self::Size => Column::new("Size", 20),
            Self::Used => Column::new("Used", 20),
            Self::Avail => Column::new("Avail", 20),
            Self::Pcent => Column::new("Use%", 10),
            Self::Itotal => Column::new("Inodes", 20),
            Self::Iused => Column::new("IUsed", 20),
            Self::Iavail => Column::new("IFree", 20),
            Self::Ipcent => Column::new("IUse%", 10),
            Self::Status => Column::new("Status", 10),
        }
    }

    /// 解析逗号分隔的字段列表
    pub fn parse_list(value: &str) -> Result<Vec<DfField>> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|key| {
                Self::ALL
                    .into_iter()
                    .find(|f| f.key() == key)
                    .with_context(|| format!("未知的字段: {}", key))
            })
            .collect()
    }
}

/// df 表格的显示选项
#[derive(Debug, Clone)]
pub struct DfLayout {
    pub fields: Vec<DfField>,
    pub format: SizeFormat,
}

impl DfLayout {
    /// 单元格文本；没有统计数据时为 `-`
    pub fn value(&self, usage: &SpaceUsage, field: DfField) -> String {
        let bytes = |v: Option<u64>| v.map(|n| self.format.format(n));
        // inode 数不按块大小缩放，只在人类可读模式下换算
        let count = |v: Option<u64>| {
            v.map(|n| match self.format {
                SizeFormat::Human(_) => self.format.format(n),
                SizeFormat::Blocks(_) => n.to_string(),
            })
        };
        let pcent = |v: Option<u64>| v.map(|n| format!("{}%", n));

        let text = match field {
            DfField::Volume => Some(usage.volume.clone()),
            DfField::Size => bytes(usage.size),
            DfField::Used => bytes(usage.used),
            DfField::Avail => bytes(usage.avail),
            DfField::Pcent => pcent(usage.pcent),
            DfField::Itotal => count(usage.itotal),
            DfField::Iused => count(usage.iused),
            DfField::Iavail => count(usage.iavail),
            DfField::Ipcent => pcent(usage.ipcent),
            DfField::Status => usage.status.map(|s| s.to_string()),
        };

        text.unwrap_or_else(|| "-".to_string())
    }

    /// JSON 对象，字段与表格一致
    pub fn json_row(&self, usage: &SpaceUsage) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.key().to_string(), Value::String(self.value(usage, *f))))
            .collect();
        Value::Object(map)
    }
}

impl TableRow for SpaceUsage {
    type Layout = DfLayout;

    fn columns(layout: &DfLayout) -> Vec<Column> {
        layout.fields.iter().map(DfField::column).collect()
    }

    fn row(&self, layout: &DfLayout) -> Vec<Cell> {
        layout
            .fields
            .iter()
            .map(|f| Cell::from(layout.value(self, *f)))
            .collect()
    }
}

/// 由命令行参数确定数值格式：指定块大小时不使用人类可读格式
pub fn size_format(args: &crate::DfArgs) -> Result<SizeFormat> {
    if let Some(block_size) = &args.block_size {
        return Ok(SizeFormat::parse_block_size(block_size)?);
    }
    if args.kilo {
        return Ok(SizeFormat::Blocks(1024));
    }
    if args.si {
        return Ok(SizeFormat::Human(1000));
    }
    if args.human_readable {
        return Ok(SizeFormat::Human(1024));
    }
    Ok(SizeFormat::default())
}

fn layout(args: &crate::DfArgs) -> Result<DfLayout> {
    let fields = match &args.fields {
        Some(fields) => DfField::parse_list(fields)?,
        None if args.inodes => DfField::INODES.to_vec(),
        None => DfField::BLOCKS.to_vec(),
    };

    if fields.is_empty() {
        anyhow::bail!("--fields 不能为空");
    }

    Ok(DfLayout {
        fields,
        format: size_format(args)?,
    })
}

pub async fn handle(args: crate::DfArgs, ctx: &AppContext) -> Result<()> {
    // 先校验显示参数，避免无意义的 gluster 调用
    let layout = layout(&args)?;

    let filters = args.filters.to_filters();
    let volumes = ctx.client().search(&filters).await?;

    if ctx.is_remote() {
        warn!("空间统计使用本机的 glusterfs 挂载点，远程节点只用于查询卷信息");
    }

    let mounts = MountTable::load(PROC_MOUNTS).unwrap_or_else(|e| {
        warn!("{}，只使用配置文件中的挂载点", e);
        MountTable::default()
    });

    let mut usages = collect_usage(&volumes, &ctx.config.mount_points(), &mounts, &NixStatvfs)?;
    info!("统计了 {} 个卷", usages.len());

    if args.total && !usages.is_empty() {
        let total = grand_total(&usages);
        usages.push(total);
    }

    if args.json {
        let rows: Vec<Value> = usages.iter().map(|u| layout.json_row(u)).collect();
        return print_json(&rows);
    }

    print_text(&render_table(&usages, &layout));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gftools_gluster::space::{compute_usage, FsStats};
    use gftools_gluster::VolumeStatus;

    fn usage() -> SpaceUsage {
        let stats = FsStats {
            frsize: 4096,
            blocks: 262_144,
            bfree: 131_072,
            bavail: 131_072,
            files: 1000,
            ffree: 400,
            favail: 400,
        };
        compute_usage("gv0", VolumeStatus::Up, "/mnt/gv0", &stats)
    }

    fn blocks_layout(format: SizeFormat) -> DfLayout {
        DfLayout {
            fields: DfField::BLOCKS.to_vec(),
            format,
        }
    }

    #[test]
    fn test_values() {
        let layout = blocks_layout(SizeFormat::default());
        let usage = usage();

        assert_eq!(layout.value(&usage, DfField::Size), "1073741824");
        assert_eq!(layout.value(&usage, DfField::Pcent), "50%");
        assert_eq!(layout.value(&usage, DfField::Status), "UP");
        assert_eq!(layout.value(&usage, DfField::Iused), "600");

        let human = blocks_layout(SizeFormat::Human(1024));
        assert_eq!(human.value(&usage, DfField::Size), "1.0G");
        assert_eq!(human.value(&usage, DfField::Used), "512.0M");

        let kilo = blocks_layout(SizeFormat::Blocks(1024));
        assert_eq!(kilo.value(&usage, DfField::Avail), "524288");
        // inode 不按块大小缩放
        assert_eq!(kilo.value(&usage, DfField::Itotal), "1000");
    }

    #[test]
    fn test_unavailable_volume() {
        let layout = blocks_layout(SizeFormat::Human(1024));
        let down = SpaceUsage::unavailable("gv1", VolumeStatus::Down);

        let row = down.row(&layout);
        let texts: Vec<&str> = row.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["gv1", "-", "-", "-", "-", "DOWN"]);
    }

    #[test]
    fn test_total_row_status() {
        let layout = blocks_layout(SizeFormat::default());
        let total = grand_total(&[usage()]);
        assert_eq!(layout.value(&total, DfField::Volume), "total");
        assert_eq!(layout.value(&total, DfField::Status), "-");
        assert_eq!(layout.value(&total, DfField::Pcent), "50%");
    }

    #[test]
    fn test_render_table() {
        colored::control::set_override(false);

        let layout = DfLayout {
            fields: DfField::INODES.to_vec(),
            format: SizeFormat::default(),
        };
        let out = render_table(&[usage()], &layout);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[0],
            format!(
                "{:>25} {:>20} {:>20} {:>20} {:>10} {:>10}",
                "Volume", "Inodes", "IUsed", "IFree", "IUse%", "Status"
            )
        );
        assert_eq!(
            lines[2],
            format!(
                "{:>25} {:>20} {:>20} {:>20} {:>10} {:>10}",
                "gv0", 1000, 600, 400, "60%", "UP"
            )
        );
    }

    #[test]
    fn test_json_row_has_table_fields() {
        let layout = blocks_layout(SizeFormat::Human(1000));
        let json = layout.json_row(&usage());

        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        assert_eq!(obj["volume"], "gv0");
        assert_eq!(obj["size"], "1.1G");
        assert_eq!(obj["pcent"], "50%");
        assert_eq!(obj["status"], "UP");
    }

    #[test]
    fn test_parse_fields() {
        assert_eq!(
            DfField::parse_list("volume, pcent,status").unwrap(),
            vec![DfField::Volume, DfField::Pcent, DfField::Status]
        );
        assert!(DfField::parse_list("volume,mount").is_err());
    }
}
