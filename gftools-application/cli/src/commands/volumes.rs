//! 卷信息命令

use anyhow::Result;
use colored::Color;
use gftools_gluster::{GlusterVolume, VolumeStatus};
use tracing::info;

use super::common::AppContext;
use super::output::{format_header, format_row, print_json, print_text, Cell, Column, TableRow};

/// 卷表格的显示选项
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeLayout {
    pub show_detail: bool,
    pub show_bricks: bool,
    pub show_options: bool,
}

const UUID: Column = Column::new("UUID", 36);
const NAME: Column = Column::new("NAME", 20);
const STATUS: Column = Column::new("STATUS", 6);
const TYPE: Column = Column::new("TYPE", 15);
const NUM_BRICKS: Column = Column::new("NUM_BRICKS", 10);
const TRANSPORT: Column = Column::new("TRANSPORT", 10);
const REPLICA: Column = Column::new("REPLICA", 7);
const DISTRIBUTE: Column = Column::new("DISTRIBUTE", 10);
const STRIPE: Column = Column::new("STRIPE", 6);

impl TableRow for GlusterVolume {
    type Layout = VolumeLayout;

    fn columns(layout: &VolumeLayout) -> Vec<Column> {
        let mut columns = vec![UUID, NAME, STATUS, TYPE, NUM_BRICKS];
        if layout.show_detail {
            columns.extend([TRANSPORT, REPLICA, DISTRIBUTE, STRIPE]);
        }
        columns
    }

    fn row(&self, layout: &VolumeLayout) -> Vec<Cell> {
        let status_color = match self.status {
            VolumeStatus::Up => Color::Green,
            VolumeStatus::Down => Color::Red,
        };

        let mut cells = vec![
            Cell::from(self.uuid.as_str()),
            Cell::from(self.name.as_str()),
            Cell::colored(self.status.as_str(), status_color),
            Cell::from(self.volume_type.as_str()),
            Cell::from(self.num_bricks.to_string()),
        ];

        if layout.show_detail {
            cells.extend([
                Cell::from(self.transport.as_str()),
                Cell::from(self.replica.to_string()),
                Cell::from(self.distribute.to_string()),
                Cell::from(self.stripe.to_string()),
            ]);
        }
        cells
    }
}

/// 渲染卷表格，可附带每个卷的 brick 和选项列表
pub fn render_volumes(volumes: &[GlusterVolume], layout: &VolumeLayout) -> String {
    if volumes.is_empty() {
        return String::new();
    }

    let columns = GlusterVolume::columns(layout);
    let mut out = format_header(&columns);

    for vol in volumes {
        out.push_str(&format_row(&columns, &vol.row(layout)));

        if layout.show_bricks {
            out.push_str("Bricks:\n---------\n");
            for (n, brick) in vol.bricks.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", n + 1, brick));
            }
            out.push('\n');
        }

        if layout.show_options {
            out.push_str("Options:\n---------\n");
            for opt in &vol.options {
                out.push_str(&format!("{}: {}\n", opt.name, opt.value));
            }
            out.push('\n');
        }
    }

    out
}

pub async fn handle(args: crate::VolumesArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.client();

    if args.list_filters {
        for name in client.filter_registry().names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let filters = args.filters.to_filters();
    info!("查询卷: {} 个过滤器", filters.len());

    let volumes = client.search(&filters).await?;

    if args.json {
        return print_json(&volumes);
    }

    let layout = VolumeLayout {
        show_detail: args.show_detail,
        show_bricks: args.show_bricks,
        show_options: args.show_options,
    };
    print_text(&render_volumes(&volumes, &layout));

    Ok(())
}
