//! CLI 通用输出格式化模块
//!
//! 固定宽度、右对齐的表格输出，以及 JSON 输出

use anyhow::Result;
use colored::{Color, Colorize};
use serde::Serialize;

/// 表格列：标题与宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub title: &'static str,
    pub width: usize,
}

impl Column {
    pub const fn new(title: &'static str, width: usize) -> Self {
        Self { title, width }
    }
}

/// 单元格（可选颜色，在补齐宽度之后着色）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub color: Option<Color>,
}

impl Cell {
    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self { text, color: None }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

/// 可输出为表格行的数据 trait
pub trait TableRow {
    /// 影响列集合与取值方式的显示选项
    type Layout;

    /// 返回表格列
    fn columns(layout: &Self::Layout) -> Vec<Column>;

    /// 返回该项的表格行数据（与 columns 一一对应）
    fn row(&self, layout: &Self::Layout) -> Vec<Cell>;
}

/// 表头和等长的分隔线
pub fn format_header(columns: &[Column]) -> String {
    let header = columns
        .iter()
        .map(|c| format!("{:>width$}", c.title, width = c.width))
        .collect::<Vec<_>>()
        .join(" ");
    let rule = "-".repeat(header.chars().count());
    format!("{}\n{}\n", header, rule)
}

/// 一行数据（右对齐，超出宽度的值不截断）
pub fn format_row(columns: &[Column], cells: &[Cell]) -> String {
    let line = columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| {
            let padded = format!("{:>width$}", cell.text, width = column.width);
            match cell.color {
                Some(color) => padded.color(color).to_string(),
                None => padded,
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}\n", line)
}

/// 完整表格；没有数据时返回空字符串
pub fn render_table<T: TableRow>(items: &[T], layout: &T::Layout) -> String {
    if items.is_empty() {
        return String::new();
    }

    let columns = T::columns(layout);
    let mut out = format_header(&columns);
    for item in items {
        out.push_str(&format_row(&columns, &item.row(layout)));
    }
    out
}

/// JSON 格式输出（单个文档）
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// 空输出时不打印多余的空行
pub fn print_text(text: &str) {
    if !text.is_empty() {
        print!("{}", text);
    }
}
