//! 卷选项命令

use anyhow::{Context, Result};
use gftools_gluster::OptionInfo;
use regex::Regex;
use tracing::info;

use super::common::AppContext;
use super::output::{print_json, print_text};

/// 按选项名过滤（正则搜索）
pub fn filter_options(options: Vec<OptionInfo>, pattern: Option<&str>) -> Result<Vec<OptionInfo>> {
    let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
        return Ok(options);
    };

    let re = Regex::new(pattern).with_context(|| format!("无效的选项过滤正则: {:?}", pattern))?;
    Ok(options.into_iter().filter(|o| re.is_match(&o.name)).collect())
}

/// 每行一个选项：名称右对齐 40 列，可附带说明
pub fn render_options(options: &[OptionInfo], show_desc: bool) -> String {
    options
        .iter()
        .map(|o| {
            if show_desc {
                format!("{:>40} {:>10} {}\n", o.name, o.value, o.description)
            } else {
                format!("{:>40} {}\n", o.name, o.value)
            }
        })
        .collect()
}

pub async fn handle(args: crate::OptionsArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.client();

    let options = match args.volume.as_deref() {
        Some(volume) => {
            info!("获取卷 {} 的选项", volume);
            client.volume_options(volume).await?
        }
        None => client.default_options().await?,
    };

    let options = filter_options(options, args.option.as_deref())?;

    if args.json {
        return print_json(&options);
    }

    print_text(&render_options(&options, args.show_desc));
    Ok(())
}
