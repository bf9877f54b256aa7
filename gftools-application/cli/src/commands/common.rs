//! 公共工具函数模块
//!
//! 提供各命令模块共享的功能，包括：
//! - 加载配置并创建 Gluster 客户端
//! - 将过滤参数转换为有序的过滤器列表

use std::sync::Arc;

use anyhow::Result;
use gftools_executor::Executor;
use gftools_gluster::GlusterClient;
use tracing::debug;

use crate::config::CliConfig;
use crate::FilterArgs;

/// 命令运行上下文
pub struct AppContext {
    pub config: CliConfig,
    /// 命令行指定的远程节点
    pub host: Option<String>,
}

impl AppContext {
    /// 加载配置文件
    pub fn load(config_path: Option<&str>, host: Option<String>) -> Result<Self> {
        let config = CliConfig::load(config_path)?;
        debug!("配置: {:?}", config);
        Ok(Self { config, host })
    }

    /// 创建 Gluster 客户端
    pub fn client(&self) -> GlusterClient {
        let executor = Executor::new(self.config.exec_config(self.host.as_deref()));

        GlusterClient::new(Arc::new(executor))
            .gluster_bin(&self.config.gluster_bin)
            .getfattr_bin(&self.config.getfattr_bin)
    }

    /// 是否在远程节点执行
    pub fn is_remote(&self) -> bool {
        self.host.is_some() || self.config.remote.is_some()
    }
}

/// 解析 `NAME=VALUE` 形式的过滤参数
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("无效的过滤参数 {:?}，应为 NAME=VALUE", s))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("过滤参数 {:?} 缺少过滤器名", s));
    }

    Ok((key.to_string(), value.to_string()))
}

impl FilterArgs {
    /// 按固定顺序生成过滤器列表，`--filter` 追加在末尾
    pub fn to_filters(&self) -> Vec<(String, String)> {
        let named = [
            ("name", &self.name),
            ("status", &self.status),
            ("type", &self.volume_type),
            ("volumewithbrick", &self.volumewithbrick),
            ("transport", &self.transport),
        ];

        named
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
            .chain(self.extra.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("name=gv0").unwrap(),
            ("name".to_string(), "gv0".to_string())
        );
        // 只按第一个 = 切分
        assert_eq!(
            parse_key_value("name=a=b").unwrap(),
            ("name".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_key_value("status=").unwrap().1, "");
        assert!(parse_key_value("status").is_err());
        assert!(parse_key_value("=up").is_err());
    }

    #[test]
    fn test_to_filters_order() {
        let args = FilterArgs {
            transport: Some("tcp".to_string()),
            name: Some("gv".to_string()),
            extra: vec![("replica".to_string(), "3".to_string())],
            ..Default::default()
        };

        assert_eq!(
            args.to_filters(),
            vec![
                ("name".to_string(), "gv".to_string()),
                ("transport".to_string(), "tcp".to_string()),
                ("replica".to_string(), "3".to_string()),
            ]
        );
        assert!(FilterArgs::default().to_filters().is_empty());
    }

    #[test]
    fn test_client_uses_local_executor_by_default() {
        let ctx = AppContext {
            config: CliConfig::default(),
            host: None,
        };
        assert!(!ctx.is_remote());
        let _client = ctx.client();

        let remote = AppContext {
            config: CliConfig::default(),
            host: Some("node1".to_string()),
        };
        assert!(remote.is_remote());
    }
}
