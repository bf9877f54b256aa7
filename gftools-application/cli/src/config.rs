//! CLI 配置管理
//!
//! **数据存储方式**: TOML 文件 (~/.config/gftools/config.toml)
//!
//! ```toml
//! gluster_bin = "/usr/sbin/gluster"
//! command_timeout = "30s"
//!
//! [remote]
//! host = "gluster-node1"
//! username = "root"
//! key_path = "~/.ssh/id_ed25519"
//!
//! [mounts]
//! gv0 = "/mnt/gv0"
//! ```

use anyhow::{Context, Result};
use gftools_executor::{AuthMethod, ExecConfig, ExecTarget, SshTarget};
use gftools_gluster::{DEFAULT_GETFATTR_BIN, DEFAULT_GLUSTER_BIN};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// gluster 命令路径
    #[serde(default = "default_gluster_bin")]
    pub gluster_bin: String,

    /// getfattr 命令路径
    #[serde(default = "default_getfattr_bin")]
    pub getfattr_bin: String,

    /// 命令执行超时
    #[serde(with = "humantime_serde", default = "default_command_timeout")]
    pub command_timeout: Duration,

    /// 远程 Gluster 节点（不配置则在本机执行）
    pub remote: Option<RemoteConfig>,

    /// 卷名 -> 挂载点（df 优先使用）
    #[serde(default)]
    pub mounts: HashMap<String, String>,
}

/// 远程节点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// 主机地址
    pub host: String,

    /// SSH 端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// SSH 用户名
    #[serde(default = "default_username")]
    pub username: String,

    /// SSH 密码（不建议，优先使用密钥认证）
    pub password: Option<String>,

    /// SSH 私钥路径
    pub key_path: Option<String>,
}

fn default_gluster_bin() -> String {
    DEFAULT_GLUSTER_BIN.to_string()
}

fn default_getfattr_bin() -> String {
    DEFAULT_GETFATTR_BIN.to_string()
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_port() -> u16 {
    22
}

fn default_username() -> String {
    "root".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            gluster_bin: default_gluster_bin(),
            getfattr_bin: default_getfattr_bin(),
            command_timeout: default_command_timeout(),
            remote: None,
            mounts: HashMap::new(),
        }
    }
}

impl RemoteConfig {
    /// 只指定主机地址的远程配置
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: default_username(),
            password: None,
            key_path: None,
        }
    }

    /// 认证方式：密码 > 私钥 > 默认密钥
    pub fn auth(&self) -> AuthMethod {
        if let Some(password) = &self.password {
            return AuthMethod::Password(password.clone());
        }

        match &self.key_path {
            Some(key) => AuthMethod::Key {
                key_path: PathBuf::from(shellexpand::tilde(key).as_ref()),
            },
            None => AuthMethod::DefaultKey,
        }
    }
}

impl CliConfig {
    /// 获取默认配置文件路径
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("无法获取用户主目录")?;
        Ok(home.join(".config").join("gftools").join("config.toml"))
    }

    /// 加载配置
    ///
    /// 指定的配置文件必须存在；默认配置文件不存在时使用默认值
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                let path = PathBuf::from(shellexpand::tilde(p).as_ref());
                if !path.exists() {
                    anyhow::bail!("配置文件不存在: {:?}", path);
                }
                path
            }
            None => {
                let path = Self::config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        Self::load_file(&path)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;

        Self::parse(&content).with_context(|| format!("解析配置文件失败: {:?}", path))
    }

    /// 解析 TOML 配置
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 生成执行器配置
    ///
    /// `host` 覆盖（或启用）远程节点，其余 SSH 设置沿用配置文件
    pub fn exec_config(&self, host: Option<&str>) -> ExecConfig {
        let remote = match (host, &self.remote) {
            (Some(host), Some(remote)) => Some(RemoteConfig {
                host: host.to_string(),
                ..remote.clone()
            }),
            (Some(host), None) => Some(RemoteConfig::with_host(host)),
            (None, remote) => remote.clone(),
        };

        let target = match remote {
            Some(remote) => ExecTarget::Ssh(SshTarget {
                auth: remote.auth(),
                host: remote.host,
                port: remote.port,
                username: remote.username,
            }),
            None => ExecTarget::Local,
        };

        ExecConfig {
            target,
            ..ExecConfig::local().command_timeout(self.command_timeout)
        }
    }

    /// 展开 `~` 后的卷挂载点映射
    pub fn mount_points(&self) -> HashMap<String, String> {
        self.mounts
            .iter()
            .map(|(vol, path)| (vol.clone(), shellexpand::tilde(path).into_owned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.gluster_bin, "gluster");
        assert_eq!(config.getfattr_bin, "getfattr");
        assert_eq!(config.command_timeout, Duration::from_secs(60));
        assert!(config.remote.is_none());
        assert!(!config.exec_config(None).is_remote());
    }

    #[test]
    fn test_parse_config() {
        let config = CliConfig::parse(
            r#"
gluster_bin = "/usr/sbin/gluster"
command_timeout = "2m"

[remote]
host = "node1"
port = 2222
key_path = "/root/.ssh/id_ed25519"

[mounts]
gv0 = "/mnt/gv0"
"#,
        )
        .unwrap();

        assert_eq!(config.gluster_bin, "/usr/sbin/gluster");
        assert_eq!(config.getfattr_bin, "getfattr");
        assert_eq!(config.command_timeout, Duration::from_secs(120));
        assert_eq!(config.mount_points().get("gv0").map(String::as_str), Some("/mnt/gv0"));

        let exec = config.exec_config(None);
        assert_eq!(exec.command_timeout, Duration::from_secs(120));
        match exec.target {
            ExecTarget::Ssh(target) => {
                assert_eq!(target.address(), "node1:2222");
                assert_eq!(target.username, "root");
                assert!(matches!(target.auth, AuthMethod::Key { .. }));
            }
            ExecTarget::Local => panic!("应为 SSH 目标"),
        }
    }

    #[test]
    fn test_host_override() {
        let mut config = CliConfig::default();
        match config.exec_config(Some("node2")).target {
            ExecTarget::Ssh(target) => {
                assert_eq!(target.destination(), "root@node2");
                assert_eq!(target.auth, AuthMethod::DefaultKey);
            }
            ExecTarget::Local => panic!("应为 SSH 目标"),
        }

        // 覆盖主机时保留配置文件中的认证方式
        let mut remote = RemoteConfig::with_host("node1");
        remote.password = Some("secret".to_string());
        config.remote = Some(remote);

        match config.exec_config(Some("node3")).target {
            ExecTarget::Ssh(target) => {
                assert_eq!(target.host, "node3");
                assert_eq!(target.auth, AuthMethod::Password("secret".to_string()));
            }
            ExecTarget::Local => panic!("应为 SSH 目标"),
        }
    }

    #[test]
    fn test_invalid_config() {
        assert!(CliConfig::parse("command_timeout = \"soon\"").is_err());
        assert!(CliConfig::parse("[remote]\nport = 22").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "getfattr_bin = \"/usr/bin/getfattr\"").unwrap();

        let config = CliConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.getfattr_bin, "/usr/bin/getfattr");
    }

    #[test]
    fn test_load_missing_explicit_file() {
        assert!(CliConfig::load(Some("/nonexistent/gftools.toml")).is_err());
    }
}
