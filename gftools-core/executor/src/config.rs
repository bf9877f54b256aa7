//! 执行器配置

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// SSH 认证方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// 密码认证（依赖 sshpass）
    Password(String),
    /// 私钥认证（私钥不能带密码短语）
    Key {
        /// 私钥路径
        key_path: PathBuf,
    },
    /// 使用默认密钥（~/.ssh/id_rsa, ~/.ssh/id_ed25519 等）
    DefaultKey,
}

/// 远程 SSH 目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshTarget {
    /// 主机地址
    pub host: String,
    /// 端口（默认 22）
    #[serde(default = "default_port")]
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 认证方式
    pub auth: AuthMethod,
}

impl SshTarget {
    /// 获取 SSH 地址字符串（host:port 格式）
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// ssh 命令使用的 user@host 形式
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// 命令执行位置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecTarget {
    /// 本机执行
    #[default]
    Local,
    /// 通过 SSH 在远程节点执行
    Ssh(SshTarget),
}

/// 执行器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// 执行位置
    #[serde(default)]
    pub target: ExecTarget,
    /// SSH 连接超时
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// 命令执行超时
    #[serde(with = "humantime_serde", default = "default_command_timeout")]
    pub command_timeout: Duration,
}

fn default_port() -> u16 {
    22
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl ExecConfig {
    /// 本机执行配置
    pub fn local() -> Self {
        Self {
            target: ExecTarget::Local,
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
        }
    }

    /// 使用密码认证的远程执行配置
    ///
    /// # Arguments
    /// * `host` - 主机地址
    /// * `username` - 用户名
    /// * `password` - 密码
    pub fn ssh_with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::ssh(host, username, AuthMethod::Password(password.into()))
    }

    /// 使用密钥认证的远程执行配置
    ///
    /// # Arguments
    /// * `host` - 主机地址
    /// * `username` - 用户名
    /// * `key_path` - 私钥路径
    pub fn ssh_with_key(
        host: impl Into<String>,
        username: impl Into<String>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        Self::ssh(
            host,
            username,
            AuthMethod::Key {
                key_path: key_path.into(),
            },
        )
    }

    /// 使用默认密钥的远程执行配置
    pub fn ssh_with_default_key(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self::ssh(host, username, AuthMethod::DefaultKey)
    }

    fn ssh(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            target: ExecTarget::Ssh(SshTarget {
                host: host.into(),
                port: default_port(),
                username: username.into(),
                auth,
            }),
            ..Self::local()
        }
    }

    /// 设置 SSH 端口（本机执行时忽略）
    pub fn port(mut self, port: u16) -> Self {
        if let ExecTarget::Ssh(ref mut target) = self.target {
            target.port = port;
        }
        self
    }

    /// 设置连接超时
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 设置命令执行超时
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// 是否在远程节点执行
    pub fn is_remote(&self) -> bool {
        matches!(self.target, ExecTarget::Ssh(_))
    }
}
