//! 命令执行实现
//!
//! 本机直接启动进程；远程执行使用系统 ssh/sshpass 命令

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::{AuthMethod, ExecConfig, ExecTarget, SshTarget};
use crate::error::{ExecError, Result};

/// 命令执行输出
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
    /// 退出码（被信号终止时为 None）
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// 检查命令是否成功执行
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 获取合并的输出（stdout + stderr）
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// 失败时最有用的错误描述：优先 stderr
    pub fn error_message(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// 外部命令执行接口
///
/// Gluster 客户端只依赖此 trait，测试中可替换为返回固定输出的实现
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// 执行命令并捕获输出，不检查退出码
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// 执行命令并检查是否成功
    async fn run_checked(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = self.run(program, args).await?;

        if !output.is_success() {
            return Err(ExecError::NonZeroExit {
                exit_code: output.exit_code,
                message: output.error_message().to_string(),
            });
        }

        Ok(output)
    }
}

/// 命令执行器（本机或系统 ssh 命令）
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecConfig,
}

impl Executor {
    /// 创建执行器
    pub fn new(config: ExecConfig) -> Self {
        if let ExecTarget::Ssh(target) = &config.target {
            info!("使用远程节点执行: {}", target.address());
        }
        Self { config }
    }

    /// 获取配置
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// 构造实际要启动的进程
    fn build_command(&self, program: &str, args: &[String]) -> Result<Command> {
        let cmd = match &self.config.target {
            ExecTarget::Local => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            ExecTarget::Ssh(target) => self.build_ssh_command(target, program, args)?,
        };
        Ok(cmd)
    }

    fn build_ssh_command(&self, target: &SshTarget, program: &str, args: &[String]) -> Result<Command> {
        let mut cmd = match &target.auth {
            AuthMethod::Password(password) => {
                // 使用 sshpass 进行密码认证
                let mut cmd = Command::new("sshpass");
                cmd.arg("-p").arg(password);
                cmd.arg("ssh");
                cmd
            }
            AuthMethod::Key { key_path } => {
                let mut cmd = Command::new("ssh");
                cmd.arg("-i").arg(expand_path(key_path)?);
                cmd
            }
            AuthMethod::DefaultKey => Command::new("ssh"),
        };

        let remote_command = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ");

        // 通用 SSH 参数
        cmd.arg("-o").arg("StrictHostKeyChecking=no")
            .arg("-o").arg("UserKnownHostsFile=/dev/null")
            .arg("-o").arg("LogLevel=ERROR")
            .arg("-o").arg(format!("ConnectTimeout={}", self.config.connect_timeout.as_secs()))
            .arg("-o").arg("NumberOfPasswordPrompts=1")
            .arg("-p").arg(target.port.to_string())
            .arg(target.destination())
            .arg(remote_command);

        Ok(cmd)
    }

    async fn run_internal(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let mut cmd = self.build_command(program, args)?;

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| ExecError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

        let output = child.wait_with_output().await?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
        };

        // 检查是否是认证失败
        if self.config.is_remote()
            && (result.exit_code == Some(5) || result.exit_code == Some(255))
            && (result.stderr.contains("Permission denied")
                || result.stderr.contains("Authentication failed"))
        {
            return Err(ExecError::Authentication(result.stderr));
        }

        debug!(
            "命令执行完成, 退出码: {:?}, stdout 长度: {}, stderr 长度: {}",
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}

#[async_trait]
impl CommandRunner for Executor {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("执行命令: {} {}", program, args.join(" "));

        timeout(self.config.command_timeout, self.run_internal(program, args))
            .await
            .map_err(|_| ExecError::Timeout(format!("{} {}", program, args.join(" "))))?
    }
}

/// 为远程 shell 引用单个参数
pub fn shell_quote(arg: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "_-./:=@,+%".contains(c);

    if !arg.is_empty() && arg.chars().all(is_safe) {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// 展开路径（处理 ~ 等）
fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix('~') {
        let home = dirs::home_dir()
            .ok_or_else(|| ExecError::Config("无法获取用户主目录".to_string()))?;
        return Ok(PathBuf::from(format!("{}{}", home.to_string_lossy(), rest)));
    }
    Ok(path.to_path_buf())
}
