//! gftools 命令执行器
//!
//! 为 gluster 管理命令提供统一的执行入口，支持：
//! - 本机直接执行
//! - 通过系统 ssh/sshpass 在远程 Gluster 节点执行
//! - 输出捕获、退出码检查与超时控制
//!
//! # 示例
//!
//! ```ignore
//! use gftools_executor::{CommandRunner, ExecConfig, Executor};
//!
//! // 本机执行
//! let executor = Executor::new(ExecConfig::local());
//! let output = executor.run("gluster", &["volume".into(), "info".into(), "--xml".into()]).await?;
//! println!("{}", output.stdout);
//!
//! // 在远程节点执行
//! let executor = Executor::new(ExecConfig::ssh_with_default_key("gluster-node", "root"));
//! let output = executor.run_checked("gluster", &["volume".into(), "list".into()]).await?;
//! ```

mod config;
mod error;
mod runner;

pub use config::{AuthMethod, ExecConfig, ExecTarget, SshTarget};
pub use error::{ExecError, Result};
pub use runner::{shell_quote, CommandOutput, CommandRunner, Executor};
