//! Gluster 客户端

use std::sync::Arc;

use gftools_executor::{CommandOutput, CommandRunner};
use tracing::{debug, info};

use crate::error::{GlusterError, Result};
use crate::filters::FilterRegistry;
use crate::models::{GlusterVolume, OptionInfo, Stime};
use crate::parser::{
    extract_op_errstr, merge_volume_options, parse_default_options, parse_stime,
    parse_volume_info, stime_xattr_key,
};

/// 默认的 gluster 命令
pub const DEFAULT_GLUSTER_BIN: &str = "gluster";

/// 默认的 getfattr 命令
pub const DEFAULT_GETFATTR_BIN: &str = "getfattr";

/// Gluster 客户端
///
/// 通过 [`CommandRunner`] 执行 gluster 管理命令，本机或远程节点均可
pub struct GlusterClient {
    runner: Arc<dyn CommandRunner>,
    gluster_bin: String,
    getfattr_bin: String,
    filters: FilterRegistry,
}

impl GlusterClient {
    /// 创建新的 Gluster 客户端
    ///
    /// # Arguments
    /// * `runner` - 命令执行器
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            gluster_bin: DEFAULT_GLUSTER_BIN.to_string(),
            getfattr_bin: DEFAULT_GETFATTR_BIN.to_string(),
            filters: FilterRegistry::default(),
        }
    }

    /// 设置 gluster 命令路径
    pub fn gluster_bin(mut self, bin: impl Into<String>) -> Self {
        self.gluster_bin = bin.into();
        self
    }

    /// 设置 getfattr 命令路径
    pub fn getfattr_bin(mut self, bin: impl Into<String>) -> Self {
        self.getfattr_bin = bin.into();
        self
    }

    /// 替换过滤器注册表
    pub fn filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    pub fn filter_registry(&self) -> &FilterRegistry {
        &self.filters
    }

    async fn gluster(&self, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        debug!("执行: {} {}", self.gluster_bin, args.join(" "));
        Ok(self.runner.run(&self.gluster_bin, &args).await?)
    }

    /// 执行 `gluster volume info [NAME] --xml` 并解析
    ///
    /// # Arguments
    /// * `name` - 卷名，None 表示所有卷
    pub async fn volume_info(&self, name: Option<&str>) -> Result<Vec<GlusterVolume>> {
        info!("获取卷信息: {}", name.unwrap_or("all"));

        let mut args = vec!["volume", "info"];
        if let Some(name) = name {
            args.push(name);
        }
        args.push("--xml");

        let output = self.gluster(&args).await?;

        if !output.is_success() {
            // --xml 模式下错误信息通常在 stdout 的 opErrstr 中
            let message = extract_op_errstr(&output.stdout)
                .unwrap_or_else(|| output.error_message().trim().to_string());

            if let Some(name) = name {
                if message.contains("does not exist") {
                    return Err(GlusterError::VolumeNotFound(name.to_string()));
                }
            }
            return Err(GlusterError::VolumeInfoFailed(message));
        }

        let volumes = parse_volume_info(&output.stdout)?;
        info!("找到 {} 个卷", volumes.len());
        Ok(volumes)
    }

    /// 获取卷信息，`all` 表示所有卷
    pub async fn get(&self, name: &str) -> Result<Vec<GlusterVolume>> {
        if name == "all" {
            self.volume_info(None).await
        } else {
            self.volume_info(Some(name)).await
        }
    }

    /// 获取所有卷并依次应用过滤器
    ///
    /// # Example
    /// ```ignore
    /// let vols = client.search(&[("status", "up"), ("type", "replicate")]).await?;
    /// ```
    pub async fn search<S: AsRef<str>>(&self, filters: &[(S, S)]) -> Result<Vec<GlusterVolume>> {
        // 先检查过滤器名，避免无意义的命令调用
        if let Some((name, _)) = filters
            .iter()
            .find(|(name, _)| !self.filters.contains(name.as_ref()))
        {
            return Err(GlusterError::FilterNotFound(name.as_ref().to_string()));
        }

        let volumes = self.volume_info(None).await?;
        self.filters.apply(volumes, filters)
    }

    /// 执行 `gluster volume set help` 获取默认卷选项
    pub async fn default_options(&self) -> Result<Vec<OptionInfo>> {
        info!("获取默认卷选项");

        let output = self.gluster(&["volume", "set", "help"]).await?;

        if !output.is_success() {
            return Err(GlusterError::OptionsFailed(
                output.error_message().trim().to_string(),
            ));
        }

        Ok(parse_default_options(&output.stdout))
    }

    /// 获取卷的生效选项（默认值被卷上设置的值覆盖）
    pub async fn volume_options(&self, name: &str) -> Result<Vec<OptionInfo>> {
        let defaults = self.default_options().await?;

        let volumes = self.volume_info(Some(name)).await?;
        let volume = volumes
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| GlusterError::VolumeNotFound(name.to_string()))?;

        debug!("卷 {} 设置了 {} 个选项", name, volume.options.len());
        Ok(merge_volume_options(defaults, volume))
    }

    /// 读取挂载点上的异地复制 stime 扩展属性
    ///
    /// 执行 `getfattr --absolute-names -n <key> -e hex <mount_point>`
    ///
    /// # Arguments
    /// * `mount_point` - 主卷挂载点
    /// * `master_uuid` - 主卷 UUID
    /// * `slave_uuid` - 从卷 UUID
    pub async fn read_stime(
        &self,
        mount_point: &str,
        master_uuid: &str,
        slave_uuid: &str,
    ) -> Result<Stime> {
        let key = stime_xattr_key(master_uuid, slave_uuid);
        info!("读取 {} 的 {}", mount_point, key);

        let args = vec![
            "--absolute-names".to_string(),
            "-n".to_string(),
            key.clone(),
            "-e".to_string(),
            "hex".to_string(),
            mount_point.to_string(),
        ];

        let output = self
            .runner
            .run(&self.getfattr_bin, &args)
            .await
            .map_err(|e| GlusterError::StimeUnavailable(e.to_string()))?;

        if !output.is_success() {
            return Err(GlusterError::StimeUnavailable(
                output.error_message().trim().to_string(),
            ));
        }

        let stime = parse_stime(&output.stdout, &key)?;
        debug!("stime = {}.{:09}", stime.secs, stime.nsecs);
        Ok(stime)
    }
}
