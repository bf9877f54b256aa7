//! 卷过滤器
//!
//! 过滤器按名称注册在 [`FilterRegistry`] 中，每个过滤器接收一个过滤值：
//! - `""` 或 `"all"` 匹配所有卷
//! - 忽略大小写的精确匹配
//! - 正则搜索（部分过滤器，大小写敏感性因过滤器而异）

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::{GlusterError, Result};
use crate::models::GlusterVolume;

/// 过滤器的正则匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexMode {
    /// 只做精确匹配
    None,
    /// 大小写敏感的正则搜索
    CaseSensitive,
    /// 忽略大小写的正则搜索
    CaseInsensitive,
}

/// 编译后的过滤值
#[derive(Debug, Clone)]
pub struct FilterPattern {
    raw: String,
    regex: Option<Regex>,
}

impl FilterPattern {
    /// 编译过滤值
    pub fn compile(filter: &str, value: &str, mode: RegexMode) -> Result<Self> {
        let is_any = matches!(value, "" | "all");

        let regex = match mode {
            _ if is_any => None,
            RegexMode::None => None,
            RegexMode::CaseSensitive | RegexMode::CaseInsensitive => Some(
                RegexBuilder::new(value)
                    .case_insensitive(mode == RegexMode::CaseInsensitive)
                    .build()
                    .map_err(|e| GlusterError::InvalidPattern {
                        filter: filter.to_string(),
                        value: value.to_string(),
                        reason: e.to_string(),
                    })?,
            ),
        };

        Ok(Self {
            raw: value.to_string(),
            regex,
        })
    }

    /// 过滤值为 "" 或 "all" 时匹配所有卷
    pub fn is_any(&self) -> bool {
        matches!(self.raw.as_str(), "" | "all")
    }

    /// 原始过滤值
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 忽略大小写的精确匹配（过滤值两端空白被忽略）
    pub fn equals(&self, field: &str) -> bool {
        field.to_lowercase() == self.raw.trim().to_lowercase()
    }

    /// 正则搜索（未启用正则时为 false）
    pub fn search(&self, field: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(field))
    }

    /// 完整的匹配规则
    pub fn matches(&self, field: &str) -> bool {
        self.is_any() || self.equals(field) || self.search(field)
    }
}

/// 过滤谓词
pub type FilterFn = fn(&GlusterVolume, &FilterPattern) -> bool;

/// 注册表中的过滤器
#[derive(Debug, Clone, Copy)]
pub struct FilterKind {
    pub predicate: FilterFn,
    pub regex: RegexMode,
}

impl FilterKind {
    pub fn new(predicate: FilterFn, regex: RegexMode) -> Self {
        Self { predicate, regex }
    }
}

fn name_filter(vol: &GlusterVolume, pattern: &FilterPattern) -> bool {
    pattern.matches(&vol.name)
}

fn status_filter(vol: &GlusterVolume, pattern: &FilterPattern) -> bool {
    pattern.matches(vol.status.as_str())
}

fn type_filter(vol: &GlusterVolume, pattern: &FilterPattern) -> bool {
    pattern.matches(&vol.volume_type)
}

fn volumewithbrick_filter(vol: &GlusterVolume, pattern: &FilterPattern) -> bool {
    // 只要有一个 brick 匹配即可；没有 brick 的卷只在 ""/"all" 时通过
    pattern.is_any() || vol.bricks.iter().any(|brick| pattern.matches(brick))
}

fn transport_filter(vol: &GlusterVolume, pattern: &FilterPattern) -> bool {
    pattern.matches(vol.transport.as_str())
}

/// 过滤器注册表（过滤器名 -> 谓词）
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: BTreeMap<String, FilterKind>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("name", FilterKind::new(name_filter, RegexMode::CaseSensitive));
        registry.register("status", FilterKind::new(status_filter, RegexMode::None));
        registry.register("type", FilterKind::new(type_filter, RegexMode::CaseInsensitive));
        registry.register(
            "transport",
            FilterKind::new(transport_filter, RegexMode::CaseInsensitive),
        );

        let brick = FilterKind::new(volumewithbrick_filter, RegexMode::CaseInsensitive);
        registry.register("volumewithbrick", brick);
        registry.register("volumewithbricks", brick);
        registry.register("brick", brick);
        registry
    }
}

impl FilterRegistry {
    /// 不含任何过滤器的注册表
    pub fn empty() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }

    /// 注册（或替换）过滤器
    pub fn register(&mut self, name: impl Into<String>, kind: FilterKind) {
        self.filters.insert(name.into(), kind);
    }

    /// 所有过滤器名（按字母顺序）
    pub fn names(&self) -> Vec<&str> {
        self.filters.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// 依次应用过滤器
    ///
    /// 过滤器名不存在时返回 [`GlusterError::FilterNotFound`]
    pub fn apply<S: AsRef<str>>(
        &self,
        volumes: Vec<GlusterVolume>,
        filters: &[(S, S)],
    ) -> Result<Vec<GlusterVolume>> {
        let mut volumes = volumes;

        for (name, value) in filters {
            let name = name.as_ref();
            let kind = self
                .filters
                .get(name)
                .ok_or_else(|| GlusterError::FilterNotFound(name.to_string()))?;

            let pattern = FilterPattern::compile(name, value.as_ref(), kind.regex)?;
            let before = volumes.len();
            volumes.retain(|vol| (kind.predicate)(vol, &pattern));

            debug!(
                "过滤器 {}={:?}: {} -> {} 个卷",
                name,
                pattern.as_str(),
                before,
                volumes.len()
            );
        }

        Ok(volumes)
    }
}
