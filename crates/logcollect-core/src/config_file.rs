//! 配置文件加载（TOML）
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::options::{derive_max_bytes, ScanConfig};

/// 配置层：所有字段可选，缺省时沿用下一层
///
/// 既用于解析配置文件，也用于承载命令行/环境变量给出的覆盖值。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub block_size: Option<usize>,
    #[serde(default, alias = "max_result_lines")]
    pub max_lines_scanned: Option<u64>,
    #[serde(default, alias = "max_scan_size_bytes")]
    pub max_bytes_scanned: Option<u64>,
    #[serde(default, alias = "var_log_dir")]
    pub log_root: Option<PathBuf>,
}

impl ConfigFile {
    /// 从 TOML 文本解析
    pub fn parse(path: &Path, txt: &str) -> Result<Self, ConfigError> {
        toml::from_str(txt).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// 读取并解析配置文件
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let txt = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(path, &txt)
    }

    /// 逐字段合并：`over` 中给出的值优先
    pub fn overridden_by(self, over: ConfigFile) -> ConfigFile {
        ConfigFile {
            block_size: over.block_size.or(self.block_size),
            max_lines_scanned: over.max_lines_scanned.or(self.max_lines_scanned),
            max_bytes_scanned: over.max_bytes_scanned.or(self.max_bytes_scanned),
            log_root: over.log_root.or(self.log_root),
        }
    }

    /// 叠加到基础配置上
    ///
    /// 只有在各层都未给出字节上限时，才按行数上限重新推导。
    pub fn apply(self, mut base: ScanConfig) -> ScanConfig {
        if let Some(b) = self.block_size { base.block_size = b; }
        if let Some(l) = self.max_lines_scanned {
            base.max_lines_scanned = l;
            if self.max_bytes_scanned.is_none() {
                base.max_bytes_scanned = derive_max_bytes(l);
            }
        }
        if let Some(b) = self.max_bytes_scanned { base.max_bytes_scanned = b; }
        if let Some(root) = self.log_root { base.log_root = root; }
        base
    }

    /// 叠加到默认配置并校验
    pub fn into_config(self) -> Result<ScanConfig, ConfigError> {
        let cfg = self.apply(ScanConfig::default());
        cfg.validate()?;
        Ok(cfg)
    }
}
