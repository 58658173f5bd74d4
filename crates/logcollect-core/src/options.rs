//! 扫描配置与统计信息（模块）
use std::path::PathBuf;

use crate::error::ConfigError;

/// 默认块大小：每次向后读取 2 MiB
pub const DEFAULT_BLOCK_SIZE: usize = 2 * 1024 * 1024;
/// 默认最多检查的行数
pub const DEFAULT_MAX_LINES_SCANNED: u64 = 100_000_000;
/// 字节上限默认按“行数 × 1 MiB”推导（约 100 TB，仅作兜底短路）
pub const BYTES_PER_LINE_ALLOWANCE: u64 = 1024 * 1024;
/// 默认日志根目录
pub const DEFAULT_LOG_ROOT: &str = "/var/log/";

/// 输出格式
/// - Text：逐行原样写出（含行尾换行）
/// - Json：流式 JSON 字符串数组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// 进程级扫描配置
///
/// 显式传入扫描器构造函数，扫描过程中不再读取任何环境状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// 单次读取的块大小（字节）
    pub block_size: usize,
    /// 单次扫描最多检查的行数（不论是否命中）
    pub max_lines_scanned: u64,
    /// 单次扫描最多向后移动的字节数
    pub max_bytes_scanned: u64,
    /// 日志根目录；请求路径只能落在其下
    pub log_root: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_lines_scanned: DEFAULT_MAX_LINES_SCANNED,
            max_bytes_scanned: derive_max_bytes(DEFAULT_MAX_LINES_SCANNED),
            log_root: PathBuf::from(DEFAULT_LOG_ROOT),
        }
    }
}

impl ScanConfig {
    /// 校验各项上限均为正数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be positive".into()));
        }
        if self.max_lines_scanned == 0 {
            return Err(ConfigError::Invalid("max_lines_scanned must be positive".into()));
        }
        if self.max_bytes_scanned == 0 {
            return Err(ConfigError::Invalid("max_bytes_scanned must be positive".into()));
        }
        Ok(())
    }
}

/// 由行数上限推导字节上限（饱和乘法，避免溢出）
pub(crate) fn derive_max_bytes(max_lines: u64) -> u64 {
    max_lines.saturating_mul(BYTES_PER_LINE_ALLOWANCE)
}

/// 扫描统计信息（仅用于日志观测，不返回给 HTTP 调用方）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// 已检查的完整行数（命中与否均计入）
    pub lines_scanned: u64,
    /// 向后扫描移动过的字节数（文件大小 - 游标）
    pub bytes_scanned: u64,
}
