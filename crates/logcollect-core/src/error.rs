//! 错误类型
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 扫描相关错误
///
/// 扫描器本身只区分“无法打开”（扫描从未开始）与“扫描中失败”（已输出内容不回收）。
/// 参数校验错误在边界处产生，不会进入扫描器。
#[derive(Debug, Error)]
pub enum ScanError {
    /// 文件不存在或不是普通文件
    #[error("log file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// 文件存在但无法以只读方式打开
    #[error("log file not readable: {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 关键字、上限或路径参数不合法
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 扫描过程中的 I/O 失败（如设备错误、文件被截断）
    #[error("i/o error while scanning {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// 映射为传输层状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ScanError::NotFound(_) | ScanError::Unreadable { .. } => 404,
            ScanError::InvalidArgument(_) => 400,
            ScanError::Io { .. } => 500,
        }
    }

    /// 是否属于“未找到”类（404）
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
