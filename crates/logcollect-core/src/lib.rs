//! 日志反向检索核心库
//!
//! 设计要点：
//! - 从文件末尾按固定大小的块向前读取，最新的日志行最先产出。
//! - 行在块边界处被截断时，下一块的结束边界对齐到换行之后；超长行跨多块拼接，不截断。
//! - 结果是惰性、可提前终止的迭代器；任一上限（命中数、行数、字节数）触发即正常结束。
//! - 配置显式传入扫描器，不在扫描过程中读取环境变量。

mod options;
mod error;
mod types;
mod matcher;
mod reverse;
mod resolve;
mod config_file;
mod scan;

pub use options::{OutputFormat, ScanConfig, ScanStats, DEFAULT_BLOCK_SIZE, DEFAULT_LOG_ROOT, DEFAULT_MAX_LINES_SCANNED};
pub use error::{ConfigError, ScanError};
pub use types::{Line, ScanRequest, KEYWORD_MAX_CHARS, KEYWORD_MIN_CHARS, MAX_MATCHES_LIMIT};
pub use reverse::ReverseScanner;
pub use resolve::{is_archive, is_readable_file, resolve_log_path};
pub use config_file::ConfigFile;
pub use scan::{scan, scan_to_writer};
