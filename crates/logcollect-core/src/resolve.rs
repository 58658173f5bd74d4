//! 路径解析与可读性探测（扫描前的边界检查）
use std::fs::File;
use std::path::{Component, Path, PathBuf};

use crate::error::ScanError;

/// 归档/压缩类扩展名：不做解码，直接拒绝
const ARCHIVE_EXTENSIONS: &[&str] = &["gz", "bz2", "xz", "zst", "zip", "tar", "tgz", "7z", "rar", "lz4"];

/// 将请求的相对路径映射到日志根目录下
/// - 拒绝绝对路径、`..`、根/盘符前缀，防止越出根目录
/// - 拒绝归档类扩展名
pub fn resolve_log_path(root: &Path, requested: &str) -> Result<PathBuf, ScanError> {
    let requested = requested.trim_start_matches('/');
    if requested.is_empty() {
        return Err(ScanError::InvalidArgument("empty log path".into()));
    }

    let mut resolved = root.to_path_buf();
    for comp in Path::new(requested).components() {
        match comp {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ScanError::InvalidArgument(format!("log path escapes root: {requested}")));
            }
        }
    }

    if is_archive(&resolved) {
        return Err(ScanError::InvalidArgument(format!("archive files are not supported: {requested}")));
    }
    Ok(resolved)
}

/// 是否为归档类扩展名（大小写不敏感）
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ARCHIVE_EXTENSIONS.iter().any(|a| e.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

/// 探测：是普通文件且可以只读打开
pub fn is_readable_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(md) if md.is_file() => File::open(path).is_ok(),
        _ => false,
    }
}
