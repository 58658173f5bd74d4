//! 公共类型（对外暴露）
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::options::ScanConfig;

/// 关键字长度下限（字符数）
pub const KEYWORD_MIN_CHARS: usize = 2;
/// 关键字长度上限（字符数）
pub const KEYWORD_MAX_CHARS: usize = 1000;
/// 显式指定的命中数上限
pub const MAX_MATCHES_LIMIT: u64 = 1000;

/// 单行结果：按文件原始顺序重建的字节，包含行尾 `\n`
///
/// 以字节保存，非 UTF-8 内容也能逐字节还原。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Line {
    bytes: Vec<u8>,
}

impl Line {
    /// 由不含换行的内容构造，补回行尾 `\n`
    pub(crate) fn from_content(content: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(content.len() + 1);
        bytes.extend_from_slice(content);
        bytes.push(b'\n');
        Self { bytes }
    }

    /// 含行尾换行的原始字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 不含行尾换行的内容
    pub fn content(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// 有损转换为字符串（非法 UTF-8 替换为 U+FFFD）
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), f)
    }
}

impl AsRef<[u8]> for Line {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq<str> for Line {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for Line {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<String> for Line {
    fn eq(&self, other: &String) -> bool {
        self.bytes == other.as_bytes()
    }
}

/// 单次扫描请求
///
/// `path` 应已由调用方校验（位于根目录内、非归档扩展名）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub path: PathBuf,
    /// 区分大小写的子串；None 表示不过滤
    pub keyword: Option<String>,
    /// 命中行数上限（正整数）
    pub max_matches: u64,
}

impl ScanRequest {
    /// 不做校验的构造（可信调用方与测试使用）
    pub fn new(path: impl Into<PathBuf>, keyword: Option<String>, max_matches: u64) -> Self {
        Self { path: path.into(), keyword, max_matches }
    }

    /// 边界校验后构造请求
    /// - 关键字长度需在 2..=1000 字符内
    /// - 显式给出的命中上限需在 1..=1000 内；未给出时取配置中的行数上限
    pub fn validated(
        path: &Path,
        keyword: Option<&str>,
        max_matches: Option<u64>,
        config: &ScanConfig,
    ) -> Result<Self, ScanError> {
        if let Some(k) = keyword {
            let n = k.chars().count();
            if !(KEYWORD_MIN_CHARS..=KEYWORD_MAX_CHARS).contains(&n) {
                return Err(ScanError::InvalidArgument(format!(
                    "keyword length must be between {KEYWORD_MIN_CHARS} and {KEYWORD_MAX_CHARS} characters, got {n}"
                )));
            }
        }
        let max_matches = match max_matches {
            Some(n) if (1..=MAX_MATCHES_LIMIT).contains(&n) => n,
            Some(n) => {
                return Err(ScanError::InvalidArgument(format!(
                    "match limit must be between 1 and {MAX_MATCHES_LIMIT}, got {n}"
                )))
            }
            None => config.max_lines_scanned,
        };
        Ok(Self { path: path.to_path_buf(), keyword: keyword.map(str::to_owned), max_matches })
    }
}
