//! 扫描主流程：驱动反向扫描器并把结果流式写出
use std::io::Write;

use crate::error::ScanError;
use crate::options::{OutputFormat, ScanConfig, ScanStats};
use crate::reverse::ReverseScanner;
use crate::types::ScanRequest;

/// 打开文件并返回惰性扫描迭代器
pub fn scan(request: &ScanRequest, config: &ScanConfig) -> Result<ReverseScanner, ScanError> {
    ReverseScanner::open(request, config)
}

/// 扫描文件并将命中行写入 `out`
/// - Text：逐行原样写出，每行写完即可被下游转发
/// - Json：写出 JSON 字符串数组（非法 UTF-8 有损转换）
///
/// 中途出错时已写出的内容不回收，错误原样返回。
/// 最终统计由扫描器结束时记录一次。
pub fn scan_to_writer(
    request: &ScanRequest,
    config: &ScanConfig,
    out: &mut dyn Write,
    format: OutputFormat,
) -> Result<ScanStats, ScanError> {
    let mut scanner = ReverseScanner::open(request, config)?;
    let path = request.path.clone();
    let io_err = |source: std::io::Error| ScanError::Io { path: path.clone(), source };

    if format == OutputFormat::Json { write!(out, "[").map_err(io_err)?; }
    let mut first = true;
    for line in scanner.by_ref() {
        let line = line?;
        match format {
            OutputFormat::Text => out.write_all(line.as_bytes()).map_err(io_err)?,
            OutputFormat::Json => {
                if !first { write!(out, ",").map_err(io_err)?; } else { first = false; }
                serde_json::to_writer(&mut *out, &*line.to_string_lossy())
                    .map_err(|e| io_err(e.into()))?;
            }
        }
    }
    if format == OutputFormat::Json { write!(out, "]").map_err(io_err)?; }
    out.flush().map_err(io_err)?;

    Ok(scanner.stats())
}
