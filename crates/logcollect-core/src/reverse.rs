//! 反向日志扫描器（从文件末尾按块向前读取）
//!
//! 设计要点：
//! - 游标从文件末尾开始，每次读取 `[block_start, cursor)` 一块，内存只保留当前块。
//! - 块首的半行属于更靠前的块：下一块的结束边界对齐到本块首个换行之后，半行在下一块中重读。
//! - 区域末尾的换行只是上一行的结束符，不能视为新行起点，否则游标无法前进。
//! - 整块都没有可用换行时（超长行），整块作为待拼接片段暂存，继续向前扩展，直到找到行首或到达文件头。
//! - 惰性拉取：每次 `next()` 至多读取一块；调用方停止拉取即取消，丢弃迭代器即释放文件句柄。

use memchr::{memchr, memrchr};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::iter::FusedIterator;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::error::ScanError;
use crate::matcher::KeywordMatcher;
use crate::options::{ScanConfig, ScanStats};
use crate::types::{Line, ScanRequest};

/// 反向扫描迭代器：按“最新在前”的顺序产出命中行
pub struct ReverseScanner {
    path: PathBuf,
    /// 扫描结束（耗尽、触发上限或出错）后置为 None，释放句柄
    file: Option<File>,
    matcher: KeywordMatcher,
    block_size: u64,
    max_matches: u64,
    max_lines_scanned: u64,
    max_bytes_scanned: u64,
    file_size: u64,
    /// `[cursor, file_size)` 已处理完毕（或在 pending 中等待拼接）
    cursor: u64,
    block: Vec<u8>,
    /// 当前块中尚未检查的完整行区域为 `block[floor..end]`，末尾总是行边界
    floor: usize,
    end: usize,
    /// 超长行的后半段，按读取顺序（文件中由后向前）存放
    pending: Vec<Vec<u8>>,
    match_count: u64,
    stats: ScanStats,
    done: bool,
}

impl ReverseScanner {
    /// 打开文件并定位到末尾
    ///
    /// 先通过元数据探测是否存在，不存在时不会获取任何文件句柄。
    pub fn open(request: &ScanRequest, config: &ScanConfig) -> Result<Self, ScanError> {
        let path = request.path.clone();
        match std::fs::metadata(&path) {
            Ok(md) if md.is_file() => {}
            Ok(_) => {
                warn!(path = %path.display(), "log path is not a regular file");
                return Err(ScanError::NotFound(path));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "log file not found");
                return Err(open_error(path, e));
            }
        }

        let mut file = File::open(&path).map_err(|e| open_error(path.clone(), e))?;
        let file_size = file
            .seek(SeekFrom::End(0))
            .map_err(|source| ScanError::Io { path: path.clone(), source })?;
        debug!(path = %path.display(), file_size, keyword = ?request.keyword, max_matches = request.max_matches, "opened log file for reverse scan");

        let mut scanner = Self {
            path,
            file: Some(file),
            matcher: KeywordMatcher::new(request.keyword.as_deref()),
            block_size: config.block_size.max(1) as u64,
            max_matches: request.max_matches,
            max_lines_scanned: config.max_lines_scanned,
            max_bytes_scanned: config.max_bytes_scanned,
            file_size,
            cursor: file_size,
            block: Vec::new(),
            floor: 0,
            end: 0,
            pending: Vec::new(),
            match_count: 0,
            stats: ScanStats::default(),
            done: false,
        };
        // 空文件直接结束
        if file_size == 0 {
            scanner.finish();
        }
        Ok(scanner)
    }

    /// 当前统计（扫描结束后即为最终值）
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// 扫描是否已结束；结束后文件句柄已释放
    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// 从当前块区域末尾取出一行，返回不含换行的内容范围
    fn take_last_line(&mut self) -> Option<Range<usize>> {
        if self.end <= self.floor {
            return None;
        }
        let region = &self.block[self.floor..self.end];
        let content_end = if region.last() == Some(&b'\n') { region.len() - 1 } else { region.len() };
        let start = memrchr(b'\n', &region[..content_end]).map_or(0, |p| p + 1);
        let range = self.floor + start..self.floor + content_end;
        self.end = self.floor + start;
        Some(range)
    }

    /// 读取游标之前的一块，并解析出可输出的完整行区域
    fn load_block(&mut self) -> io::Result<()> {
        let block_start = self.cursor.saturating_sub(self.block_size);
        let len = (self.cursor - block_start) as usize;

        let mut buf = std::mem::take(&mut self.block);
        buf.clear();
        buf.resize(len, 0);
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file handle already released"))?;
        file.seek(SeekFrom::Start(block_start))?;
        file.read_exact(&mut buf)?;

        let floor = if block_start == 0 {
            self.cursor = 0;
            0
        } else {
            // 无待拼接片段时，区域末尾的换行是上一行的结束符，不参与查找
            let search = if self.pending.is_empty() { &buf[..len - 1] } else { &buf[..] };
            match memchr(b'\n', search) {
                Some(i) => {
                    self.cursor = block_start + i as u64 + 1;
                    i + 1
                }
                None => {
                    // 整块都在同一行中：暂存并继续向前
                    self.pending.push(buf);
                    self.cursor = block_start;
                    self.floor = 0;
                    self.end = 0;
                    self.stats.bytes_scanned = self.file_size - self.cursor;
                    return Ok(());
                }
            }
        };

        // 把超长行的后半段按文件顺序拼回块尾
        for chunk in self.pending.drain(..).rev() {
            buf.extend_from_slice(&chunk);
        }
        self.end = buf.len();
        self.floor = floor;
        self.block = buf;
        self.stats.bytes_scanned = self.file_size - self.cursor;
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.match_count >= self.max_matches || self.stats.lines_scanned >= self.max_lines_scanned
    }

    /// 结束扫描：释放句柄与缓冲，记录最终统计
    fn finish(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        self.file = None;
        self.block = Vec::new();
        self.pending.clear();
        self.floor = 0;
        self.end = 0;
        info!(
            path = %self.path.display(),
            lines_scanned = self.stats.lines_scanned,
            bytes_scanned = self.stats.bytes_scanned,
            matches = self.match_count,
            "finished reading"
        );
    }
}

impl Iterator for ReverseScanner {
    type Item = Result<Line, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.limit_reached() {
                self.finish();
                return None;
            }
            if let Some(range) = self.take_last_line() {
                self.stats.lines_scanned += 1;
                let content = &self.block[range];
                if self.matcher.is_match(content) {
                    self.match_count += 1;
                    return Some(Ok(Line::from_content(content)));
                }
                continue;
            }
            // 当前块已耗尽：到达文件头或字节上限即正常结束
            if self.cursor == 0 || self.stats.bytes_scanned >= self.max_bytes_scanned {
                self.finish();
                return None;
            }
            if let Err(source) = self.load_block() {
                error!(path = %self.path.display(), error = %source, "exception while reading log file");
                self.finish();
                return Some(Err(ScanError::Io { path: self.path.clone(), source }));
            }
        }
    }
}

impl FusedIterator for ReverseScanner {}

impl Drop for ReverseScanner {
    fn drop(&mut self) {
        if !self.done {
            debug!(
                path = %self.path.display(),
                lines_scanned = self.stats.lines_scanned,
                bytes_scanned = self.stats.bytes_scanned,
                "reverse scan cancelled"
            );
        }
    }
}

fn open_error(path: PathBuf, e: io::Error) -> ScanError {
    match e.kind() {
        io::ErrorKind::NotFound => ScanError::NotFound(path),
        _ => ScanError::Unreadable { path, source: e },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn write_log(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    fn config(block_size: usize) -> ScanConfig {
        ScanConfig { block_size, ..ScanConfig::default() }
    }

    fn collect(path: &Path, keyword: Option<&str>, max_matches: u64, cfg: &ScanConfig) -> (Vec<Line>, ScanStats) {
        let req = ScanRequest::new(path, keyword.map(str::to_owned), max_matches);
        let mut scanner = ReverseScanner::open(&req, cfg).unwrap();
        let lines: Vec<Line> = scanner.by_ref().map(|l| l.unwrap()).collect();
        assert!(scanner.is_finished());
        (lines, scanner.stats())
    }

    #[test]
    fn yields_lines_newest_first() {
        let f = write_log(b"1\n2\n3\n");
        let (lines, stats) = collect(f.path(), None, u64::MAX, &ScanConfig::default());
        assert_eq!(lines, vec!["3\n", "2\n", "1\n"]);
        assert_eq!(stats.lines_scanned, 3);
        assert_eq!(stats.bytes_scanned, 6);
    }

    #[test]
    fn keyword_with_match_limit_takes_nearest() {
        let f = write_log(b"foo\nbar\nfoobar\n");
        let (lines, stats) = collect(f.path(), Some("foo"), 1, &ScanConfig::default());
        assert_eq!(lines, vec!["foobar\n"]);
        assert_eq!(stats.lines_scanned, 1);
    }

    #[test]
    fn empty_file_yields_nothing() {
        let f = write_log(b"");
        let (lines, stats) = collect(f.path(), None, u64::MAX, &ScanConfig::default());
        assert!(lines.is_empty());
        assert_eq!(stats, ScanStats::default());
    }

    #[test]
    fn missing_trailing_newline_still_emits_last_line() {
        let f = write_log(b"alpha\nbeta");
        for bs in [1, 2, 3, 64] {
            let (lines, _) = collect(f.path(), None, u64::MAX, &config(bs));
            assert_eq!(lines, vec!["beta\n", "alpha\n"], "block_size={bs}");
        }
    }

    #[test]
    fn empty_lines_are_lines() {
        let f = write_log(b"a\n\n\nb\n");
        for bs in [1, 2, 5, 64] {
            let (lines, stats) = collect(f.path(), None, u64::MAX, &config(bs));
            assert_eq!(lines, vec!["b\n", "\n", "\n", "a\n"], "block_size={bs}");
            assert_eq!(stats.lines_scanned, 4);
        }
    }

    #[test]
    fn line_longer_than_block_is_reassembled() {
        let long = "x".repeat(37);
        let content = format!("head\n{long}\ntail\n");
        let f = write_log(content.as_bytes());
        for bs in [1, 4, 8, 36, 37, 38] {
            let (lines, _) = collect(f.path(), None, u64::MAX, &config(bs));
            assert_eq!(lines, vec!["tail\n".to_string(), format!("{long}\n"), "head\n".to_string()], "block_size={bs}");
        }
    }

    #[test]
    fn oversized_first_and_last_lines() {
        let content = format!("{}\n{}", "a".repeat(20), "b".repeat(20));
        let f = write_log(content.as_bytes());
        let (lines, _) = collect(f.path(), None, u64::MAX, &config(3));
        assert_eq!(lines, vec![format!("{}\n", "b".repeat(20)), format!("{}\n", "a".repeat(20))]);
    }

    #[test]
    fn absent_keyword_still_counts_lines() {
        let f = write_log(b"one\ntwo\nthree\n");
        let (lines, stats) = collect(f.path(), Some("zzz"), u64::MAX, &config(4));
        assert!(lines.is_empty());
        assert_eq!(stats.lines_scanned, 3);
        assert_eq!(stats.bytes_scanned, 14);
    }

    #[test]
    fn line_limit_stops_scan() {
        let f = write_log(b"1\n2\n3\n4\n5\n");
        let cfg = ScanConfig { max_lines_scanned: 2, ..ScanConfig::default() };
        let (lines, stats) = collect(f.path(), None, u64::MAX, &cfg);
        assert_eq!(lines, vec!["5\n", "4\n"]);
        assert_eq!(stats.lines_scanned, 2);
    }

    #[test]
    fn byte_limit_is_checked_before_each_block() {
        let f = write_log(b"aa\nbb\ncc\ndd\n");
        // 每块 4 字节：前一行的换行加一整行；两块后字节数达到上限
        let cfg = ScanConfig { block_size: 4, max_bytes_scanned: 6, ..ScanConfig::default() };
        let (lines, stats) = collect(f.path(), None, u64::MAX, &cfg);
        assert_eq!(lines, vec!["dd\n", "cc\n"]);
        assert_eq!(stats.bytes_scanned, 6);
    }

    #[test]
    fn zero_max_matches_reads_nothing() {
        let f = write_log(b"1\n2\n");
        let (lines, stats) = collect(f.path(), None, 0, &ScanConfig::default());
        assert!(lines.is_empty());
        assert_eq!(stats.bytes_scanned, 0);
    }

    #[test]
    fn non_utf8_bytes_are_preserved() {
        let f = write_log(b"ok\n\xff\xfe bad\n");
        let (lines, _) = collect(f.path(), None, u64::MAX, &config(2));
        assert_eq!(lines[0].as_bytes(), b"\xff\xfe bad\n");
        assert_eq!(lines[1], "ok\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let req = ScanRequest::new(dir.path().join("nope.log"), None, 10);
        let err = ReverseScanner::open(&req, &ScanConfig::default()).err().unwrap();
        assert!(matches!(err, ScanError::NotFound(_)));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let req = ScanRequest::new(dir.path(), None, 10);
        let err = ReverseScanner::open(&req, &ScanConfig::default()).err().unwrap();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn pulling_is_lazy_and_releases_on_finish() {
        let f = write_log(b"a\nb\nc\nd\n");
        let req = ScanRequest::new(f.path(), None, 2);
        let mut scanner = ReverseScanner::open(&req, &config(2)).unwrap();
        assert_eq!(scanner.stats().bytes_scanned, 0);
        assert_eq!(scanner.next().unwrap().unwrap(), "d\n");
        assert_eq!(scanner.stats().bytes_scanned, 2);
        assert_eq!(scanner.next().unwrap().unwrap(), "c\n");
        assert!(!scanner.is_finished());
        assert!(scanner.next().is_none());
        assert!(scanner.is_finished());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn truncated_file_surfaces_io_error() {
        let f = write_log(b"first\nsecond\nthird\n");
        let req = ScanRequest::new(f.path(), None, u64::MAX);
        let mut scanner = ReverseScanner::open(&req, &config(7)).unwrap();
        assert_eq!(scanner.next().unwrap().unwrap(), "third\n");
        // 扫描中途文件被截断：下一块读取失败，不能静默结束
        f.as_file().set_len(2).unwrap();
        let res: Vec<_> = scanner.by_ref().collect();
        assert!(matches!(res.last(), Some(Err(ScanError::Io { .. }))));
        assert!(scanner.is_finished());
        assert!(scanner.next().is_none());
    }
}
