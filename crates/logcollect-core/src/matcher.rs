//! 关键字匹配（预处理后的子串查找）
//!
//! 行为等价于朴素子串匹配：区分大小写、不做任何归一化。
//! 关键字只在扫描开始时编译一次，逐行复用。

use memchr::memmem::Finder;

/// 行过滤器；无关键字时匹配所有行
pub(crate) struct KeywordMatcher {
    finder: Option<Finder<'static>>,
}

impl KeywordMatcher {
    pub(crate) fn new(keyword: Option<&str>) -> Self {
        let finder = keyword.map(|k| Finder::new(k.as_bytes()).into_owned());
        Self { finder }
    }

    /// 判断行内容（不含换行）是否命中
    pub(crate) fn is_match(&self, line: &[u8]) -> bool {
        match &self.finder {
            None => true,
            Some(f) => f.find(line).is_some(),
        }
    }
}
