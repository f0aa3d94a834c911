//! 例外文本替换
//!
//! 语言标签、版本号等固定文本直接机械替换，不交给翻译后端。

use regex::Regex;
use std::sync::LazyLock;

/// `V.` 后跟三位数字
static VERSION_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"V\.\d{3}").expect("valid version marker regex"));

/// 一组固定的例外规则
///
/// 规则按顺序检查，第一条匹配的规则生效：
///
/// 1. 文本包含 `"- " + 源语言代码大写` 时，替换为 `"- " + 目标语言代码大写`
/// 2. 否则文本包含 `V.` 加三位数字时，全部替换为 `v` 加版本号中的数字
#[derive(Debug, Clone)]
pub struct ExceptionMatcher {
    source_marker: String,
    target_marker: String,
    version_replacement: String,
}

impl ExceptionMatcher {
    /// 版本号只保留ASCII数字，全角等其他Unicode数字会被丢弃
    pub fn new(source_lang: &str, target_lang: &str, version: &str) -> Self {
        let digits: String = version.chars().filter(|c| c.is_ascii_digit()).collect();
        Self {
            source_marker: format!("- {}", source_lang.to_uppercase()),
            target_marker: format!("- {}", target_lang.to_uppercase()),
            version_replacement: format!("v{}", digits),
        }
    }

    /// 返回替换后的文本；没有规则匹配时返回 `None`，调用方应继续正常翻译
    pub fn apply(&self, text: &str) -> Option<String> {
        if text.contains(&self.source_marker) {
            return Some(text.replace(&self.source_marker, &self.target_marker));
        }

        if VERSION_MARKER_REGEX.is_match(text) {
            let replaced = VERSION_MARKER_REGEX.replace_all(text, regex::NoExpand(&self.version_replacement));
            return Some(replaced.into_owned());
        }

        None
    }
}

/// 检查单段文本是否命中例外规则，见 [`ExceptionMatcher`]
pub fn check_exception(
    text: &str,
    source_lang: &str,
    target_lang: &str,
    version: &str,
) -> Option<String> {
    ExceptionMatcher::new(source_lang, target_lang, version).apply(text)
}
