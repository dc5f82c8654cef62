//! Term tokenizer - prefix/keyword extraction and medical-record segmentation / 术语分词器
//!
//! Supports / 支持：
//! - Word prefixes for the name prefix indexes (2..=10 chars) / 名称前缀
//! - Bilingual keyword tokens for the keyword index / 中英文关键词
//! - Chinese medical-record segmentation (jieba) / 病历文本分词

use std::collections::HashSet;

use jieba_rs::Jieba;
use once_cell::sync::Lazy;

/// Global jieba tokenizer instance / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// Shortest indexed prefix / 最短前缀
pub const MIN_PREFIX_LEN: usize = 2;
/// Longest indexed prefix / 最长前缀
pub const MAX_PREFIX_LEN: usize = 10;

/// Keyword separators besides whitespace / 关键词分隔符
const KEYWORD_SEPARATORS: &[char] = &[',', ';', ':', '.', '，', '。', '；', '：'];

/// Punctuation that marks free text as a medical record / 病历文本标点
const RECORD_PUNCTUATION: &[char] = &['，', '。', '；', '！', '？', '、', ',', ';'];

/// Separators used when jieba yields nothing / 降级分词分隔符
const FALLBACK_SEPARATORS: &[char] = &[
    '，', '。', '、', '；', '：', '！', '？', ',', '.', ';', ':', '!', '?',
];

/// Stop words dropped from segmented records / 停用词
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "的", "了", "和", "与", "及", "或", "等", "为", "是", "在", "有", "无", "不", "未",
        "可", "能", "已", "被", "将", "由", "对", "于", "从", "到", "向", "以", "按", "经",
        "但", "而", "且", "则", "即", "又", "也", "都", "很", "较", "更", "最", "非常",
        "一", "二", "三", "四", "五", "六", "七", "八", "九", "十", "个", "次", "例",
    ]
    .into_iter()
    .collect()
});

/// Lowercased prefixes of every whitespace-delimited word / 生成名称前缀
///
/// Example: "Large ear" -> ["la", "lar", "larg", "large", "ea", "ear"]
pub fn word_prefixes(text: &str) -> Vec<String> {
    let normalized = text.trim().to_lowercase();
    let mut prefixes = Vec::new();

    for word in normalized.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        let max = chars.len().min(MAX_PREFIX_LEN);
        for len in MIN_PREFIX_LEN..=max {
            prefixes.push(chars[..len].iter().collect());
        }
    }

    prefixes
}

/// Prefix-index key for a query word, `None` if shorter than 2 chars / 查询词前缀键
pub fn query_prefix(word: &str) -> Option<String> {
    if word.chars().count() < MIN_PREFIX_LEN {
        return None;
    }
    Some(word.chars().take(MAX_PREFIX_LEN).collect())
}

/// Keyword tokens: lowercase, split on whitespace and punctuation, longer than 1 char / 关键词分词
pub fn keyword_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| c.is_whitespace() || KEYWORD_SEPARATORS.contains(&c))
        .filter(|w| w.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Normalize a query (lowercase + trim) / 标准化查询
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase().trim().to_string()
}

/// Whether the input should be segmented before searching / 判断是否为病历文本
pub fn is_medical_record(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.contains(RECORD_PUNCTUATION) || trimmed.chars().count() > 15
}

/// Segment a medical record into searchable words / 对病历文本进行分词
///
/// Stop words are dropped, single characters survive only if alphanumeric,
/// duplicates keep their first position.
pub fn segment_medical_record(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let words = JIEBA.cut(text, true);
    let mut seen = HashSet::new();
    let mut segments = Vec::new();

    for word in words {
        let word = word.trim();
        if word.is_empty() || STOP_WORDS.contains(word) {
            continue;
        }
        let keep = word.chars().count() >= 2 || word.chars().any(|c| c.is_ascii_alphanumeric());
        if keep && seen.insert(word.to_string()) {
            segments.push(word.to_string());
        }
    }

    if segments.is_empty() {
        return fallback_segment(text);
    }
    segments
}

/// Punctuation/whitespace split without a dictionary / 降级分词
fn fallback_segment(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| c.is_whitespace() || FALLBACK_SEPARATORS.contains(&c))
        .map(str::trim)
        .filter(|w| w.chars().count() >= 2 && !STOP_WORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}
