//! HPO term schema definition / HPO 术语的 Schema 定义

use serde::{Deserialize, Serialize};

/// Canonical id prefix (lowercased form is used for exact-id lookup) / 术语ID前缀
pub const HPO_ID_PREFIX: &str = "HP:";

/// HPO term record - immutable once loaded / HPO 术语记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpoTerm {
    /// Canonical identifier, e.g. `HP:0001250` / 术语ID
    pub id: String,
    /// English label / 英文名称
    pub name: String,
    /// English definition (may be empty) / 英文定义
    #[serde(default)]
    pub definition: String,
    /// Chinese label / 中文名称
    #[serde(default)]
    pub name_cn: String,
    /// Chinese definition (may be empty) / 中文定义
    #[serde(default)]
    pub definition_cn: String,
}

impl HpoTerm {
    /// Check `HP:` + 7 digits / 校验ID格式
    pub fn is_valid_id(id: &str) -> bool {
        match id.strip_prefix(HPO_ID_PREFIX) {
            Some(digits) => digits.len() == 7 && digits.bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }
}

/// Search query options / 搜索查询选项
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results to return / 最大返回结果数
    pub max_results: usize,
    /// Enable the definition full-text fallback / 启用定义全文检索
    pub include_definitions: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 50,
            include_definitions: false,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn include_definitions(mut self, enabled: bool) -> Self {
        self.include_definitions = enabled;
        self
    }
}

/// Ranked search result / 带分数的搜索结果
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTerm {
    pub term: HpoTerm,
    pub score: u32,
}

/// Direct lookup hit (phrase or medical-record mode) / 直接检索结果
#[derive(Debug, Clone, Serialize)]
pub struct LookupHit {
    pub term: HpoTerm,
    /// Query segments that produced this hit / 命中的分词
    pub matched_words: Vec<String>,
    /// Number of matching segments (1 in phrase mode) / 匹配次数
    pub match_count: usize,
}
