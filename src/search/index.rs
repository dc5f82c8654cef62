//! Term index - inverted indexes over the HPO dictionary / 术语索引
//!
//! Built once from the dictionary, never mutated afterwards / 一次构建，只读共享：
//! - by_id: lowercased id -> term id / ID索引
//! - by_name_prefix: English name word prefix -> term ids / 英文前缀索引
//! - by_name_cn_prefix: Chinese name word prefix -> term ids / 中文前缀索引
//! - by_keyword: bilingual keyword -> term ids / 关键词索引
//!
//! Query stages / 查询阶段：exact id -> prefix (+5) -> keyword (+2)
//! -> definition full text (+1) -> exact name bonus (+10) -> rank

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::loader::Dictionary;
use super::schema::{HpoTerm, ScoredTerm, SearchOptions, HPO_ID_PREFIX};
use super::tokenizer::{keyword_tokens, normalize_query, query_prefix, word_prefixes};

const PREFIX_SCORE: u32 = 5;
const KEYWORD_SCORE: u32 = 2;
const DEFINITION_SCORE: u32 = 1;
const EXACT_NAME_BONUS: u32 = 10;

/// Exact id hits bypass scoring and rank above anything accumulated / 精确ID命中分数
pub const EXACT_ID_SCORE: u32 = u32::MAX;

/// Full-text fallback only runs for queries longer than this (chars) / 全文检索阈值
const FULL_TEXT_MIN_QUERY_LEN: usize = 15;

type Postings = HashMap<String, BTreeSet<String>>;

/// Index statistics / 索引统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub term_count: usize,
    pub name_prefix_keys: usize,
    pub name_cn_prefix_keys: usize,
    pub keyword_keys: usize,
}

/// Immutable term index / 只读术语索引
pub struct TermIndex {
    /// Term storage: id -> term / 术语存储
    terms: Dictionary,
    by_id: HashMap<String, String>,
    by_name_prefix: Postings,
    by_name_cn_prefix: Postings,
    by_keyword: Postings,
}

impl TermIndex {
    /// Build all indexes from the dictionary (pure, deterministic) / 构建索引
    pub fn build(terms: Dictionary) -> Self {
        let mut by_id = HashMap::with_capacity(terms.len());
        let mut by_name_prefix = Postings::new();
        let mut by_name_cn_prefix = Postings::new();
        let mut by_keyword = Postings::new();

        for (id, term) in &terms {
            by_id.insert(id.to_lowercase(), id.clone());

            add_postings(&mut by_name_prefix, word_prefixes(&term.name), id);
            add_postings(&mut by_name_cn_prefix, word_prefixes(&term.name_cn), id);

            for field in [&term.name, &term.definition, &term.name_cn, &term.definition_cn] {
                add_postings(&mut by_keyword, keyword_tokens(field), id);
            }
        }

        Self {
            terms,
            by_id,
            by_name_prefix,
            by_name_cn_prefix,
            by_keyword,
        }
    }

    /// Get index statistics / 获取索引统计信息
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            term_count: self.terms.len(),
            name_prefix_keys: self.by_name_prefix.len(),
            name_cn_prefix_keys: self.by_name_cn_prefix.len(),
            keyword_keys: self.by_keyword.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term by canonical id (case-sensitive) / 根据ID获取术语
    pub fn get(&self, id: &str) -> Option<&HpoTerm> {
        self.terms.get(id)
    }

    /// Term by lowercased id / 按小写ID精确查找
    fn get_by_lower_id(&self, lower_id: &str) -> Option<&HpoTerm> {
        self.by_id.get(lower_id).and_then(|id| self.terms.get(id))
    }

    /// Ranked search / 搜索
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<HpoTerm> {
        self.search_scored(query, options)
            .into_iter()
            .map(|scored| scored.term)
            .collect()
    }

    /// Ranked search with accumulated scores / 带分数的搜索
    pub fn search_scored(&self, query: &str, options: &SearchOptions) -> Vec<ScoredTerm> {
        let normalized = normalize_query(query);
        if normalized.is_empty() || options.max_results == 0 {
            return Vec::new();
        }

        // Exact id is authoritative
        if normalized.starts_with(&HPO_ID_PREFIX.to_lowercase()) {
            if let Some(term) = self.get_by_lower_id(&normalized) {
                return vec![ScoredTerm {
                    term: term.clone(),
                    score: EXACT_ID_SCORE,
                }];
            }
        }

        let scores = self.candidates(&normalized, options);

        let mut results: Vec<ScoredTerm> = scores
            .into_iter()
            .filter_map(|(id, score)| {
                let term = self.terms.get(id)?;
                let exact = term.name.to_lowercase() == normalized
                    || term.name_cn.to_lowercase() == normalized;
                let score = if exact { score + EXACT_NAME_BONUS } else { score };
                Some(ScoredTerm {
                    term: term.clone(),
                    score,
                })
            })
            .collect();

        // Score descending, id ascending on ties
        results.sort_by(|a, b| {
            Reverse(a.score)
                .cmp(&Reverse(b.score))
                .then_with(|| a.term.id.cmp(&b.term.id))
        });
        results.truncate(options.max_results);

        results
    }

    /// Candidates with accumulated stage scores, before the exact-name bonus / 候选术语及累计分数
    ///
    /// The definition scan runs only while fewer than `max_results` candidates
    /// exist and stops at `2 * max_results`.
    fn candidates(&self, normalized: &str, options: &SearchOptions) -> HashMap<&str, u32> {
        let mut scores: HashMap<&str, u32> = HashMap::new();
        let words: Vec<&str> = normalized.split_whitespace().collect();

        for word in &words {
            let Some(prefix) = query_prefix(word) else {
                continue;
            };
            for postings in [&self.by_name_prefix, &self.by_name_cn_prefix] {
                if let Some(ids) = postings.get(&prefix) {
                    for id in ids {
                        *scores.entry(id.as_str()).or_default() += PREFIX_SCORE;
                    }
                }
            }
        }
        let after_prefix = scores.len();

        for word in &words {
            if let Some(ids) = self.by_keyword.get(*word) {
                for id in ids {
                    *scores.entry(id.as_str()).or_default() += KEYWORD_SCORE;
                }
            }
        }
        let after_keyword = scores.len();

        if options.include_definitions
            && scores.len() < options.max_results
            && normalized.chars().count() > FULL_TEXT_MIN_QUERY_LEN
        {
            let cap = options.max_results.saturating_mul(2);
            for (id, term) in &self.terms {
                if scores.len() >= cap {
                    break;
                }
                if term.definition.to_lowercase().contains(normalized)
                    || term.definition_cn.to_lowercase().contains(normalized)
                {
                    *scores.entry(id.as_str()).or_default() += DEFINITION_SCORE;
                }
            }
        }

        tracing::debug!(
            "Query {:?}: {} prefix, {} keyword, {} total candidates",
            normalized,
            after_prefix,
            after_keyword - after_prefix,
            scores.len()
        );

        scores
    }
}

fn add_postings(postings: &mut Postings, keys: Vec<String>, id: &str) {
    for key in keys {
        postings.entry(key).or_default().insert(id.to_string());
    }
}
