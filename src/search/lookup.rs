//! Direct lookup - phrase search or segmented medical-record search / 直接检索
//!
//! 两种模式：
//! 1. Phrase: search the input as-is / 单词/短语直接搜索
//! 2. Medical record: segment with jieba, search every segment, merge by term / 病历文本分词后批量搜索

use std::collections::HashMap;

use super::engine::HpoSearchEngine;
use super::error::LoadError;
use super::schema::{LookupHit, SearchOptions};
use super::tokenizer::{is_medical_record, segment_medical_record};

/// Lookup limits / 检索数量限制
#[derive(Debug, Clone)]
pub struct LookupOptions {
    /// Max results in phrase mode / 短语模式最大结果数
    pub phrase_limit: usize,
    /// Max results per segment in record mode / 每个分词最大结果数
    pub segment_limit: usize,
    /// Max merged results in record mode / 合并后最大结果数
    pub total_limit: usize,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            phrase_limit: 50,
            segment_limit: 20,
            total_limit: 50,
        }
    }
}

impl HpoSearchEngine {
    /// Look up free text, choosing phrase or record mode / 检索HPO术语
    pub async fn lookup(&self, query: &str, options: &LookupOptions) -> Result<Vec<LookupHit>, LoadError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        if is_medical_record(query) {
            let segments = segment_medical_record(query);
            tracing::debug!("Medical record segmented into {:?}", segments);
            self.lookup_segments(&segments, options).await
        } else {
            // Phrases are short by construction, definitions are never scanned
            let search_options = SearchOptions::new().with_limit(options.phrase_limit);
            let query_word = query.trim().to_string();

            Ok(self
                .search(query, &search_options)
                .await?
                .into_iter()
                .map(|term| LookupHit {
                    term,
                    matched_words: vec![query_word.clone()],
                    match_count: 1,
                })
                .collect())
        }
    }

    /// Search each segment and merge hits by term id / 分词逐个搜索并合并
    async fn lookup_segments(
        &self,
        segments: &[String],
        options: &LookupOptions,
    ) -> Result<Vec<LookupHit>, LoadError> {
        let search_options = SearchOptions::new().with_limit(options.segment_limit);
        let mut merged: HashMap<String, LookupHit> = HashMap::new();

        for segment in segments {
            for term in self.search(segment, &search_options).await? {
                let hit = merged.entry(term.id.clone()).or_insert_with(|| LookupHit {
                    term,
                    matched_words: Vec::new(),
                    match_count: 0,
                });
                hit.matched_words.push(segment.clone());
                hit.match_count += 1;
            }
        }

        // Terms matched by more segments first
        let mut hits: Vec<LookupHit> = merged.into_values().collect();
        hits.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| a.term.id.cmp(&b.term.id))
        });
        hits.truncate(options.total_limit);

        Ok(hits)
    }
}
