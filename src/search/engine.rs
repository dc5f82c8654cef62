//! HPO search engine - process-wide singleton with lazy one-shot initialization / HPO 搜索引擎
//!
//! Lifecycle / 生命周期：
//! Uninitialized -> Initializing -> Ready, or Initializing -> Failed -> Initializing (retry)
//!
//! - Load + index build runs in a detached task; callers only wait on its outcome,
//!   so a caller giving up never cancels the build / 初始化在独立任务中运行
//! - Concurrent first callers share a single in-flight build
//! - A failed build leaves nothing behind, the next caller retries
//! - Once ready, queries are lock-free reads over the immutable index

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::watch;

use super::error::LoadError;
use super::index::{IndexStats, TermIndex};
use super::loader::{self, DictionarySource};
use super::schema::{HpoTerm, ScoredTerm, SearchOptions};
use crate::config;

/// Global engine instance, dictionary location taken from config / 全局引擎实例
static ENGINE: Lazy<HpoSearchEngine> =
    Lazy::new(|| HpoSearchEngine::new(config::config().dictionary_source()));

/// Outcome of one build attempt, `None` while it runs
type BuildOutcome = Option<Result<(), LoadError>>;

/// Engine lifecycle state / 引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// Engine status snapshot / 引擎状态快照
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub index: Option<IndexStats>,
    /// Dictionary loads attempted so far / 已尝试加载次数
    pub loads: usize,
    pub last_error: Option<String>,
}

/// HPO term search engine / HPO 术语搜索引擎
pub struct HpoSearchEngine {
    inner: Arc<EngineInner>,
}

/// State shared with the build task / 与构建任务共享的状态
struct EngineInner {
    source: DictionarySource,
    index: OnceCell<TermIndex>,
    /// Never `Ready`: readiness is the index being present
    state: RwLock<EngineState>,
    last_error: RwLock<Option<String>>,
    loads: AtomicUsize,
    /// Receiver of the running build, if any / 正在进行的构建
    in_flight: Mutex<Option<watch::Receiver<BuildOutcome>>>,
}

impl HpoSearchEngine {
    /// Create an independent engine / 创建独立引擎实例
    pub fn new(source: DictionarySource) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                source,
                index: OnceCell::new(),
                state: RwLock::new(EngineState::Uninitialized),
                last_error: RwLock::new(None),
                loads: AtomicUsize::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Process-wide engine / 获取全局引擎
    pub fn instance() -> &'static HpoSearchEngine {
        &ENGINE
    }

    pub fn source(&self) -> &DictionarySource {
        &self.inner.source
    }

    pub fn state(&self) -> EngineState {
        if self.inner.index.get().is_some() {
            EngineState::Ready
        } else {
            *self.inner.state.read()
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state(),
            index: self.inner.index.get().map(TermIndex::stats),
            loads: self.inner.loads.load(Ordering::SeqCst),
            last_error: self.inner.last_error.read().clone(),
        }
    }

    /// Load the dictionary and build indexes; no-op once ready / 初始化（幂等）
    pub async fn initialize(&self) -> Result<(), LoadError> {
        self.ready_index().await.map(|_| ())
    }

    async fn ready_index(&self) -> Result<&TermIndex, LoadError> {
        if let Some(index) = self.inner.index.get() {
            return Ok(index);
        }

        let mut outcome = self.join_or_start_build();
        let finished = outcome.wait_for(Option::is_some).await.map(|done| (*done).clone());
        let finished = match finished {
            Ok(finished) => finished,
            Err(_) => {
                // Sender dropped without reporting: the task panicked
                let mut in_flight = self.inner.in_flight.lock();
                if in_flight.as_ref().is_some_and(|rx| rx.same_channel(&outcome)) {
                    *in_flight = None;
                    *self.inner.state.write() = EngineState::Failed;
                }
                None
            }
        };

        match finished {
            Some(Ok(())) => self
                .inner
                .index
                .get()
                .ok_or_else(|| LoadError::Task("index missing after build".to_string())),
            Some(Err(e)) => Err(e),
            None => Err(LoadError::Task("index build task exited".to_string())),
        }
    }

    /// Subscribe to the running build, starting one if none is in flight
    fn join_or_start_build(&self) -> watch::Receiver<BuildOutcome> {
        let mut in_flight = self.inner.in_flight.lock();

        // The build task stores the index before clearing `in_flight`
        if self.inner.index.get().is_some() {
            return watch::channel(Some(Ok(()))).1;
        }
        if let Some(outcome) = in_flight.as_ref() {
            return outcome.clone();
        }

        let (tx, rx) = watch::channel(None);
        *in_flight = Some(rx.clone());
        *self.inner.state.write() = EngineState::Initializing;
        self.inner.loads.fetch_add(1, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.build().await;
            *inner.in_flight.lock() = None;
            let _ = tx.send(Some(result));
        });

        rx
    }

    /// Search terms / 搜索HPO术语
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<HpoTerm>, LoadError> {
        Ok(self.ready_index().await?.search(query, options))
    }

    /// Search terms, keeping scores / 带分数搜索
    pub async fn search_scored(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredTerm>, LoadError> {
        Ok(self.ready_index().await?.search_scored(query, options))
    }

    /// Term by id / 根据ID获取术语
    pub async fn get_term(&self, id: &str) -> Result<Option<HpoTerm>, LoadError> {
        Ok(self.ready_index().await?.get(id).cloned())
    }

    /// Terms by ids, input order kept, unknown ids dropped / 批量获取术语
    pub async fn get_terms<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<HpoTerm>, LoadError> {
        let index = self.ready_index().await?;
        Ok(ids
            .iter()
            .filter_map(|id| index.get(id.as_ref()).cloned())
            .collect())
    }

    /// Related terms for downstream context (over-fetch then truncate) / 查找相关术语
    ///
    /// Terms whose accumulated score is below `min_relevance_score` are dropped.
    pub async fn find_relevant_terms(
        &self,
        input: &str,
        max_terms: usize,
        min_relevance_score: f64,
    ) -> Result<Vec<HpoTerm>, LoadError> {
        let options = SearchOptions::new()
            .with_limit(max_terms.saturating_mul(2))
            .include_definitions(true);

        let results = self.search_scored(input, &options).await?;
        Ok(results
            .into_iter()
            .filter(|scored| f64::from(scored.score) >= min_relevance_score)
            .take(max_terms)
            .map(|scored| scored.term)
            .collect())
    }
}

impl EngineInner {
    async fn build(&self) -> Result<(), LoadError> {
        tracing::info!("Building HPO search index from {:?}", self.source.terms_file);
        let start = Instant::now();

        match self.load_index().await {
            Ok(index) => {
                tracing::info!(
                    "HPO index built in {}ms, {} terms indexed",
                    start.elapsed().as_millis(),
                    index.len()
                );
                *self.last_error.write() = None;
                let _ = self.index.set(index);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to initialize HPO search engine: {}", e);
                *self.last_error.write() = Some(e.to_string());
                *self.state.write() = EngineState::Failed;
                Err(e)
            }
        }
    }

    /// Async read, then parse + build off the runtime threads
    async fn load_index(&self) -> Result<TermIndex, LoadError> {
        let raw = loader::read_sources(&self.source).await?;
        tokio::task::spawn_blocking(move || loader::parse_sources(raw).map(TermIndex::build))
            .await
            .map_err(|e| LoadError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    const SAMPLE: &str = r#"{
        "HP:0001250": {
            "id": "HP:0001250",
            "name": "Seizure",
            "definition": "A seizure is an intermittent abnormality of nervous system physiology.",
            "name_cn": "癫痫发作",
            "definition_cn": "癫痫发作是神经系统生理的间歇性异常。"
        },
        "HP:0000252": {
            "id": "HP:0000252",
            "name": "Microcephaly",
            "definition": "Head circumference below 2 standard deviations below the mean.",
            "name_cn": "小头畸形",
            "definition_cn": "头围低于平均值2个标准差以下。"
        },
        "HP:0000256": {
            "id": "HP:0000256",
            "name": "Macrocephaly",
            "definition": "",
            "name_cn": "大头畸形",
            "definition_cn": ""
        }
    }"#;

    fn write_dictionary(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("hpo_terms_cn.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn sample_engine(dir: &Path) -> HpoSearchEngine {
        HpoSearchEngine::new(DictionarySource::new(write_dictionary(dir, SAMPLE)))
    }

    fn ids(terms: &[HpoTerm]) -> Vec<&str> {
        terms.iter().map(|t| t.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_lazy_initialization_on_search() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());
        assert_eq!(engine.state(), EngineState::Uninitialized);

        let results = engine.search("Seizure", &SearchOptions::default()).await.unwrap();
        assert_eq!(results[0].id, "HP:0001250");
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.status().index.unwrap().term_count, 3);
    }

    #[tokio::test]
    async fn test_scenario_queries() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());
        let options = SearchOptions::default();

        let results = engine.search("Seizure", &options).await.unwrap();
        assert_eq!(ids(&results), vec!["HP:0001250"]);

        let results = engine.search("hp:0000252", &options).await.unwrap();
        assert_eq!(ids(&results), vec!["HP:0000252"]);

        let results = engine.search("xyzxyz-not-a-term", &options).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());

        engine.initialize().await.unwrap();
        let first = engine.status().index;
        engine.initialize().await.unwrap();
        engine.search("seizure", &SearchOptions::default()).await.unwrap();

        assert_eq!(engine.status().loads, 1);
        assert_eq!(engine.status().index, first);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_initialize_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(sample_engine(dir.path()));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        engine.initialize().await.map(|_| 0)
                    } else {
                        engine
                            .search("micro", &SearchOptions::default())
                            .await
                            .map(|r| r.len())
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let status = engine.status();
        assert_eq!(status.loads, 1);
        assert_eq!(status.state, EngineState::Ready);
        assert_eq!(status.index.unwrap().term_count, 3);
    }

    #[tokio::test]
    async fn test_abandoned_first_search_still_builds_once() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());

        // The caller gives up before the build can run
        let abandoned = tokio::time::timeout(
            Duration::ZERO,
            engine.search("micro", &SearchOptions::default()),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(engine.state(), EngineState::Initializing);
        assert_eq!(engine.status().loads, 1);

        for _ in 0..500 {
            if engine.state() != EngineState::Initializing {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let status = engine.status();
        assert_eq!(status.state, EngineState::Ready);
        assert_eq!(status.index.unwrap().term_count, 3);

        let results = engine.search("micro", &SearchOptions::default()).await.unwrap();
        assert_eq!(ids(&results), vec!["HP:0000252"]);
        assert_eq!(engine.status().loads, 1);
    }

    #[tokio::test]
    async fn test_ready_only_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());

        engine.initialize().await.unwrap();
        let status = engine.status();
        assert_eq!(status.state, EngineState::Ready);
        assert!(status.index.is_some());
    }

    #[tokio::test]
    async fn test_failed_load_can_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hpo_terms_cn.json");
        let engine = HpoSearchEngine::new(DictionarySource::new(&path));

        let err = engine.initialize().await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert_eq!(engine.state(), EngineState::Failed);
        assert!(engine.status().last_error.is_some());
        assert!(engine.status().index.is_none());

        let err = engine.search("seizure", &SearchOptions::default()).await;
        assert!(err.is_err());

        write_dictionary(dir.path(), SAMPLE);
        let results = engine.search("seizure", &SearchOptions::default()).await.unwrap();
        assert_eq!(results[0].id, "HP:0001250");
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.status().loads, 3);
        assert!(engine.status().last_error.is_none());
    }

    #[tokio::test]
    async fn test_malformed_dictionary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_dictionary(dir.path(), "{ broken");
        let engine = HpoSearchEngine::new(DictionarySource::new(path));

        let err = engine.initialize().await.unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
        assert_eq!(engine.state(), EngineState::Failed);
    }

    #[tokio::test]
    async fn test_get_term() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());

        let term = engine.get_term("HP:0000252").await.unwrap().unwrap();
        assert_eq!(term.name, "Microcephaly");
        assert!(engine.get_term("HP:9999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_terms_order_and_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());

        let terms = engine
            .get_terms(&["HP:0000256", "UNKNOWN", "HP:0001250"])
            .await
            .unwrap();
        assert_eq!(ids(&terms), vec!["HP:0000256", "HP:0001250"]);
    }

    #[tokio::test]
    async fn test_find_relevant_terms() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());

        let terms = engine.find_relevant_terms("cephaly head", 1, 0.0).await.unwrap();
        assert_eq!(ids(&terms), vec!["HP:0000252"]);

        // "head" keyword only scores 2 for microcephaly; prefix matches none
        let terms = engine.find_relevant_terms("head", 12, 2.0).await.unwrap();
        assert_eq!(ids(&terms), vec!["HP:0000252"]);
        let terms = engine.find_relevant_terms("head", 12, 3.0).await.unwrap();
        assert!(terms.is_empty());

        // exact id always passes the threshold
        let terms = engine.find_relevant_terms("HP:0000256", 12, 100.0).await.unwrap();
        assert_eq!(ids(&terms), vec!["HP:0000256"]);
    }

    #[tokio::test]
    async fn test_find_relevant_terms_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sample_engine(dir.path());

        let terms = engine.find_relevant_terms("ma mi", 1, 0.0).await.unwrap();
        assert_eq!(terms.len(), 1);
        let terms = engine.find_relevant_terms("ma mi", 5, 0.0).await.unwrap();
        assert_eq!(ids(&terms), vec!["HP:0000252", "HP:0000256"]);
    }
}
