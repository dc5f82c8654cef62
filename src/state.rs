use hpo_search::config::AppConfig;
use hpo_search::search::HpoSearchEngine;

/// Shared handler state / 共享状态
pub struct AppState {
    /// Process-wide search engine / 全局搜索引擎
    pub engine: &'static HpoSearchEngine,
    /// Config snapshot taken at startup / 启动时配置快照
    pub config: AppConfig,
}
