//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::search::{DictionarySource, LookupOptions};

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Environment override for the dictionary file / 词典文件环境变量
pub const TERMS_FILE_ENV: &str = "HPO_TERMS_FILE";

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Dictionary configuration / 词典配置
    #[serde(default)]
    pub dictionary: DictionaryConfig,
    /// Search configuration / 搜索配置
    #[serde(default)]
    pub search: SearchConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Dictionary configuration / 词典配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Term dictionary file (JSON or OBO) / 术语词典文件
    pub terms_file: String,
    /// Files merged over the base dictionary, later wins / 叠加词典文件
    #[serde(default)]
    pub overlay_files: Vec<String>,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default max results / 默认最大结果数
    pub max_results: usize,
    /// Related terms returned to downstream consumers / 相关术语数量
    pub relevant_max_terms: usize,
    /// Minimum score for related terms / 相关术语最低分数
    pub min_relevance_score: f64,
    /// Max results per medical-record segment / 每个分词最大结果数
    pub segment_result_limit: usize,
    /// Max merged results for a medical record / 病历合并结果数
    pub segment_total_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8180,
        }
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            terms_file: "public/hpo_terms_cn.json".to_string(),
            overlay_files: Vec::new(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            relevant_max_terms: 12,
            min_relevance_score: 2.0,
            segment_result_limit: 20,
            segment_total_limit: 50,
        }
    }
}

impl AppConfig {
    /// Dictionary source, `HPO_TERMS_FILE` overrides the base file / 获取词典来源
    pub fn dictionary_source(&self) -> DictionarySource {
        let terms_file = std::env::var(TERMS_FILE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.dictionary.terms_file.clone());

        self.dictionary
            .overlay_files
            .iter()
            .fold(DictionarySource::new(terms_file), |source, overlay| {
                source.with_overlay(overlay)
            })
    }

    /// Direct lookup limits / 直接检索限制
    pub fn lookup_options(&self) -> LookupOptions {
        LookupOptions {
            phrase_limit: self.search.max_results,
            segment_limit: self.search.segment_result_limit,
            total_limit: self.search.segment_total_limit,
        }
    }

    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    let config_path = get_config_path();

    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(&config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig) -> Result<(), String> {
    let config_path = get_config_path();

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(&config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

/// Initialize global configuration / 初始化全局配置
pub fn init_config() -> Result<Arc<RwLock<AppConfig>>, String> {
    let config = load_config()?;

    let config_arc = Arc::new(RwLock::new(config));

    CONFIG
        .set(config_arc.clone())
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(config_arc)
}

/// Get global configuration instance / 获取全局配置实例
pub fn get_config() -> Arc<RwLock<AppConfig>> {
    CONFIG
        .get_or_init(|| {
            let config = load_config().unwrap_or_else(|e| {
                tracing::warn!("Using default configuration: {}", e);
                AppConfig::default()
            });
            Arc::new(RwLock::new(config))
        })
        .clone()
}

/// Get a read-only snapshot of current config / 获取当前配置的只读快照
pub fn config() -> AppConfig {
    get_config().read().clone()
}
