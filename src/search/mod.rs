//! HPO term search module - in-memory bilingual term lookup / HPO 术语搜索模块
//!
//! Architecture / 架构：
//! - loader: reads the term dictionary once per process / 词典加载
//! - index: builds id / prefix / keyword indexes and ranks queries / 索引与排序
//! - engine: singleton lifecycle, lazy one-shot initialization / 单例生命周期
//! - lookup: direct search entry point (phrase or medical record) / 直接检索
//!
//! Index features / 索引特性：
//! - Exact HPO id lookup (case-insensitive)
//! - English and Chinese name prefix matching
//! - Bilingual keyword matching over names and definitions
//! - Optional definition full-text fallback for long queries

pub mod engine;
pub mod error;
pub mod index;
pub mod loader;
pub mod lookup;
pub mod schema;
pub mod tokenizer;

pub use engine::{EngineState, EngineStatus, HpoSearchEngine};
pub use error::LoadError;
pub use index::{IndexStats, TermIndex};
pub use loader::{Dictionary, DictionarySource};
pub use lookup::LookupOptions;
pub use schema::{HpoTerm, LookupHit, ScoredTerm, SearchOptions};
