//! Term dictionary loader / 术语词典加载器
//!
//! Sources / 数据源：
//! - JSON object keyed by term id (`hpo_terms_cn.json`)
//! - OBO flat file (`hp.obo`, English only)
//! - Overlay files merged over the base by id, later files win / 叠加文件

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use super::error::LoadError;
use super::schema::HpoTerm;

/// Term id -> term record, ordered by id / 术语词典
pub type Dictionary = BTreeMap<String, HpoTerm>;

/// Where the dictionary comes from / 词典来源
#[derive(Debug, Clone)]
pub struct DictionarySource {
    pub terms_file: PathBuf,
    pub overlay_files: Vec<PathBuf>,
}

impl DictionarySource {
    pub fn new(terms_file: impl Into<PathBuf>) -> Self {
        Self {
            terms_file: terms_file.into(),
            overlay_files: Vec::new(),
        }
    }

    pub fn with_overlay(mut self, path: impl Into<PathBuf>) -> Self {
        self.overlay_files.push(path.into());
        self
    }

    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.terms_file).chain(self.overlay_files.iter())
    }
}

/// Raw file contents, in merge order / 原始文件内容
pub struct RawSources {
    primary: PathBuf,
    files: Vec<(PathBuf, String)>,
}

/// Entry as found on disk, before validation
#[derive(Debug, Deserialize)]
struct RawTerm {
    id: Option<String>,
    name: Option<String>,
    definition: Option<String>,
    name_cn: Option<String>,
    definition_cn: Option<String>,
}

/// Read every source file (async I/O) / 读取所有数据源
pub async fn read_sources(source: &DictionarySource) -> Result<RawSources, LoadError> {
    let mut files = Vec::new();
    for path in source.paths() {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.clone())
            } else {
                LoadError::Io {
                    path: path.clone(),
                    source: Arc::new(e),
                }
            }
        })?;
        files.push((path.clone(), content));
    }

    Ok(RawSources {
        primary: source.terms_file.clone(),
        files,
    })
}

/// Parse and merge raw sources into a dictionary / 解析并合并词典
pub fn parse_sources(raw: RawSources) -> Result<Dictionary, LoadError> {
    let mut dictionary = Dictionary::new();

    for (path, content) in &raw.files {
        let terms = parse_terms(path, content)?;
        tracing::debug!("Parsed {} terms from {:?}", terms.len(), path);
        for term in terms {
            dictionary.insert(term.id.clone(), term);
        }
    }

    if dictionary.is_empty() {
        return Err(LoadError::Empty(raw.primary));
    }
    Ok(dictionary)
}

/// Load dictionary from source / 加载词典
pub async fn load(source: &DictionarySource) -> Result<Dictionary, LoadError> {
    let raw = read_sources(source).await?;
    parse_sources(raw)
}

/// Parse one file, format chosen by extension / 按扩展名解析
pub fn parse_terms(path: &Path, content: &str) -> Result<Vec<HpoTerm>, LoadError> {
    let is_obo = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("obo"))
        .unwrap_or(false);

    if is_obo {
        Ok(parse_obo(content))
    } else {
        parse_json(path, content)
    }
}

/// Parse JSON object `{ "HP:xxxxxxx": { ... } }` / 解析 JSON 词典
fn parse_json(path: &Path, content: &str) -> Result<Vec<HpoTerm>, LoadError> {
    let entries: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(content).map_err(|e| LoadError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut terms = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let raw: RawTerm = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping malformed entry {}: {}", key, e);
                continue;
            }
        };
        match validate(Some(&key), raw) {
            Ok(term) => terms.push(term),
            Err(reason) => tracing::warn!("Skipping entry {}: {}", key, reason),
        }
    }

    Ok(terms)
}

/// Parse OBO `[Term]` stanzas (id / name / def) / 解析 OBO 文件
fn parse_obo(content: &str) -> Vec<HpoTerm> {
    let mut raws = Vec::new();
    let mut current: Option<RawTerm> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with('[') {
            raws.extend(current.take());
            if line == "[Term]" {
                current = Some(RawTerm {
                    id: None,
                    name: None,
                    definition: None,
                    name_cn: None,
                    definition_cn: None,
                });
            }
            continue;
        }

        let Some(term) = current.as_mut() else {
            continue;
        };

        if line.is_empty() {
            raws.extend(current.take());
        } else if let Some(id) = line.strip_prefix("id: ") {
            term.id = Some(id.trim().to_string());
        } else if let Some(name) = line.strip_prefix("name: ") {
            term.name = Some(name.trim().to_string());
        } else if let Some(def) = line.strip_prefix("def: ") {
            term.definition = def.split('"').nth(1).map(str::to_string);
        }
    }
    raws.extend(current);

    raws.into_iter()
        .filter_map(|raw| {
            let label = raw.id.clone().unwrap_or_default();
            validate(None, raw)
                .map_err(|reason| tracing::warn!("Skipping OBO term {}: {}", label, reason))
                .ok()
        })
        .collect()
}

/// Fixed-shape record: all five fields present, id well formed / 校验记录
fn validate(key: Option<&str>, raw: RawTerm) -> Result<HpoTerm, String> {
    let id = match (raw.id.filter(|id| !id.is_empty()), key) {
        (Some(id), Some(key)) if id != key => {
            return Err(format!("id {} does not match key", id));
        }
        (Some(id), _) => id,
        (None, Some(key)) => key.to_string(),
        (None, None) => return Err("missing id".to_string()),
    };

    if !HpoTerm::is_valid_id(&id) {
        return Err(format!("invalid id {}", id));
    }

    let name = raw.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err("missing name".to_string());
    }

    Ok(HpoTerm {
        id,
        name,
        definition: raw.definition.unwrap_or_default(),
        name_cn: raw.name_cn.unwrap_or_default(),
        definition_cn: raw.definition_cn.unwrap_or_default(),
    })
}
