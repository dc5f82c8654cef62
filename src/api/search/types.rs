use serde::Deserialize;

/// GET /api/query 参数
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/search 参数
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub include_definitions: bool,
}

/// POST /api/terms 请求
#[derive(Debug, Deserialize)]
pub struct TermsRequest {
    pub ids: Vec<String>,
}

/// POST /api/relevant 请求
#[derive(Debug, Deserialize)]
pub struct RelevantRequest {
    pub input: String,
    #[serde(default)]
    pub max_terms: Option<usize>,
    #[serde(default)]
    pub min_relevance_score: Option<f64>,
}
