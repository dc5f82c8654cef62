use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::state::AppState;
use crate::api::ApiResponse;
use hpo_search::search::{HpoTerm, LookupHit, SearchOptions};
use super::types::*;

/// GET /api/query - 直接检索（短语或病历文本）
pub async fn query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<ApiResponse<Vec<LookupHit>>> {
    let options = state.config.lookup_options();

    match state.engine.lookup(&params.q, &options).await {
        Ok(hits) => {
            tracing::debug!("Lookup {:?} returned {} hits", params.q, hits.len());
            Json(ApiResponse::success(hits))
        }
        Err(e) => {
            tracing::error!("Lookup failed: {}", e);
            Json(ApiResponse::unavailable(&e.to_string()))
        }
    }
}

/// GET /api/search - 排序搜索
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<ApiResponse<Vec<HpoTerm>>> {
    let max_results = params.max_results.unwrap_or(state.config.search.max_results);
    if max_results == 0 {
        return Json(ApiResponse::error("max_results must be positive"));
    }

    let options = SearchOptions::new()
        .with_limit(max_results)
        .include_definitions(params.include_definitions);

    match state.engine.search(&params.q, &options).await {
        Ok(terms) => Json(ApiResponse::success(terms)),
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            Json(ApiResponse::unavailable(&e.to_string()))
        }
    }
}

/// GET /api/terms/:id - 根据ID获取术语
pub async fn get_term(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ApiResponse<HpoTerm>> {
    match state.engine.get_term(&id).await {
        Ok(Some(term)) => Json(ApiResponse::success(term)),
        Ok(None) => Json(ApiResponse::not_found(&format!("Term {} not found", id))),
        Err(e) => Json(ApiResponse::unavailable(&e.to_string())),
    }
}

/// POST /api/terms - 批量获取术语
pub async fn get_terms(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TermsRequest>,
) -> Json<ApiResponse<Vec<HpoTerm>>> {
    match state.engine.get_terms(&req.ids).await {
        Ok(terms) => Json(ApiResponse::success(terms)),
        Err(e) => Json(ApiResponse::unavailable(&e.to_string())),
    }
}

/// POST /api/relevant - 查找相关术语（供下游上下文使用）
pub async fn find_relevant_terms(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelevantRequest>,
) -> Json<ApiResponse<Vec<HpoTerm>>> {
    let max_terms = req.max_terms.unwrap_or(state.config.search.relevant_max_terms);
    let min_score = req
        .min_relevance_score
        .unwrap_or(state.config.search.min_relevance_score);

    match state.engine.find_relevant_terms(&req.input, max_terms, min_score).await {
        Ok(terms) => Json(ApiResponse::success(terms)),
        Err(e) => Json(ApiResponse::unavailable(&e.to_string())),
    }
}
