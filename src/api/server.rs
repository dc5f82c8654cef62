use axum::{
    extract::State,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;
use crate::api::ApiResponse;
use hpo_search::search::EngineStatus;

/// GET /api/health - 健康检查
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "HPO search service is running",
        "version": env!("CARGO_PKG_VERSION"),
        "build_time": env!("BUILD_TIME"),
    }))
}

/// GET /api/status - 搜索引擎状态
pub async fn get_engine_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<EngineStatus>> {
    Json(ApiResponse::success(state.engine.status()))
}
