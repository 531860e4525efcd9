pub mod handlers;

use crate::service::AuditService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;

pub use handlers::*;

/// 批量上传请求体上限
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// 构建全部路由
pub fn router(service: Arc<AuditService>) -> Router {
    let documents = Router::new()
        .route("/api/documents", get(list_documents).post(ingest_document))
        .route(
            "/api/documents/upload",
            post(upload_documents).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/documents/:id", get(get_document).delete(delete_document))
        .route("/api/documents/:id/flags", patch(update_flags));

    let baselines = Router::new()
        .route("/api/baselines", get(list_baselines))
        .route("/api/baselines/:supplier/:item", put(update_baseline));

    let reports = Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/stats/high-risk", get(get_high_risk))
        .route("/api/suppliers", get(list_suppliers))
        .route("/api/export.csv", get(export_csv));

    Router::new()
        .route("/health", get(health_check))
        .merge(documents)
        .merge(baselines)
        .merge(reports)
        .with_state(service)
}
