use crate::error::AuditError;
use crate::models::{AuditedDocument, ExtractedRecord, FlagUpdate, HistoryTab, RawNumber};
use crate::service::{AuditService, Upload, UploadOutcome, UploadStatus};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// 未声明类型时按 PDF 处理
const DEFAULT_MEDIA_TYPE: &str = "application/pdf";

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// 批量上传响应体 (含逐个文件结果)
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub outcomes: Vec<UploadOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub tab: Option<HistoryTab>,
}

/// 基准价修正请求体
#[derive(Debug, Deserialize)]
pub struct BaselineUpdateRequest {
    pub price: RawNumber,
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuditError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuditError::Extraction(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ApiResponse::failure(format!("Error: {}", self)))).into_response()
    }
}

/// 请求体 / 路径 / 查询参数解析失败, 保留 axum 的状态码, 以统一响应体返回
pub struct ApiRejection(StatusCode, String);

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        let ApiRejection(status, detail) = self;
        (
            status,
            Json(ApiResponse::failure(format!("Invalid request: {}", detail))),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiRejection {
    fn from(e: JsonRejection) -> Self {
        ApiRejection(e.status(), e.body_text())
    }
}

impl From<PathRejection> for ApiRejection {
    fn from(e: PathRejection) -> Self {
        ApiRejection(e.status(), e.body_text())
    }
}

impl From<QueryRejection> for ApiRejection {
    fn from(e: QueryRejection) -> Self {
        ApiRejection(e.status(), e.body_text())
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 审计视图, 可按分栏过滤
pub async fn list_documents(
    State(service): State<Arc<AuditService>>,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    let documents: Vec<AuditedDocument> = match query.tab {
        Some(tab) => service.history(tab).await,
        None => service.enriched_view().await.as_ref().clone(),
    };
    (StatusCode::OK, Json(documents)).into_response()
}

pub async fn get_document(
    State(service): State<Arc<AuditService>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(path) => path,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    match service.document(id).await {
        Some(doc) => (StatusCode::OK, Json(doc)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failure(format!("Document {} not found", id))),
        )
            .into_response(),
    }
}

/// 入账已识别的 JSON 记录
pub async fn ingest_document(
    State(service): State<Arc<AuditService>>,
    record: Result<Json<ExtractedRecord>, JsonRejection>,
) -> Response {
    let Json(record) = match record {
        Ok(body) => body,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    match service.ingest(record, None).await {
        Ok(doc) => (StatusCode::CREATED, Json(doc)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// multipart 批量上传, 每个文件字段经识别服务后逐个入账
pub async fn upload_documents(
    State(service): State<Arc<AuditService>>,
    mut multipart: Multipart,
) -> Response {
    let mut uploads = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::failure(format!("Invalid upload: {}", e))),
                )
                    .into_response()
            }
        };

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}", uploads.len() + 1));
        let media_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

        match field.bytes().await {
            Ok(bytes) => uploads.push(Upload {
                file_name,
                media_type,
                content: bytes.to_vec(),
            }),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::failure(format!("Failed to read {}: {}", file_name, e))),
                )
                    .into_response()
            }
        }
    }

    if uploads.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failure("No files uploaded")),
        )
            .into_response();
    }

    let total = uploads.len();
    let outcomes = service.ingest_uploads(uploads).await;
    let processed = outcomes
        .iter()
        .filter(|o| o.status == UploadStatus::Processed)
        .count();

    let response = UploadResponse {
        success: processed == total,
        message: format!("Processed {} of {} documents", processed, total),
        outcomes,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 删除单据 (幂等)
pub async fn delete_document(
    State(service): State<Arc<AuditService>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(path) => path,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    match service.delete_document(id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// 更新付款 / 挂起标记 (幂等)
pub async fn update_flags(
    State(service): State<Arc<AuditService>>,
    id: Result<Path<Uuid>, PathRejection>,
    update: Result<Json<FlagUpdate>, JsonRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(path) => path,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    let Json(update) = match update {
        Ok(body) => body,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    match service.set_flags(id, update).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_baselines(State(service): State<Arc<AuditService>>) -> Response {
    (StatusCode::OK, Json(service.baselines().await)).into_response()
}

/// 人工修正基准价
pub async fn update_baseline(
    State(service): State<Arc<AuditService>>,
    path: Result<Path<(String, String)>, PathRejection>,
    req: Result<Json<BaselineUpdateRequest>, JsonRejection>,
) -> Response {
    let Path((supplier, item)) = match path {
        Ok(path) => path,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    let Json(req) = match req {
        Ok(body) => body,
        Err(e) => return ApiRejection::from(e).into_response(),
    };
    let price = match req.price.to_decimal("price") {
        Ok(price) => price,
        Err(e) => return e.into_response(),
    };

    match service.update_baseline(&supplier, &item, price).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_stats(State(service): State<Arc<AuditService>>) -> Response {
    (StatusCode::OK, Json(service.stats().await)).into_response()
}

pub async fn get_high_risk(State(service): State<Arc<AuditService>>) -> Response {
    (StatusCode::OK, Json(service.high_risk().await)).into_response()
}

pub async fn list_suppliers(State(service): State<Arc<AuditService>>) -> Response {
    (StatusCode::OK, Json(service.supplier_summaries().await)).into_response()
}

/// CSV 导出
pub async fn export_csv(State(service): State<Arc<AuditService>>) -> Response {
    let mut buffer = Vec::new();
    match service.export_csv(&mut buffer).await {
        Ok(()) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"audit.csv\""),
            ],
            buffer,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
