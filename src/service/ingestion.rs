use crate::error::Result;
use crate::models::{Document, ExtractedRecord};
use crate::service::audit::AuditService;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// 待识别的上传文件
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub media_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Processed,
    Failed,
}

/// 单个上传文件的处理结果 (失败不影响同批其他文件)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub file_name: String,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadOutcome {
    fn processed(file_name: String, id: Uuid) -> Self {
        Self {
            file_name,
            status: UploadStatus::Processed,
            document_id: Some(id),
            message: None,
        }
    }

    fn failed(file_name: String, message: String) -> Self {
        Self {
            file_name,
            status: UploadStatus::Failed,
            document_id: None,
            message: Some(message),
        }
    }
}

impl AuditService {
    /// 入账单张识别结果: 校验 -> 播种缺失基准价 -> 置顶 -> 与基准价一起保存
    pub async fn ingest(&self, record: ExtractedRecord, file_name: Option<String>) -> Result<Document> {
        let document = match record.into_document(Uuid::new_v4(), file_name) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("[Ingest] record rejected: {}", e);
                return Err(e);
            }
        };

        let id = document.id();
        let supplier = document.supplier_name().to_string();
        let item_count = document.items.len();
        let stored = document.clone();

        let seeded = self.commit(move |ledger| Ok(ledger.ingest(document))).await?;

        tracing::info!(
            "[Ingest] Document {} from {}: {} items, {} new baselines",
            id, supplier, item_count, seeded
        );
        Ok(stored)
    }

    /// 批量上传: 识别可并发, 入账严格按上传顺序逐个执行,
    /// 保证后面的单据能看到前面单据播种的基准价
    pub async fn ingest_uploads(&self, uploads: Vec<Upload>) -> Vec<UploadOutcome> {
        let total = uploads.len();
        tracing::info!(
            "[Upload] Auditing {} files (extraction concurrency {})",
            total, self.extraction_concurrency
        );

        let extractor = Arc::clone(&self.extractor);
        let mut extracted = stream::iter(uploads.into_iter().map(move |upload| {
            let extractor = Arc::clone(&extractor);
            async move {
                let Upload {
                    file_name,
                    media_type,
                    content,
                } = upload;
                let result = extractor.extract(content, &media_type).await;
                (file_name, result)
            }
        }))
        .buffered(self.extraction_concurrency);

        let mut outcomes = Vec::with_capacity(total);
        while let Some((file_name, result)) = extracted.next().await {
            let outcome = match result {
                Ok(record) => match self.ingest(record, Some(file_name.clone())).await {
                    Ok(doc) => UploadOutcome::processed(file_name, doc.id()),
                    Err(e) => UploadOutcome::failed(file_name, e.to_string()),
                },
                Err(e) => {
                    tracing::warn!("[Upload] Failed to audit {}: {}", file_name, e);
                    UploadOutcome::failed(file_name, e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let processed = outcomes
            .iter()
            .filter(|o| o.status == UploadStatus::Processed)
            .count();
        tracing::info!("[Upload] Batch complete: {}/{} processed", processed, total);
        outcomes
    }
}
