use crate::config::ExtractionConfig;
use crate::error::{AuditError, Result};
use crate::extraction::Extractor;
use crate::models::ExtractedRecord;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// 通过 HTTP 调用外部识别服务: 原始文件作为请求体, 返回 JSON 记录
pub struct HttpExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AuditError::extraction(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, content: Vec<u8>, media_type: &str) -> Result<ExtractedRecord> {
        let size = content.len();
        let start_time = std::time::Instant::now();

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, media_type)
            .body(content);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuditError::extraction(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::extraction(format!(
                "extraction service answered {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuditError::extraction(format!("failed to read response: {}", e)))?;
        if body.trim().is_empty() {
            return Err(AuditError::extraction("empty response from extraction service"));
        }

        let record = serde_json::from_str::<ExtractedRecord>(&body).map_err(|e| {
            AuditError::extraction(format!("could not parse structured data from document: {}", e))
        })?;

        tracing::debug!(
            "Extracted {} bytes ({}) in {:?}",
            size,
            media_type,
            start_time.elapsed()
        );
        Ok(record)
    }
}
