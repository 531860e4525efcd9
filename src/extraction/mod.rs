pub mod http;

use crate::error::Result;
use crate::models::ExtractedRecord;
use async_trait::async_trait;

pub use http::HttpExtractor;

/// 票据识别协作方: 输入文件内容与声明的媒体类型, 输出结构化记录
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, content: Vec<u8>, media_type: &str) -> Result<ExtractedRecord>;
}
