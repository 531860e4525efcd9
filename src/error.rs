use thiserror::Error;

/// 审计服务统一结果类型
pub type Result<T> = std::result::Result<T, AuditError>;

/// 审计服务错误类型
#[derive(Error, Debug)]
pub enum AuditError {
    /// 外部识别服务调用失败 / 返回为空 / 结构无法解析 (仅影响单个文件)
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// 识别结果缺少必填字段或数值非法, 拒绝入库
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 快照读写失败 (非数据库原因, 如存储内容损坏)
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AuditError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuditError::Validation(message.into())
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        AuditError::Extraction(message.into())
    }
}
