pub mod audit;
pub mod classifier;
pub mod enrichment;
pub mod ingestion;
pub mod ledger;
pub mod stats;

pub use audit::AuditService;
pub use ingestion::{Upload, UploadOutcome, UploadStatus};
pub use ledger::AuditLedger;
