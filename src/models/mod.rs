pub mod baseline;
pub mod document;
pub mod extracted;
pub mod snapshot;
pub mod stats;

pub use baseline::BaselineMap;
pub use document::{
    AuditedDocument, AuditedItem, DocType, Document, DocumentHeader, FlagUpdate, LineItem,
    VarianceStatus,
};
pub use extracted::{ExtractedItem, ExtractedRecord, RawNumber};
pub use snapshot::Snapshot;
pub use stats::{DashboardStats, HistoryTab, SupplierSummary};
