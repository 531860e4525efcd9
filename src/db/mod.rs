pub mod export;
pub mod pool;
pub mod queries;
pub mod schema;
pub mod snapshot;

pub use export::write_csv;
pub use pool::create_pool;
pub use queries::PgSnapshotRepository;
pub use schema::ensure_schema;
pub use snapshot::{MemorySnapshotRepository, SnapshotRepository};
