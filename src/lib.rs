pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod extraction;
pub mod models;
pub mod service;

#[cfg(test)]
mod test_support;

pub use api::router;
pub use config::AppConfig;
pub use db::create_pool;
pub use error::{AuditError, Result};
pub use service::AuditService;
