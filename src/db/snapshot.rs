use crate::error::{AuditError, Result};
use crate::models::Snapshot;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// 快照持久化: 整体读取 / 整体保存, 单据与基准价在同一次写入中落盘
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn load(&self) -> Result<Snapshot>;

    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// 进程内快照存储 (测试及 storage.in_memory 模式)
#[derive(Default)]
pub struct MemorySnapshotRepository {
    snapshot: RwLock<Snapshot>,
    fail_on_save: RwLock<bool>,
    save_count: AtomicUsize,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    pub async fn set_fail_on_save(&self, fail: bool) {
        *self.fail_on_save.write().await = fail;
    }

    /// 最近一次成功保存的快照
    pub async fn stored(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotRepository for MemorySnapshotRepository {
    async fn load(&self) -> Result<Snapshot> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if *self.fail_on_save.read().await {
            return Err(AuditError::Persistence("in-memory save failure".to_string()));
        }
        *self.snapshot.write().await = snapshot.clone();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
