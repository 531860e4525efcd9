use crate::db::{write_csv, SnapshotRepository};
use crate::error::Result;
use crate::extraction::Extractor;
use crate::models::{
    AuditedDocument, BaselineMap, DashboardStats, FlagUpdate, HistoryTab, SupplierSummary,
};
use crate::service::ledger::AuditLedger;
use crate::service::stats;
use bigdecimal::BigDecimal;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// 审计服务: 账本的唯一写入方.
///
/// 所有命令在同一把锁内完成 "暂存修改 -> 整体保存 -> 提交内存",
/// 保存失败时内存与存储都保持修改前的状态.
pub struct AuditService {
    pub(crate) ledger: Mutex<AuditLedger>,
    pub(crate) repository: Arc<dyn SnapshotRepository>,
    pub(crate) extractor: Arc<dyn Extractor>,
    pub(crate) extraction_concurrency: usize,
}

impl AuditService {
    /// 从存储加载快照并创建服务
    pub async fn open(
        repository: Arc<dyn SnapshotRepository>,
        extractor: Arc<dyn Extractor>,
        extraction_concurrency: usize,
    ) -> Result<Self> {
        let snapshot = repository.load().await?;
        tracing::info!(
            "Audit ledger opened: {} documents, {} baselines across {} suppliers",
            snapshot.documents.len(),
            snapshot.baselines.len(),
            snapshot.baselines.supplier_count()
        );

        Ok(Self {
            ledger: Mutex::new(AuditLedger::new(snapshot)),
            repository,
            extractor,
            extraction_concurrency: extraction_concurrency.max(1),
        })
    }

    /// 在暂存副本上执行命令; 有修改则整体保存后提交
    pub(crate) async fn commit<T>(
        &self,
        command: impl FnOnce(&mut AuditLedger) -> Result<T>,
    ) -> Result<T> {
        let mut ledger = self.ledger.lock().await;
        let mut staged = ledger.clone();
        let output = command(&mut staged)?;

        if staged.version() != ledger.version() {
            self.repository.save(staged.snapshot()).await?;
            *ledger = staged;
        }
        Ok(output)
    }

    /// 人工修正基准价 (对所有历史单据追溯生效)
    pub async fn update_baseline(&self, supplier: &str, item: &str, price: BigDecimal) -> Result<()> {
        let previous = self
            .commit(|ledger| ledger.update_baseline(supplier, item, price.clone()))
            .await?;

        match previous {
            Some(old) => tracing::info!(
                "[Baseline] {}/{}: {} -> {}",
                supplier, item, old, price
            ),
            None => tracing::info!("[Baseline] {}/{}: set to {}", supplier, item, price),
        }
        Ok(())
    }

    /// 删除单据, 不存在时为空操作
    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let removed = self.commit(|ledger| Ok(ledger.delete_document(id))).await?;
        if removed {
            tracing::info!("Document {} discarded", id);
        } else {
            tracing::debug!("Document {} not found, nothing to discard", id);
        }
        Ok(removed)
    }

    /// 更新付款 / 挂起标记, 不存在时为空操作
    pub async fn set_flags(&self, id: Uuid, update: FlagUpdate) -> Result<bool> {
        let changed = self.commit(|ledger| Ok(ledger.set_flags(id, update))).await?;
        if changed {
            tracing::info!("Document {} flags updated: {:?}", id, update);
        }
        Ok(changed)
    }

    /// 审计视图 (按日期降序)
    pub async fn enriched_view(&self) -> Arc<Vec<AuditedDocument>> {
        self.ledger.lock().await.enriched_view()
    }

    pub async fn history(&self, tab: HistoryTab) -> Vec<AuditedDocument> {
        stats::filter_tab(&self.enriched_view().await, tab)
    }

    pub async fn document(&self, id: Uuid) -> Option<AuditedDocument> {
        self.enriched_view()
            .await
            .iter()
            .find(|doc| doc.header.id == id)
            .cloned()
    }

    pub async fn stats(&self) -> DashboardStats {
        stats::dashboard_stats(&self.enriched_view().await)
    }

    pub async fn high_risk(&self) -> Vec<AuditedDocument> {
        stats::high_risk(&self.enriched_view().await)
    }

    pub async fn supplier_summaries(&self) -> Vec<SupplierSummary> {
        stats::supplier_summaries(&self.enriched_view().await)
    }

    /// 基准价登记表副本
    pub async fn baselines(&self) -> BaselineMap {
        self.ledger.lock().await.baselines().clone()
    }

    pub async fn export_csv<W: Write>(&self, output: W) -> Result<()> {
        let view = self.enriched_view().await;
        write_csv(&view, output)
    }
}
