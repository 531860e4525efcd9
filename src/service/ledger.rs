use crate::error::Result;
use crate::models::{AuditedDocument, BaselineMap, Document, FlagUpdate, Snapshot};
use crate::service::enrichment::enrich;
use bigdecimal::BigDecimal;
use std::sync::Arc;
use uuid::Uuid;

/// 审计账本: 单据集合 + 基准价登记表, 只能通过下列命令修改.
///
/// 每次修改递增 `version`; 审计视图按 version 缓存, 版本变化即失效.
#[derive(Debug, Clone, Default)]
pub struct AuditLedger {
    state: Snapshot,
    version: u64,
    view_cache: Option<(u64, Arc<Vec<AuditedDocument>>)>,
}

impl AuditLedger {
    pub fn new(state: Snapshot) -> Self {
        Self {
            state,
            version: 0,
            view_cache: None,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn documents(&self) -> &[Document] {
        &self.state.documents
    }

    pub fn baselines(&self) -> &BaselineMap {
        &self.state.baselines
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// 入账: 先为每个明细播种基准价 (已存在则跳过), 再将单据置于最前.
    /// 返回本次新播种的基准价数量
    pub fn ingest(&mut self, document: Document) -> usize {
        let mut seeded = 0;
        for item in &document.items {
            if self
                .state
                .baselines
                .seed_if_absent(document.supplier_name(), &item.name, &item.unit_price)
            {
                seeded += 1;
            }
        }

        self.state.documents.insert(0, document);
        self.bump();
        seeded
    }

    /// 人工修正基准价; 之后所有引用该组合的单据在下次读取时重新比对
    pub fn update_baseline(&mut self, supplier: &str, item: &str, price: BigDecimal) -> Result<Option<BigDecimal>> {
        let previous = self.state.baselines.override_price(supplier, item, price)?;
        self.bump();
        Ok(previous)
    }

    /// 删除单据, 不存在时不做修改
    pub fn delete_document(&mut self, id: Uuid) -> bool {
        let before = self.state.documents.len();
        self.state.documents.retain(|doc| doc.id() != id);
        let removed = self.state.documents.len() != before;
        if removed {
            self.bump();
        }
        removed
    }

    /// 更新付款 / 挂起标记. 返回是否有实际变化
    pub fn set_flags(&mut self, id: Uuid, update: FlagUpdate) -> bool {
        let Some(doc) = self.state.documents.iter_mut().find(|doc| doc.id() == id) else {
            return false;
        };

        let mut changed = false;
        if let Some(is_paid) = update.is_paid {
            changed |= doc.header.is_paid != is_paid;
            doc.header.is_paid = is_paid;
        }
        if let Some(is_hold) = update.is_hold {
            changed |= doc.header.is_hold != is_hold;
            doc.header.is_hold = is_hold;
        }
        if changed {
            self.bump();
        }
        changed
    }

    /// 审计视图 (命中缓存时不重新计算)
    pub fn enriched_view(&mut self) -> Arc<Vec<AuditedDocument>> {
        if let Some((version, view)) = &self.view_cache {
            if *version == self.version {
                return Arc::clone(view);
            }
        }

        let view = Arc::new(enrich(&self.state.documents, &self.state.baselines));
        self.view_cache = Some((self.version, Arc::clone(&view)));
        view
    }

    fn bump(&mut self) {
        self.version += 1;
        self.view_cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VarianceStatus;
    use crate::test_support::{dec, document, line};
    use bigdecimal::Zero;

    fn audited(ledger: &mut AuditLedger, id: Uuid) -> AuditedDocument {
        ledger
            .enriched_view()
            .iter()
            .find(|d| d.header.id == id)
            .cloned()
            .unwrap()
    }

    #[test]
    fn first_sighting_seeds_and_reports_no_change() {
        let mut ledger = AuditLedger::default();
        let doc = document("Acme", "2024-01-01", vec![line("Widget", "10"), line("Gadget", "4")]);
        let id = doc.id();

        assert_eq!(ledger.ingest(doc), 2);
        assert_eq!(ledger.baselines().get("Acme", "Widget"), Some(&dec("10")));

        let view = audited(&mut ledger, id);
        assert_eq!(view.status, VarianceStatus::Matched);
        assert!(view.items.iter().all(|i| i.price_change.is_zero()));
        assert_eq!(view.items[0].previous_unit_price, Some(dec("10")));
    }

    #[test]
    fn duplicate_item_in_one_document_seeds_from_first_line() {
        let mut ledger = AuditLedger::default();
        let doc = document("Acme", "2024-01-01", vec![line("Widget", "10"), line("Widget", "11")]);
        let id = doc.id();

        assert_eq!(ledger.ingest(doc), 1);
        let view = audited(&mut ledger, id);
        assert_eq!(view.items[1].price_change, dec("1"));
        assert_eq!(view.status, VarianceStatus::PriceIncrease);
    }

    #[test]
    fn later_documents_see_earlier_seeds() {
        let mut ledger = AuditLedger::default();
        let first = document("Acme", "2024-01-01", vec![line("Widget", "10")]);
        let second = document("Acme", "2024-01-01", vec![line("Widget", "9")]);
        let (first_id, second_id) = (first.id(), second.id());

        ledger.ingest(first);
        assert_eq!(ledger.ingest(second), 0);

        assert_eq!(audited(&mut ledger, first_id).status, VarianceStatus::Matched);
        let second = audited(&mut ledger, second_id);
        assert_eq!(second.status, VarianceStatus::PriceDecrease);
        assert_eq!(second.items[0].percent_change, dec("-10"));
    }

    #[test]
    fn ingest_prepends() {
        let mut ledger = AuditLedger::default();
        let first = document("Acme", "2024-01-01", vec![line("Widget", "10")]);
        let second = document("Acme", "2024-01-01", vec![line("Widget", "10")]);
        let (first_id, second_id) = (first.id(), second.id());
        ledger.ingest(first);
        ledger.ingest(second);

        let ids: Vec<Uuid> = ledger.documents().iter().map(Document::id).collect();
        assert_eq!(ids, vec![second_id, first_id]);
    }

    #[test]
    fn override_is_retroactive_and_leaves_raw_documents_alone() {
        let mut ledger = AuditLedger::default();
        let old = document("Acme", "2024-01-01", vec![line("Widget", "10")]);
        let new = document("Acme", "2024-02-01", vec![line("Widget", "12")]);
        let (old_id, new_id) = (old.id(), new.id());
        ledger.ingest(old);
        ledger.ingest(new);
        let raw_before = ledger.documents().to_vec();

        assert_eq!(audited(&mut ledger, old_id).status, VarianceStatus::Matched);
        assert_eq!(audited(&mut ledger, new_id).status, VarianceStatus::PriceIncrease);

        let previous = ledger.update_baseline("Acme", "Widget", dec("12")).unwrap();
        assert_eq!(previous, Some(dec("10")));

        assert_eq!(audited(&mut ledger, old_id).status, VarianceStatus::PriceDecrease);
        assert_eq!(audited(&mut ledger, new_id).status, VarianceStatus::Matched);
        assert_eq!(ledger.documents(), raw_before.as_slice());
    }

    #[test]
    fn rejected_override_changes_nothing() {
        let mut ledger = AuditLedger::default();
        ledger.ingest(document("Acme", "2024-01-01", vec![line("Widget", "10")]));
        let version = ledger.version();

        assert!(ledger.update_baseline("Acme", "Widget", dec("0")).is_err());
        assert_eq!(ledger.version(), version);
        assert_eq!(ledger.baselines().get("Acme", "Widget"), Some(&dec("10")));
    }

    #[test]
    fn view_is_cached_until_next_mutation() {
        let mut ledger = AuditLedger::default();
        let doc = document("Acme", "2024-01-01", vec![line("Widget", "10")]);
        let id = doc.id();
        ledger.ingest(doc);

        let first = ledger.enriched_view();
        let second = ledger.enriched_view();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(ledger.set_flags(id, FlagUpdate { is_paid: Some(true), is_hold: None }));
        let third = ledger.enriched_view();
        assert!(!Arc::ptr_eq(&second, &third));
        assert!(third[0].header.is_paid);
    }

    #[test]
    fn delete_and_flags_on_missing_ids_are_no_ops() {
        let mut ledger = AuditLedger::default();
        let doc = document("Acme", "2024-01-01", vec![line("Widget", "10")]);
        let id = doc.id();
        ledger.ingest(doc);
        let version = ledger.version();

        assert!(!ledger.delete_document(Uuid::new_v4()));
        assert!(!ledger.set_flags(Uuid::new_v4(), FlagUpdate { is_paid: Some(true), is_hold: None }));
        assert!(!ledger.set_flags(id, FlagUpdate::default()));
        assert_eq!(ledger.version(), version);

        assert!(ledger.delete_document(id));
        assert!(!ledger.delete_document(id));
        assert!(ledger.documents().is_empty());
        // 删除单据不回收基准价
        assert_eq!(ledger.baselines().get("Acme", "Widget"), Some(&dec("10")));
    }
}
