use crate::models::{AuditedDocument, AuditedItem, BaselineMap, Document, LineItem};
use crate::service::classifier::classify;
use bigdecimal::{BigDecimal, Zero};

/// 单行比对: 无基准价时价差为 0
pub fn enrich_item(supplier: &str, item: &LineItem, baselines: &BaselineMap) -> AuditedItem {
    let Some(baseline) = baselines.get(supplier, &item.name) else {
        return AuditedItem {
            item: item.clone(),
            previous_unit_price: None,
            price_change: BigDecimal::zero(),
            percent_change: BigDecimal::zero(),
        };
    };

    let price_change = &item.unit_price - baseline;
    let percent_change = if baseline.is_zero() {
        BigDecimal::zero()
    } else {
        &price_change / baseline * BigDecimal::from(100)
    };

    AuditedItem {
        item: item.clone(),
        previous_unit_price: Some(baseline.clone()),
        price_change,
        percent_change,
    }
}

pub fn enrich_document(document: &Document, baselines: &BaselineMap) -> AuditedDocument {
    let supplier = document.supplier_name();
    let items: Vec<AuditedItem> = document
        .items
        .iter()
        .map(|item| enrich_item(supplier, item, baselines))
        .collect();
    let status = classify(&items);

    AuditedDocument {
        header: document.header.clone(),
        items,
        status,
    }
}

/// 生成审计视图: 按当前基准价重新比对, 按单据日期降序.
/// 同日单据保持存储顺序 (稳定排序).
pub fn enrich(documents: &[Document], baselines: &BaselineMap) -> Vec<AuditedDocument> {
    let mut audited: Vec<AuditedDocument> = documents
        .iter()
        .map(|doc| enrich_document(doc, baselines))
        .collect();
    audited.sort_by(|a, b| b.header.date.cmp(&a.header.date));
    audited
}
