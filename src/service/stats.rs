use crate::models::{AuditedDocument, DashboardStats, HistoryTab, SupplierSummary, VarianceStatus};
use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;

/// 看板统计: 应付总额 (未付且未挂起), 待处理涨价单据数 (未付), 单据总数
pub fn dashboard_stats(documents: &[AuditedDocument]) -> DashboardStats {
    let mut total_payable = BigDecimal::zero();
    let mut variance_count = 0;

    for doc in documents {
        if !doc.header.is_paid && !doc.header.is_hold {
            total_payable += &doc.header.total_amount;
        }
        if doc.status.is_alert() && !doc.header.is_paid {
            variance_count += 1;
        }
    }

    DashboardStats {
        total_payable,
        variance_count,
        total_count: documents.len(),
    }
}

/// 供应商汇总, 按在视图中首次出现的顺序
pub fn supplier_summaries(documents: &[AuditedDocument]) -> Vec<SupplierSummary> {
    let mut summaries: IndexMap<&str, SupplierSummary> = IndexMap::new();

    for doc in documents {
        let summary = summaries
            .entry(doc.header.supplier_name.as_str())
            .or_insert_with(|| SupplierSummary {
                supplier_name: doc.header.supplier_name.clone(),
                transactions: 0,
                total_spend: BigDecimal::zero(),
                variance_count: 0,
            });
        summary.transactions += 1;
        summary.total_spend += &doc.header.total_amount;
        if doc.status.is_alert() {
            summary.variance_count += 1;
        }
    }

    summaries.into_values().collect()
}

/// 高风险: 仅涨价 (不含 mixed)
pub fn high_risk(documents: &[AuditedDocument]) -> Vec<AuditedDocument> {
    documents
        .iter()
        .filter(|doc| doc.status == VarianceStatus::PriceIncrease)
        .cloned()
        .collect()
}

pub fn filter_tab(documents: &[AuditedDocument], tab: HistoryTab) -> Vec<AuditedDocument> {
    documents
        .iter()
        .filter(|doc| tab.matches(&doc.header))
        .cloned()
        .collect()
}
