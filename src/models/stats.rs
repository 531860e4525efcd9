use crate::models::DocumentHeader;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 看板统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_payable: BigDecimal,
    pub variance_count: usize,
    pub total_count: usize,
}

/// 供应商汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSummary {
    pub supplier_name: String,
    pub transactions: usize,
    pub total_spend: BigDecimal,
    pub variance_count: usize,
}

/// 审计记录分栏
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryTab {
    Outstanding,
    Settled,
    Hold,
}

impl HistoryTab {
    pub fn matches(&self, header: &DocumentHeader) -> bool {
        match self {
            HistoryTab::Outstanding => !header.is_paid && !header.is_hold,
            HistoryTab::Settled => header.is_paid,
            HistoryTab::Hold => header.is_hold,
        }
    }
}
