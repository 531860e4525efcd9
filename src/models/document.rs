use crate::error::AuditError;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// 单据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Invoice,
    CreditNote,
    DebitNote,
    Quote,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Invoice => "invoice",
            DocType::CreditNote => "credit_note",
            DocType::DebitNote => "debit_note",
            DocType::Quote => "quote",
        }
    }
}

impl FromStr for DocType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Ok(DocType::Invoice),
            "credit_note" => Ok(DocType::CreditNote),
            "debit_note" => Ok(DocType::DebitNote),
            "quote" => Ok(DocType::Quote),
            other => Err(AuditError::validation(format!("unknown docType '{}'", other))),
        }
    }
}

/// 单据价格差异状态 (每次读取时按当前基准价重新计算, 不落库)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    Matched,
    PriceIncrease,
    PriceDecrease,
    Mixed,
}

impl VarianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarianceStatus::Matched => "matched",
            VarianceStatus::PriceIncrease => "price_increase",
            VarianceStatus::PriceDecrease => "price_decrease",
            VarianceStatus::Mixed => "mixed",
        }
    }

    /// 涨价或混合: 计入看板 variance 告警
    pub fn is_alert(&self) -> bool {
        matches!(self, VarianceStatus::PriceIncrease | VarianceStatus::Mixed)
    }
}

/// 单据明细行 (原始识别结果)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub total: BigDecimal,
}

/// 单据抬头 (除明细外的全部字段)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHeader {
    pub id: Uuid,
    pub doc_type: DocType,
    pub supplier_name: String,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub invoice_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_term: Option<String>,
    pub total_amount: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_amount: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub is_paid: bool,
    pub is_hold: bool,
}

/// 已入库单据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub header: DocumentHeader,
    pub items: Vec<LineItem>,
}

impl Document {
    pub fn id(&self) -> Uuid {
        self.header.id
    }

    pub fn supplier_name(&self) -> &str {
        &self.header.supplier_name
    }
}

/// 明细行 + 与当前基准价的比对结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditedItem {
    #[serde(flatten)]
    pub item: LineItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_unit_price: Option<BigDecimal>,
    pub price_change: BigDecimal,
    pub percent_change: BigDecimal,
}

/// 审计视图中的单据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditedDocument {
    #[serde(flatten)]
    pub header: DocumentHeader,
    pub items: Vec<AuditedItem>,
    pub status: VarianceStatus,
}

/// 付款 / 挂起标记更新; None 表示保持不变
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagUpdate {
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default)]
    pub is_hold: Option<bool>,
}
