use crate::error::{AuditError, Result};
use crate::models::{DocType, Document, DocumentHeader, LineItem};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// 识别服务在字段缺失时填写的占位值
const PLACEHOLDER: &str = "N/A";
/// 数值文本最大长度
const MAX_NUMBER_LEN: usize = 64;
/// 小数位数 (scale) 绝对值上限, 超出即视为非法金额
const MAX_SCALE: i64 = 18;

/// 识别服务返回的数值 (数字或数字字符串)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(serde_json::Number),
    Text(String),
}

impl RawNumber {
    /// 解析为金额/数量; 文本过长或 scale 超出 ±18 时拒绝
    pub fn to_decimal(&self, field: &str) -> Result<BigDecimal> {
        let text = match self {
            RawNumber::Number(n) => n.to_string(),
            RawNumber::Text(s) => s.trim().to_string(),
        };
        if text.len() > MAX_NUMBER_LEN {
            return Err(AuditError::validation(format!(
                "field {} has too many digits ({} characters)",
                field,
                text.len()
            )));
        }

        let value = BigDecimal::from_str(&text).map_err(|_| {
            AuditError::validation(format!("field {} is not numeric: {:?}", field, self))
        })?;
        let (_, scale) = value.as_bigint_and_exponent();
        if scale.abs() > MAX_SCALE {
            return Err(AuditError::validation(format!(
                "field {} is out of range: '{}'",
                field, text
            )));
        }
        Ok(value)
    }

    fn is_placeholder(&self) -> bool {
        match self {
            RawNumber::Text(s) => is_placeholder(s),
            RawNumber::Number(_) => false,
        }
    }
}

/// 识别结果明细行 (未校验)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedItem {
    pub name: Option<String>,
    pub quantity: Option<RawNumber>,
    pub unit_price: Option<RawNumber>,
    pub total: Option<RawNumber>,
}

/// 识别服务返回的结构化记录 (不可信输入)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    pub doc_type: Option<String>,
    pub supplier_name: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub invoice_number: Option<String>,
    pub bank_account: Option<String>,
    pub credit_term: Option<String>,
    pub total_amount: Option<RawNumber>,
    pub gst_amount: Option<RawNumber>,
    pub abn: Option<String>,
    pub tel: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub items: Option<Vec<ExtractedItem>>,
}

impl ExtractedRecord {
    /// 校验并转换为待入库单据; 任一必填字段缺失或数值非法即整体拒绝
    pub fn into_document(self, id: Uuid, file_name: Option<String>) -> Result<Document> {
        let supplier_name = required_text(self.supplier_name, "supplierName")?;
        let doc_type: DocType = required_text(self.doc_type, "docType")?.parse()?;
        let date = parse_date(&required_text(self.date, "date")?, "date")?;
        let due_date = optional_text(self.due_date)
            .map(|raw| parse_date(&raw, "dueDate"))
            .transpose()?;
        let invoice_number = required_text(self.invoice_number, "invoiceNumber")?;
        let total_amount = required_number(self.total_amount.as_ref(), "totalAmount")?;
        let gst_amount = optional_number(self.gst_amount.as_ref(), "gstAmount")?;

        let raw_items = match self.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(AuditError::validation("document has no line items")),
        };
        let items = raw_items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| item.into_line_item(idx))
            .collect::<Result<Vec<_>>>()?;

        Ok(Document {
            header: DocumentHeader {
                id,
                doc_type,
                supplier_name,
                date,
                due_date,
                invoice_number,
                bank_account: optional_text(self.bank_account),
                credit_term: optional_text(self.credit_term),
                total_amount,
                gst_amount,
                abn: optional_text(self.abn),
                tel: optional_text(self.tel),
                email: optional_text(self.email),
                address: optional_text(self.address),
                file_name,
                is_paid: false,
                is_hold: false,
            },
            items,
        })
    }
}

impl ExtractedItem {
    fn into_line_item(self, idx: usize) -> Result<LineItem> {
        let field = |name: &str| format!("items[{}].{}", idx, name);
        let name = required_text(self.name, &field("name"))?;
        let quantity = required_number(self.quantity.as_ref(), &field("quantity"))?;
        let unit_price = required_number(self.unit_price.as_ref(), &field("unitPrice"))?;
        let total = required_number(self.total.as_ref(), &field("total"))?;

        if &quantity * &unit_price != total {
            tracing::warn!(
                "Line item '{}' total {} does not equal {} x {}",
                name, total, quantity, unit_price
            );
        }

        Ok(LineItem {
            name,
            quantity,
            unit_price,
            total,
        })
    }
}

fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(PLACEHOLDER)
}

/// 保留原始文本 (不做归一化), 仅判断是否为空或占位值
fn required_text(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !is_placeholder(&v) => Ok(v),
        _ => Err(AuditError::validation(format!("missing required field {}", field))),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_placeholder(v))
}

fn required_number(value: Option<&RawNumber>, field: &str) -> Result<BigDecimal> {
    let raw = value
        .filter(|v| !v.is_placeholder())
        .ok_or_else(|| AuditError::validation(format!("missing required field {}", field)))?;
    raw.to_decimal(field)
}

fn optional_number(value: Option<&RawNumber>, field: &str) -> Result<Option<BigDecimal>> {
    match value.filter(|v| !v.is_placeholder()) {
        None => Ok(None),
        Some(raw) => raw.to_decimal(field).map(Some),
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AuditError::validation(format!("field {} is not a YYYY-MM-DD date: '{}'", field, value))
    })
}
