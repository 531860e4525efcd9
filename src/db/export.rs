use crate::error::Result;
use crate::models::AuditedDocument;
use bigdecimal::BigDecimal;
use std::io::Write;

const HEADER: [&str; 15] = [
    "document_id",
    "doc_type",
    "supplier_name",
    "date",
    "invoice_number",
    "status",
    "is_paid",
    "is_hold",
    "item_name",
    "quantity",
    "unit_price",
    "total",
    "previous_unit_price",
    "price_change",
    "percent_change",
];

/// 将 Option<BigDecimal> 转换为 CSV 字符串
fn option_to_csv(val: &Option<BigDecimal>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// 导出审计视图, 每个明细行一条记录
pub fn write_csv<W: Write>(documents: &[AuditedDocument], output: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(HEADER)?;

    for doc in documents {
        let h = &doc.header;
        for item in &doc.items {
            writer.write_record(&[
                h.id.to_string(),
                h.doc_type.as_str().to_string(),
                h.supplier_name.clone(),
                h.date.to_string(),
                h.invoice_number.clone(),
                doc.status.as_str().to_string(),
                h.is_paid.to_string(),
                h.is_hold.to_string(),
                item.item.name.clone(),
                item.item.quantity.to_string(),
                item.item.unit_price.to_string(),
                item.item.total.to_string(),
                option_to_csv(&item.previous_unit_price),
                item.price_change.to_string(),
                item.percent_change.to_string(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
