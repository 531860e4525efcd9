//! 单元测试共用的构造函数

use crate::models::{DocType, Document, DocumentHeader, LineItem};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;
use uuid::Uuid;

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn line(name: &str, unit_price: &str) -> LineItem {
    LineItem {
        name: name.to_string(),
        quantity: dec("1"),
        unit_price: dec(unit_price),
        total: dec(unit_price),
    }
}

/// date 格式 YYYY-MM-DD
pub fn document(supplier: &str, date: &str, items: Vec<LineItem>) -> Document {
    let total_amount = items.iter().fold(BigDecimal::from(0), |acc, i| acc + &i.total);
    Document {
        header: DocumentHeader {
            id: Uuid::new_v4(),
            doc_type: DocType::Invoice,
            supplier_name: supplier.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            due_date: None,
            invoice_number: format!("INV-{}", date),
            bank_account: None,
            credit_term: None,
            total_amount,
            gst_amount: None,
            abn: None,
            tel: None,
            email: None,
            address: None,
            file_name: None,
            is_paid: false,
            is_hold: false,
        },
        items,
    }
}
