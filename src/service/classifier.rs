use crate::models::{AuditedItem, VarianceStatus};
use bigdecimal::BigDecimal;

/// 价差容差 0.01 (货币单位), 屏蔽浮点舍入噪声
pub fn price_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// 按明细价差判定单据状态: mixed > price_increase > price_decrease > matched
pub fn classify(items: &[AuditedItem]) -> VarianceStatus {
    let upper = price_tolerance();
    let lower = -upper.clone();

    let has_increase = items.iter().any(|i| i.price_change > upper);
    let has_decrease = items.iter().any(|i| i.price_change < lower);

    match (has_increase, has_decrease) {
        (true, true) => VarianceStatus::Mixed,
        (true, false) => VarianceStatus::PriceIncrease,
        (false, true) => VarianceStatus::PriceDecrease,
        (false, false) => VarianceStatus::Matched,
    }
}
