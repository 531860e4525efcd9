use crate::error::{AuditError, Result};
use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 基准价登记表: 供应商 -> 商品名 -> 基准单价
///
/// 键为精确字符串匹配 (区分大小写, 不做空白归一化).
/// 自动写入只通过 [`BaselineMap::seed_if_absent`] 且永不覆盖;
/// 人工修正通过 [`BaselineMap::override_price`] 且总是覆盖.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineMap {
    entries: IndexMap<String, IndexMap<String, BigDecimal>>,
}

impl BaselineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, supplier: &str, item: &str) -> Option<&BigDecimal> {
        self.entries.get(supplier).and_then(|items| items.get(item))
    }

    /// 首次出现时写入, 已存在则不做任何修改. 返回是否写入
    pub fn seed_if_absent(&mut self, supplier: &str, item: &str, price: &BigDecimal) -> bool {
        if self.get(supplier, item).is_some() {
            return false;
        }
        self.entries
            .entry(supplier.to_string())
            .or_default()
            .insert(item.to_string(), price.clone());
        true
    }

    /// 人工修正基准价, 返回旧值
    pub fn override_price(
        &mut self,
        supplier: &str,
        item: &str,
        price: BigDecimal,
    ) -> Result<Option<BigDecimal>> {
        if price <= BigDecimal::zero() {
            return Err(AuditError::validation(format!(
                "baseline price for {}/{} must be positive, got {}",
                supplier, item, price
            )));
        }
        Ok(self
            .entries
            .entry(supplier.to_string())
            .or_default()
            .insert(item.to_string(), price))
    }

    /// 按首次出现顺序遍历 (supplier, item, price)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &BigDecimal)> {
        self.entries.iter().flat_map(|(supplier, items)| {
            items
                .iter()
                .map(move |(item, price)| (supplier.as_str(), item.as_str(), price))
        })
    }

    pub fn supplier_count(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 从存储恢复 (已按保存顺序排列)
impl FromIterator<(String, String, BigDecimal)> for BaselineMap {
    fn from_iter<T: IntoIterator<Item = (String, String, BigDecimal)>>(iter: T) -> Self {
        let mut entries: IndexMap<String, IndexMap<String, BigDecimal>> = IndexMap::new();
        for (supplier, item, price) in iter {
            entries.entry(supplier).or_default().insert(item, price);
        }
        Self { entries }
    }
}
