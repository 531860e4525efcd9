use crate::models::{BaselineMap, Document};

/// 持久化单元: 单据集合与基准价登记表必须一起读写
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    pub baselines: BaselineMap,
}

impl Snapshot {
    pub fn new(documents: Vec<Document>, baselines: BaselineMap) -> Self {
        Self {
            documents,
            baselines,
        }
    }
}
