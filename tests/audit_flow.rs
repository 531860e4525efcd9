//! 审计服务端到端测试: 入账 / 基准价修正 / 批量上传 / 持久化一致性

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use price_guardian::db::MemorySnapshotRepository;
use price_guardian::extraction::Extractor;
use price_guardian::models::{ExtractedRecord, FlagUpdate, VarianceStatus};
use price_guardian::service::{Upload, UploadStatus};
use price_guardian::{AuditError, AuditService, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn record_json(supplier: &str, date: &str, items: &[(&str, f64)]) -> Value {
    let total: f64 = items.iter().map(|(_, price)| price).sum();
    json!({
        "docType": "invoice",
        "supplierName": supplier,
        "date": date,
        "dueDate": "N/A",
        "invoiceNumber": format!("INV-{}", date),
        "totalAmount": total,
        "gstAmount": 0,
        "items": items
            .iter()
            .map(|(name, price)| json!({ "name": name, "quantity": 1, "unitPrice": price, "total": price }))
            .collect::<Vec<_>>(),
    })
}

fn record(supplier: &str, date: &str, items: &[(&str, f64)]) -> ExtractedRecord {
    serde_json::from_value(record_json(supplier, date, items)).unwrap()
}

/// 按文件内容返回预设结果的识别服务
#[derive(Default)]
struct ScriptedExtractor {
    responses: HashMap<Vec<u8>, Value>,
}

impl ScriptedExtractor {
    fn with(mut self, content: &str, response: Value) -> Self {
        self.responses.insert(content.as_bytes().to_vec(), response);
        self
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, content: Vec<u8>, _media_type: &str) -> Result<ExtractedRecord> {
        let value = self
            .responses
            .get(&content)
            .ok_or_else(|| AuditError::extraction("empty response from extraction service"))?;
        serde_json::from_value(value.clone()).map_err(|e| AuditError::extraction(e.to_string()))
    }
}

async fn service_with(
    repository: Arc<MemorySnapshotRepository>,
    extractor: ScriptedExtractor,
) -> AuditService {
    AuditService::open(repository, Arc::new(extractor), 3)
        .await
        .unwrap()
}

async fn service() -> (AuditService, Arc<MemorySnapshotRepository>) {
    let repository = Arc::new(MemorySnapshotRepository::new());
    let service = service_with(Arc::clone(&repository), ScriptedExtractor::default()).await;
    (service, repository)
}

fn upload(name: &str) -> Upload {
    Upload {
        file_name: format!("{}.pdf", name),
        media_type: "application/pdf".to_string(),
        content: name.as_bytes().to_vec(),
    }
}

#[tokio::test]
async fn acme_widget_scenario() {
    let (service, _) = service().await;

    let doc1 = service
        .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
        .await
        .unwrap();
    let view = service.document(doc1.id()).await.unwrap();
    assert_eq!(view.status, VarianceStatus::Matched);
    assert!(view.items[0].price_change.is_zero());
    assert_eq!(service.baselines().await.get("Acme", "Widget"), Some(&dec("10")));

    let doc2 = service
        .ingest(
            record("Acme", "2024-02-01", &[("Widget", 12.0), ("Gadget", 5.0)]),
            None,
        )
        .await
        .unwrap();
    let view = service.document(doc2.id()).await.unwrap();
    assert_eq!(view.status, VarianceStatus::PriceIncrease);
    assert_eq!(view.items[0].price_change, dec("2"));
    assert_eq!(view.items[0].percent_change, dec("20"));
    assert_eq!(view.items[0].previous_unit_price, Some(dec("10")));
    // Gadget 首次出现, 本单不产生价差
    assert!(view.items[1].price_change.is_zero());

    let doc3 = service
        .ingest(
            record("Acme", "2024-03-01", &[("Widget", 12.0), ("Gadget", 4.0)]),
            None,
        )
        .await
        .unwrap();
    let view = service.document(doc3.id()).await.unwrap();
    assert_eq!(view.status, VarianceStatus::Mixed);

    let order: Vec<_> = service.enriched_view().await.iter().map(|d| d.header.id).collect();
    assert_eq!(order, vec![doc3.id(), doc2.id(), doc1.id()]);
}

#[tokio::test]
async fn override_is_retroactive_and_persisted_with_documents() {
    let (service, repository) = service().await;
    let old = service
        .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
        .await
        .unwrap();
    let new = service
        .ingest(record("Acme", "2024-02-01", &[("Widget", 12.0)]), None)
        .await
        .unwrap();
    let stored_documents = repository.stored().await.documents;

    service.update_baseline("Acme", "Widget", dec("12")).await.unwrap();

    assert_eq!(
        service.document(old.id()).await.unwrap().status,
        VarianceStatus::PriceDecrease
    );
    assert_eq!(
        service.document(new.id()).await.unwrap().status,
        VarianceStatus::Matched
    );

    let stored = repository.stored().await;
    assert_eq!(stored.baselines.get("Acme", "Widget"), Some(&dec("12")));
    assert_eq!(stored.documents, stored_documents);
    assert_eq!(repository.save_count(), 3);
}

#[tokio::test]
async fn non_positive_override_is_rejected() {
    let (service, repository) = service().await;
    service
        .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
        .await
        .unwrap();

    let err = service
        .update_baseline("Acme", "Widget", dec("-3"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Validation(_)));
    assert_eq!(service.baselines().await.get("Acme", "Widget"), Some(&dec("10")));
    assert_eq!(repository.save_count(), 1);
}

#[tokio::test]
async fn failed_save_leaves_memory_and_storage_unchanged() {
    let (service, repository) = service().await;
    repository.set_fail_on_save(true).await;

    let err = service
        .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Persistence(_)));
    assert!(service.enriched_view().await.is_empty());
    assert!(service.baselines().await.is_empty());
    assert!(repository.stored().await.documents.is_empty());

    repository.set_fail_on_save(false).await;
    service
        .ingest(record("Acme", "2024-01-02", &[("Widget", 11.0)]), None)
        .await
        .unwrap();
    // 失败的那次没有留下基准价, 第二张单据成为首次出现
    assert_eq!(service.baselines().await.get("Acme", "Widget"), Some(&dec("11")));
}

#[tokio::test]
async fn invalid_record_is_not_admitted() {
    let (service, repository) = service().await;
    let mut value = record_json("Acme", "2024-01-01", &[("Widget", 10.0)]);
    value["items"] = json!([]);
    let invalid: ExtractedRecord = serde_json::from_value(value).unwrap();

    let err = service.ingest(invalid, None).await.unwrap_err();
    assert!(matches!(err, AuditError::Validation(_)));
    assert_eq!(service.stats().await.total_count, 0);
    assert!(service.baselines().await.is_empty());
    assert_eq!(repository.save_count(), 0);
}

#[tokio::test]
async fn batch_upload_applies_in_order_and_isolates_failures() {
    let repository = Arc::new(MemorySnapshotRepository::new());
    let extractor = ScriptedExtractor::default()
        .with("first", record_json("Acme", "2024-01-01", &[("Widget", 10.0)]))
        .with("third", record_json("Acme", "2024-01-01", &[("Widget", 11.0)]))
        .with("fourth", json!({ "supplierName": "Acme", "items": [] }));
    let service = service_with(Arc::clone(&repository), extractor).await;

    let outcomes = service
        .ingest_uploads(vec![upload("first"), upload("broken"), upload("third"), upload("fourth")])
        .await;

    let statuses: Vec<_> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            UploadStatus::Processed,
            UploadStatus::Failed,
            UploadStatus::Processed,
            UploadStatus::Failed,
        ]
    );
    assert_eq!(outcomes[1].file_name, "broken.pdf");
    assert!(outcomes[1].message.as_deref().unwrap().contains("Extraction"));
    assert!(outcomes[3].message.as_deref().unwrap().contains("Validation"));

    // 第三个文件看到第一个文件播种的基准价
    let third = service
        .document(outcomes[2].document_id.unwrap())
        .await
        .unwrap();
    assert_eq!(third.status, VarianceStatus::PriceIncrease);
    assert_eq!(third.items[0].price_change, dec("1"));
    assert_eq!(third.header.file_name.as_deref(), Some("third.pdf"));

    // 同日单据: 后入账的排在前面 (入账置顶 + 稳定排序)
    let order: Vec<_> = service.enriched_view().await.iter().map(|d| d.header.id).collect();
    assert_eq!(
        order,
        vec![outcomes[2].document_id.unwrap(), outcomes[0].document_id.unwrap()]
    );
    assert_eq!(repository.save_count(), 2);
}

#[tokio::test]
async fn reopened_service_sees_the_same_view() {
    let (service, repository) = service().await;
    service
        .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
        .await
        .unwrap();
    service
        .ingest(record("Globex", "2024-01-03", &[("Bolt", 2.0)]), None)
        .await
        .unwrap();
    service
        .ingest(record("Acme", "2024-01-02", &[("Widget", 9.5)]), None)
        .await
        .unwrap();
    let before = service.enriched_view().await;

    let reopened_repository = Arc::new(MemorySnapshotRepository::with_snapshot(
        repository.stored().await,
    ));
    let reopened = service_with(reopened_repository, ScriptedExtractor::default()).await;
    let after = reopened.enriched_view().await;

    assert_eq!(before.as_ref(), after.as_ref());
}

#[tokio::test]
async fn stats_follow_flags_and_status() {
    let (service, _) = service().await;
    service
        .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
        .await
        .unwrap();
    let hike = service
        .ingest(record("Acme", "2024-01-02", &[("Widget", 15.0)]), None)
        .await
        .unwrap();
    let held = service
        .ingest(record("Acme", "2024-01-03", &[("Widget", 20.0)]), None)
        .await
        .unwrap();

    service
        .set_flags(held.id(), FlagUpdate { is_paid: None, is_hold: Some(true) })
        .await
        .unwrap();
    let stats = service.stats().await;
    assert_eq!(stats.total_count, 3);
    assert_eq!(stats.total_payable, dec("25"));
    assert_eq!(stats.variance_count, 2);

    service
        .set_flags(hike.id(), FlagUpdate { is_paid: Some(true), is_hold: None })
        .await
        .unwrap();
    let stats = service.stats().await;
    assert_eq!(stats.total_payable, dec("10"));
    assert_eq!(stats.variance_count, 1);

    let suppliers = service.supplier_summaries().await;
    assert_eq!(suppliers.len(), 1);
    assert_eq!(suppliers[0].transactions, 3);
    assert_eq!(suppliers[0].total_spend, dec("45"));
    assert_eq!(suppliers[0].variance_count, 2);
    assert_eq!(service.high_risk().await.len(), 2);
}

#[tokio::test]
async fn deleting_missing_document_is_a_no_op() {
    let (service, repository) = service().await;
    let doc = service
        .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
        .await
        .unwrap();

    assert!(!service.delete_document(uuid::Uuid::new_v4()).await.unwrap());
    assert_eq!(repository.save_count(), 1);

    assert!(service.delete_document(doc.id()).await.unwrap());
    assert!(!service.delete_document(doc.id()).await.unwrap());
    assert_eq!(repository.save_count(), 2);
    assert!(repository.stored().await.documents.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_ingests_seed_a_new_pair_once() {
    let (service, repository) = service().await;
    let service = Arc::new(service);

    let cheap = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .ingest(record("Acme", "2024-01-01", &[("Widget", 10.0)]), None)
                .await
        })
    };
    let dear = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .ingest(record("Acme", "2024-01-01", &[("Widget", 12.0)]), None)
                .await
        })
    };
    let (cheap, dear) = tokio::join!(cheap, dear);
    cheap.unwrap().unwrap();
    dear.unwrap().unwrap();

    let view = service.enriched_view().await;
    assert_eq!(view.len(), 2);

    let (seeding, compared): (Vec<_>, Vec<_>) = view
        .iter()
        .map(|doc| &doc.items[0])
        .partition(|item| item.price_change.is_zero());
    assert_eq!(seeding.len(), 1);
    assert_eq!(compared.len(), 1);
    assert_eq!(compared[0].price_change.abs(), dec("2"));

    let baselines = service.baselines().await;
    assert_eq!(baselines.len(), 1);
    assert_eq!(baselines.get("Acme", "Widget"), Some(&seeding[0].item.unit_price));

    assert_eq!(repository.save_count(), 2);
    assert_eq!(repository.stored().await.baselines, baselines);
}
