use crate::db::snapshot::SnapshotRepository;
use crate::error::{AuditError, Result};
use crate::models::{BaselineMap, DocType, Document, DocumentHeader, LineItem, Snapshot};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 每条 INSERT 的最大行数
const CHUNK_SIZE: usize = 1000;
/// 整体保存超时
const SAVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, FromRow)]
struct DocumentRow {
    fid: Uuid,
    fdoctype: String,
    fsupplier: String,
    fdate: NaiveDate,
    fduedate: Option<NaiveDate>,
    finvoiceno: String,
    fbankaccount: Option<String>,
    fcreditterm: Option<String>,
    ftotalamount: BigDecimal,
    fgstamount: Option<BigDecimal>,
    fabn: Option<String>,
    ftel: Option<String>,
    femail: Option<String>,
    faddress: Option<String>,
    ffilename: Option<String>,
    fispaid: bool,
    fishold: bool,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    fid: Uuid,
    fname: String,
    fqty: BigDecimal,
    funitprice: BigDecimal,
    ftotal: BigDecimal,
}

#[derive(Debug, FromRow)]
struct BaselineRow {
    fsupplier: String,
    fitem: String,
    fprice: BigDecimal,
}

impl DocumentRow {
    fn into_document(self, items: Vec<LineItem>) -> Result<Document> {
        let doc_type: DocType = self.fdoctype.parse().map_err(|_| {
            AuditError::Persistence(format!(
                "document {} has unknown doc type '{}'",
                self.fid, self.fdoctype
            ))
        })?;

        Ok(Document {
            header: DocumentHeader {
                id: self.fid,
                doc_type,
                supplier_name: self.fsupplier,
                date: self.fdate,
                due_date: self.fduedate,
                invoice_number: self.finvoiceno,
                bank_account: self.fbankaccount,
                credit_term: self.fcreditterm,
                total_amount: self.ftotalamount,
                gst_amount: self.fgstamount,
                abn: self.fabn,
                tel: self.ftel,
                email: self.femail,
                address: self.faddress,
                file_name: self.ffilename,
                is_paid: self.fispaid,
                is_hold: self.fishold,
            },
            items,
        })
    }
}

/// PostgreSQL 快照存储
pub struct PgSnapshotRepository {
    pool: PgPool,
}

impl PgSnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn save_in_transaction(&self, snapshot: &Snapshot) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM t_audit_document_item").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM t_audit_document").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM t_price_baseline").execute(&mut *tx).await?;

        insert_documents(&mut *tx, &snapshot.documents).await?;
        insert_items(&mut *tx, &snapshot.documents).await?;
        insert_baselines(&mut *tx, &snapshot.baselines).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotRepository for PgSnapshotRepository {
    async fn load(&self) -> Result<Snapshot> {
        let document_rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT fid, fdoctype, fsupplier, fdate, fduedate, finvoiceno,
                   fbankaccount, fcreditterm, ftotalamount, fgstamount,
                   fabn, ftel, femail, faddress, ffilename, fispaid, fishold
            FROM t_audit_document
            ORDER BY fseq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT fid, fname, fqty, funitprice, ftotal
            FROM t_audit_document_item
            ORDER BY fid, fseq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let baseline_rows = sqlx::query_as::<_, BaselineRow>(
            r#"
            SELECT fsupplier, fitem, fprice
            FROM t_price_baseline
            ORDER BY fseq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_document: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        for row in item_rows {
            items_by_document.entry(row.fid).or_default().push(LineItem {
                name: row.fname,
                quantity: row.fqty,
                unit_price: row.funitprice,
                total: row.ftotal,
            });
        }

        let documents = document_rows
            .into_iter()
            .map(|row| {
                let items = items_by_document.remove(&row.fid).unwrap_or_default();
                row.into_document(items)
            })
            .collect::<Result<Vec<_>>>()?;

        let baselines: BaselineMap = baseline_rows
            .into_iter()
            .map(|row| (row.fsupplier, row.fitem, row.fprice))
            .collect();

        tracing::info!(
            "Loaded snapshot: {} documents, {} baselines",
            documents.len(),
            baselines.len()
        );
        Ok(Snapshot::new(documents, baselines))
    }

    /// 事务内整体替换; 超时或失败时回滚, 库中保持上一次快照
    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let start_time = Instant::now();

        match tokio::time::timeout(SAVE_TIMEOUT, self.save_in_transaction(snapshot)).await {
            Ok(Ok(())) => {
                tracing::debug!(
                    "Snapshot saved ({} documents, {} baselines) in {:?}",
                    snapshot.documents.len(),
                    snapshot.baselines.len(),
                    start_time.elapsed()
                );
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!("✗ Snapshot save failed after {:?}: {:?}", start_time.elapsed(), e);
                Err(e)
            }
            Err(_) => {
                tracing::error!("✗ Snapshot save timed out (>{:?})", SAVE_TIMEOUT);
                Err(AuditError::Database(sqlx::Error::PoolTimedOut))
            }
        }
    }
}

async fn insert_documents(conn: &mut PgConnection, documents: &[Document]) -> Result<()> {
    let rows: Vec<(i32, &Document)> = documents
        .iter()
        .enumerate()
        .map(|(seq, doc)| (seq as i32, doc))
        .collect();

    for chunk in rows.chunks(CHUNK_SIZE) {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO t_audit_document (
                fid, fseq, fdoctype, fsupplier, fdate, fduedate, finvoiceno,
                fbankaccount, fcreditterm, ftotalamount, fgstamount,
                fabn, ftel, femail, faddress, ffilename, fispaid, fishold
            ) ",
        );

        query_builder.push_values(chunk, |mut b, (seq, doc)| {
            let h = &doc.header;
            b.push_bind(h.id)
                .push_bind(*seq)
                .push_bind(h.doc_type.as_str())
                .push_bind(h.supplier_name.clone())
                .push_bind(h.date)
                .push_bind(h.due_date)
                .push_bind(h.invoice_number.clone())
                .push_bind(h.bank_account.clone())
                .push_bind(h.credit_term.clone())
                .push_bind(h.total_amount.clone())
                .push_bind(h.gst_amount.clone())
                .push_bind(h.abn.clone())
                .push_bind(h.tel.clone())
                .push_bind(h.email.clone())
                .push_bind(h.address.clone())
                .push_bind(h.file_name.clone())
                .push_bind(h.is_paid)
                .push_bind(h.is_hold);
        });

        query_builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

async fn insert_items(conn: &mut PgConnection, documents: &[Document]) -> Result<()> {
    let rows: Vec<(Uuid, i32, &LineItem)> = documents
        .iter()
        .flat_map(|doc| {
            doc.items
                .iter()
                .enumerate()
                .map(move |(seq, item)| (doc.id(), seq as i32, item))
        })
        .collect();

    for chunk in rows.chunks(CHUNK_SIZE) {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO t_audit_document_item (fid, fseq, fname, fqty, funitprice, ftotal) ",
        );

        query_builder.push_values(chunk, |mut b, (id, seq, item)| {
            b.push_bind(*id)
                .push_bind(*seq)
                .push_bind(item.name.clone())
                .push_bind(item.quantity.clone())
                .push_bind(item.unit_price.clone())
                .push_bind(item.total.clone());
        });

        query_builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

async fn insert_baselines(conn: &mut PgConnection, baselines: &BaselineMap) -> Result<()> {
    let rows: Vec<(i32, &str, &str, &BigDecimal)> = baselines
        .iter()
        .enumerate()
        .map(|(seq, (supplier, item, price))| (seq as i32, supplier, item, price))
        .collect();

    for chunk in rows.chunks(CHUNK_SIZE) {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO t_price_baseline (fsupplier, fitem, fprice, fseq) ",
        );

        query_builder.push_values(chunk, |mut b, (seq, supplier, item, price)| {
            b.push_bind(supplier.to_string())
                .push_bind(item.to_string())
                .push_bind((*price).clone())
                .push_bind(*seq);
        });

        query_builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}
