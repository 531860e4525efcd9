use sqlx::PgPool;

const CREATE_DOCUMENT: &str = r#"
    CREATE TABLE IF NOT EXISTS t_audit_document (
        fid           UUID PRIMARY KEY,
        fseq          INTEGER NOT NULL,
        fdoctype      VARCHAR(32) NOT NULL,
        fsupplier     TEXT NOT NULL,
        fdate         DATE NOT NULL,
        fduedate      DATE,
        finvoiceno    TEXT NOT NULL,
        fbankaccount  TEXT,
        fcreditterm   TEXT,
        ftotalamount  NUMERIC NOT NULL,
        fgstamount    NUMERIC,
        fabn          TEXT,
        ftel          TEXT,
        femail        TEXT,
        faddress      TEXT,
        ffilename     TEXT,
        fispaid       BOOLEAN NOT NULL DEFAULT FALSE,
        fishold       BOOLEAN NOT NULL DEFAULT FALSE
    )
"#;

const CREATE_DOCUMENT_ITEM: &str = r#"
    CREATE TABLE IF NOT EXISTS t_audit_document_item (
        fid         UUID NOT NULL REFERENCES t_audit_document (fid) ON DELETE CASCADE,
        fseq        INTEGER NOT NULL,
        fname       TEXT NOT NULL,
        fqty        NUMERIC NOT NULL,
        funitprice  NUMERIC NOT NULL,
        ftotal      NUMERIC NOT NULL,
        PRIMARY KEY (fid, fseq)
    )
"#;

const CREATE_BASELINE: &str = r#"
    CREATE TABLE IF NOT EXISTS t_price_baseline (
        fsupplier  TEXT NOT NULL,
        fitem      TEXT NOT NULL,
        fprice     NUMERIC NOT NULL,
        fseq       INTEGER NOT NULL,
        PRIMARY KEY (fsupplier, fitem)
    )
"#;

/// 启动时建表 (已存在则跳过)
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_DOCUMENT, CREATE_DOCUMENT_ITEM, CREATE_BASELINE] {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Audit schema ready");
    Ok(())
}
