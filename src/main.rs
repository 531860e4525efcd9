use price_guardian::db::{
    create_pool, ensure_schema, MemorySnapshotRepository, PgSnapshotRepository, SnapshotRepository,
};
use price_guardian::extraction::HttpExtractor;
use price_guardian::{router, AppConfig, AuditService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式, 级别由 RUST_LOG 控制 (默认 info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 快照存储
    let repository: Arc<dyn SnapshotRepository> = if config.storage.in_memory {
        info!("Using in-memory storage, data will not survive restarts");
        Arc::new(MemorySnapshotRepository::new())
    } else {
        let pool = create_pool(&config.database).await?;
        info!("Database pool created");
        ensure_schema(&pool).await?;
        Arc::new(PgSnapshotRepository::new(pool))
    };

    let extractor = Arc::new(HttpExtractor::new(&config.extraction)?);
    let service = Arc::new(
        AuditService::open(repository, extractor, config.extraction.concurrency).await?,
    );

    let app = router(service);

    // 启动服务器
    let addr = config.bind_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST   /api/documents                   - ingest extracted record");
    info!("  POST   /api/documents/upload            - upload files for extraction");
    info!("  GET    /api/documents[?tab=..]          - audited documents");
    info!("  PUT    /api/baselines/:supplier/:item   - override baseline price");
    info!("  GET    /api/stats                       - dashboard stats");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
