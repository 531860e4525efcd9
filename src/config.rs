use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 可选配置文件 (不存在时忽略)
pub const CONFIG_FILE: &str = "config/price-guardian";
/// 环境变量前缀, 例如 PRICE_GUARDIAN__EXTRACTION__ENDPOINT
pub const CONFIG_ENV_PREFIX: &str = "PRICE_GUARDIAN";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub extraction: ExtractionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// 同一批上传中并发识别的文件数 (入账仍然串行)
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// true 时不连接数据库, 数据只保存在进程内
    pub in_memory: bool,
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/price_guardian".to_string(),
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            extraction: ExtractionConfig {
                endpoint: "http://127.0.0.1:8090/extract".to_string(),
                api_key: None,
                timeout_secs: 120,
                concurrency: 4,
            },
            storage: StorageConfig { in_memory: false },
        }
    }
}

impl AppConfig {
    /// 加载顺序: 默认值 -> 配置文件 -> PRICE_GUARDIAN__* 环境变量 -> SERVER_HOST / SERVER_PORT / DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        if config.extraction.concurrency == 0 {
            return Err(ConfigError::Message(
                "extraction.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
