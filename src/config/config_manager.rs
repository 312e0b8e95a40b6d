// ==========================================
// 工程项目管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载与查询
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    /// 默认币种代码
    pub const DEFAULT_CURRENCY_CODE: &str = "import/default_currency_code";
    /// 汇率敏感币种代码
    pub const FX_SENSITIVE_CODE: &str = "import/fx_sensitive_code";
    /// 行解析并发工作线程数
    pub const RESOLVER_WORKER_COUNT: &str = "import/resolver_worker_count";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_default_currency_code(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_or_default(config_keys::DEFAULT_CURRENCY_CODE, "USD")?
            .trim()
            .to_uppercase())
    }

    async fn get_fx_sensitive_code(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_or_default(config_keys::FX_SENSITIVE_CODE, "USD")?
            .trim()
            .to_uppercase())
    }

    async fn get_resolver_worker_count(&self) -> Result<usize, Box<dyn Error>> {
        let raw = self.get_config_or_default(config_keys::RESOLVER_WORKER_COUNT, "4")?;
        let count = raw.trim().parse::<usize>().unwrap_or(4);
        // 至少一个工作线程
        Ok(count.max(1))
    }
}
