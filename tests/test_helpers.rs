// ==========================================
// 工程项目管理系统 - 集成测试公共设施
// ==========================================
// 职责: 临时数据库创建、参照数据种子、配置 Mock
// 红线: 每个测试独立建库,测试之间零共享状态
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use pmis_import_engine::config::import_config_trait::ImportConfigReader;
use pmis_import_engine::db;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const ORG: &str = "org-1";
pub const ACTOR: &str = "tester@pmis";

/// 创建临时测试数据库（文件随句柄销毁自动清理）
pub fn create_test_db() -> (NamedTempFile, Arc<Mutex<Connection>>) {
    pmis_import_engine::logging::init_test();

    let file = NamedTempFile::new().expect("创建临时数据库文件失败");
    let path = file.path().to_str().expect("临时路径非法").to_string();

    let conn = db::open_sqlite_connection(&path).expect("打开测试数据库失败");
    db::init_schema(&conn).expect("初始化测试 schema 失败");

    (file, Arc::new(Mutex::new(conn)))
}

// ===== 参照数据种子 =====

pub fn seed_client(conn: &Arc<Mutex<Connection>>, client_id: &str, name: &str) {
    let guard = conn.lock().expect("锁获取失败");
    guard
        .execute(
            "INSERT INTO clients (client_id, organization_id, name) VALUES (?1, ?2, ?3)",
            params![client_id, ORG, name],
        )
        .expect("种子客户失败");
}

pub fn seed_currency(conn: &Arc<Mutex<Connection>>, currency_id: &str, code: &str) {
    let guard = conn.lock().expect("锁获取失败");
    guard
        .execute(
            "INSERT INTO currencies (currency_id, organization_id, code) VALUES (?1, ?2, ?3)",
            params![currency_id, ORG, code],
        )
        .expect("种子币种失败");
}

/// created_at 显式给定,保证兜底账户排序确定
pub fn seed_wallet(conn: &Arc<Mutex<Connection>>, wallet_id: &str, name: &str, created_at: &str) {
    let guard = conn.lock().expect("锁获取失败");
    guard
        .execute(
            r#"
            INSERT INTO wallets (wallet_id, organization_id, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![wallet_id, ORG, name, created_at],
        )
        .expect("种子资金账户失败");
}

pub fn seed_subcontract(
    conn: &Arc<Mutex<Connection>>,
    subcontract_id: &str,
    project_id: &str,
    provider_name: &str,
    title: &str,
    is_active: bool,
) {
    let guard = conn.lock().expect("锁获取失败");
    guard
        .execute(
            r#"
            INSERT INTO subcontracts
                (subcontract_id, organization_id, project_id, provider_name, title, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![subcontract_id, ORG, project_id, provider_name, title, is_active as i64],
        )
        .expect("种子分包合同失败");
}

/// 预置一条既有联系人（去重场景用）
pub fn seed_contact(conn: &Arc<Mutex<Connection>>, contact_id: &str, name: &str, email: &str) {
    let guard = conn.lock().expect("锁获取失败");
    guard
        .execute(
            r#"
            INSERT INTO contacts
                (contact_id, organization_id, name, email, is_deleted, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, 'seed', datetime('now'))
            "#,
            params![contact_id, ORG, name, email],
        )
        .expect("种子联系人失败");
}

// ===== 行构造 =====

pub fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ===== 配置 Mock =====

pub struct MockConfigReader {
    pub default_currency_code: String,
    pub fx_sensitive_code: String,
    pub workers: usize,
}

impl Default for MockConfigReader {
    fn default() -> Self {
        Self {
            default_currency_code: "USD".to_string(),
            fx_sensitive_code: "USD".to_string(),
            workers: 2,
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfigReader {
    async fn get_default_currency_code(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.default_currency_code.clone())
    }

    async fn get_fx_sensitive_code(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.fx_sensitive_code.clone())
    }

    async fn get_resolver_worker_count(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.workers)
    }
}

// ===== 断言辅助 =====

/// 统计目标表中某批次的 (未删除, 已软删除) 记录数
pub fn count_by_batch(conn: &Arc<Mutex<Connection>>, table: &str, batch_id: &str) -> (i64, i64) {
    let guard = conn.lock().expect("锁获取失败");
    let sql = format!(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN is_deleted = 0 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN is_deleted = 1 THEN 1 ELSE 0 END), 0)
        FROM {}
        WHERE import_batch_id = ?1
        "#,
        table
    );
    guard
        .query_row(&sql, params![batch_id], |r| Ok((r.get(0)?, r.get(1)?)))
        .expect("批次记录统计失败")
}

/// 读取批次状态
pub fn batch_status(conn: &Arc<Mutex<Connection>>, batch_id: &str) -> String {
    let guard = conn.lock().expect("锁获取失败");
    guard
        .query_row(
            "SELECT status FROM import_batch WHERE batch_id = ?1",
            params![batch_id],
            |r| r.get(0),
        )
        .expect("批次状态查询失败")
}
