// ==========================================
// 工程项目管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建表入口（应用启动与测试共用同一份 DDL）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// # 表清单
/// - config_kv: 全局配置
/// - import_batch: 导入批次
/// - clients / currencies / wallets / subcontracts: 参照集合（本引擎只读）
/// - contacts / client_payments / subcontract_payments: 导入目标表（软删除）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id    TEXT NOT NULL,
            key         TEXT NOT NULL,
            value       TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id        TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            entity_type     TEXT NOT NULL,
            record_count    INTEGER NOT NULL,
            status          TEXT NOT NULL,
            created_by      TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS clients (
            client_id       TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            name            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS currencies (
            currency_id     TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            code            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS wallets (
            wallet_id       TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            name            TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS subcontracts (
            subcontract_id  TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            project_id      TEXT NOT NULL,
            provider_name   TEXT NOT NULL,
            title           TEXT NOT NULL,
            is_active       INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS contacts (
            contact_id      TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            name            TEXT NOT NULL,
            email           TEXT,
            phone           TEXT,
            position        TEXT,
            address         TEXT,
            note            TEXT,
            import_batch_id TEXT,
            is_deleted      INTEGER NOT NULL DEFAULT 0,
            deleted_at      TEXT,
            created_by      TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS client_payments (
            payment_id        TEXT PRIMARY KEY,
            organization_id   TEXT NOT NULL,
            client_id         TEXT NOT NULL,
            wallet_id         TEXT NOT NULL,
            currency_id       TEXT NOT NULL,
            amount            REAL NOT NULL,
            exchange_rate     REAL NOT NULL,
            functional_amount REAL NOT NULL,
            paid_at           TEXT NOT NULL,
            description       TEXT,
            import_batch_id   TEXT,
            is_deleted        INTEGER NOT NULL DEFAULT 0,
            deleted_at        TEXT,
            created_by        TEXT NOT NULL,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subcontract_payments (
            payment_id        TEXT PRIMARY KEY,
            organization_id   TEXT NOT NULL,
            subcontract_id    TEXT NOT NULL,
            wallet_id         TEXT NOT NULL,
            currency_id       TEXT NOT NULL,
            amount            REAL NOT NULL,
            exchange_rate     REAL NOT NULL,
            functional_amount REAL NOT NULL,
            paid_at           TEXT NOT NULL,
            description       TEXT,
            import_batch_id   TEXT,
            is_deleted        INTEGER NOT NULL DEFAULT 0,
            deleted_at        TEXT,
            created_by        TEXT NOT NULL,
            created_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_contacts_org_email
            ON contacts (organization_id, email);
        CREATE INDEX IF NOT EXISTS idx_contacts_batch
            ON contacts (import_batch_id);
        CREATE INDEX IF NOT EXISTS idx_client_payments_batch
            ON client_payments (import_batch_id);
        CREATE INDEX IF NOT EXISTS idx_subcontract_payments_batch
            ON subcontract_payments (import_batch_id);
        "#,
    )?;

    Ok(())
}
