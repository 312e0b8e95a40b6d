// ==========================================
// 工程项目管理系统 - 导入写入 Repository 实现
// ==========================================
// 职责: 实现批次与导入目标表的写入（使用 rusqlite）
// 红线: Repository 不含业务规则,只做数据 CRUD;
//       批次行与记录同一事务提交,写入失败时批次行一并回滚
// ==========================================

use crate::domain::batch::ImportBatch;
use crate::domain::record::{ResolvedContact, ResolvedPayment};
use crate::domain::types::{BatchStatus, EntityKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_repo::ImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn parse_batch_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImportBatch> {
    let entity_type_raw: String = row.get(2)?;
    let status_raw: String = row.get(4)?;
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        organization_id: row.get(1)?,
        // 历史数据中的未知取值按联系人处理不可接受,这里宁可报错
        entity_type: EntityKind::parse(&entity_type_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("未知实体种类: {}", entity_type_raw).into(),
            )
        })?,
        record_count: row.get(3)?,
        status: BatchStatus::parse(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("未知批次状态: {}", status_raw).into(),
            )
        })?,
        created_by: row.get(5)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&row.get::<_, String>(6)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn begin_tx(conn: &Connection) -> RepositoryResult<Transaction<'_>> {
    conn.unchecked_transaction()
        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
}

fn commit_tx(tx: Transaction<'_>) -> RepositoryResult<()> {
    tx.commit()
        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
}

// ==========================================
// ImportRepositoryImpl
// ==========================================
pub struct ImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务中插入批次行
    fn insert_batch_tx(tx: &Transaction, batch: &ImportBatch) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, organization_id, entity_type, record_count,
                status, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                batch.batch_id,
                batch.organization_id,
                batch.entity_type.as_str(),
                batch.record_count,
                batch.status.as_str(),
                batch.created_by,
                batch.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// 在事务中批量插入联系人
    fn bulk_insert_contacts_tx(
        tx: &Transaction,
        organization_id: &str,
        batch_id: &str,
        created_by: &str,
        records: &[ResolvedContact],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO contacts (
                contact_id, organization_id, name, email, phone, position,
                address, note, import_batch_id, is_deleted, deleted_at,
                created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, NULL, ?10, ?11)
            "#,
        )?;

        let now = Utc::now().to_rfc3339();
        let mut count = 0;
        for record in records {
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                organization_id,
                record.name,
                record.email,
                record.phone,
                record.position,
                record.address,
                record.note,
                batch_id,
                created_by,
                now,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 在事务中批量插入付款记录
    fn bulk_insert_payments_tx(
        tx: &Transaction,
        kind: EntityKind,
        organization_id: &str,
        batch_id: &str,
        created_by: &str,
        records: &[ResolvedPayment],
    ) -> RepositoryResult<usize> {
        // 两张付款表仅对方主体列名不同
        let counterparty_col = match kind {
            EntityKind::ClientPayments => "client_id",
            EntityKind::SubcontractPayments => "subcontract_id",
            EntityKind::Contacts => {
                return Err(RepositoryError::BusinessRuleViolation(
                    "联系人不走付款写入通道".to_string(),
                ));
            }
        };

        let sql = format!(
            r#"
            INSERT INTO {} (
                payment_id, organization_id, {}, wallet_id, currency_id,
                amount, exchange_rate, functional_amount, paid_at, description,
                import_batch_id, is_deleted, deleted_at, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, NULL, ?12, ?13)
            "#,
            kind.table_name(),
            counterparty_col
        );
        let mut stmt = tx.prepare(&sql)?;

        let now = Utc::now().to_rfc3339();
        let mut count = 0;
        for record in records {
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                organization_id,
                record.counterparty_id,
                record.wallet_id,
                record.currency_id,
                record.amount,
                record.exchange_rate,
                record.functional_amount,
                record.paid_at.to_rfc3339(),
                record.description,
                batch_id,
                created_by,
                now,
            ])?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl ImportRepository for ImportRepositoryImpl {
    /// 提交联系人批次（批次行 + 记录,单事务）
    async fn commit_contact_batch(
        &self,
        batch: ImportBatch,
        records: Vec<ResolvedContact>,
    ) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = begin_tx(&conn)?;

        Self::insert_batch_tx(&tx, &batch)?;
        let count = Self::bulk_insert_contacts_tx(
            &tx,
            &batch.organization_id,
            &batch.batch_id,
            &batch.created_by,
            &records,
        )?;

        commit_tx(tx)?;
        Ok(count)
    }

    /// 提交付款批次（批次行 + 记录,单事务）
    async fn commit_payment_batch(
        &self,
        batch: ImportBatch,
        records: Vec<ResolvedPayment>,
    ) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = begin_tx(&conn)?;

        Self::insert_batch_tx(&tx, &batch)?;
        let count = Self::bulk_insert_payments_tx(
            &tx,
            batch.entity_type,
            &batch.organization_id,
            &batch.batch_id,
            &batch.created_by,
            &records,
        )?;

        commit_tx(tx)?;
        Ok(count)
    }

    /// 按 ID 查询批次
    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let result = conn.query_row(
            r#"
            SELECT batch_id, organization_id, entity_type, record_count,
                   status, created_by, created_at
            FROM import_batch
            WHERE batch_id = ?1
            "#,
            params![batch_id],
            parse_batch_row,
        );

        match result {
            Ok(batch) => Ok(Some(batch)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询组织最近的导入批次
    async fn get_recent_batches(
        &self,
        organization_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, organization_id, entity_type, record_count,
                   status, created_by, created_at
            FROM import_batch
            WHERE organization_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )?;

        let batches = stmt
            .query_map(params![organization_id, limit], parse_batch_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }

    /// 回滚批次（状态翻转 + 软删除,单事务）
    async fn revert_batch(&self, batch_id: &str, kind: EntityKind) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = begin_tx(&conn)?;

        tx.execute(
            "UPDATE import_batch SET status = ?1 WHERE batch_id = ?2",
            params![BatchStatus::Reverted.as_str(), batch_id],
        )?;

        // 软删除: 只翻转标志位与时间戳,保留审计痕迹
        let sql = format!(
            r#"
            UPDATE {}
            SET is_deleted = 1, deleted_at = ?1
            WHERE import_batch_id = ?2 AND is_deleted = 0
            "#,
            kind.table_name()
        );
        let reverted = tx.execute(&sql, params![Utc::now().to_rfc3339(), batch_id])?;

        commit_tx(tx)?;
        Ok(reverted)
    }

    /// 统计批次在目标表中的记录数
    async fn count_rows_by_batch(
        &self,
        batch_id: &str,
        kind: EntityKind,
    ) -> RepositoryResult<(usize, usize)> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN is_deleted = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN is_deleted = 1 THEN 1 ELSE 0 END), 0)
            FROM {}
            WHERE import_batch_id = ?1
            "#,
            kind.table_name()
        );

        let (live, deleted): (i64, i64) =
            conn.query_row(&sql, params![batch_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;

        Ok((live as usize, deleted as usize))
    }
}
