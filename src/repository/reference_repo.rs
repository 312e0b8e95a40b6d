// ==========================================
// 工程项目管理系统 - 参照数据 Repository
// ==========================================
// 职责: 按组织/项目一次性加载参照集合（客户/币种/资金账户/分包合同）
// 红线: 每个集合一次往返,不做逐行查询;本层对参照数据只读
// ==========================================

use crate::domain::reference::{Client, Currency, Subcontract, Wallet};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::domain::types::EntityKind;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ReferenceRepository Trait
// ==========================================
// 用途: 导入引擎的参照数据访问接口
// 实现者: ReferenceRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// 加载组织的全部客户（一次往返）
    async fn load_clients(&self, organization_id: &str) -> RepositoryResult<Vec<Client>>;

    /// 加载组织的全部币种（一次往返）
    async fn load_currencies(
        &self,
        organization_id: &str,
    ) -> RepositoryResult<Vec<Currency>>;

    /// 加载组织的全部资金账户（按创建顺序,首个为兜底账户）
    async fn load_wallets(&self, organization_id: &str) -> RepositoryResult<Vec<Wallet>>;

    /// 加载组织/项目范围内的在行分包合同（一次往返）
    ///
    /// # 参数
    /// - project_id: 可选的项目过滤;None 时取组织全部
    async fn load_subcontracts(
        &self,
        organization_id: &str,
        project_id: Option<&str>,
    ) -> RepositoryResult<Vec<Subcontract>>;

    /// 批量检查联系人邮箱是否已存在（去重守卫的唯一一次存在性查询）
    ///
    /// # 参数
    /// - emails: 候选邮箱（已小写规范化）
    ///
    /// # 返回
    /// - 已存在于组织内且未软删除的邮箱（小写）
    async fn existing_contact_emails(
        &self,
        organization_id: &str,
        emails: &[String],
    ) -> RepositoryResult<Vec<String>>;
}

// ==========================================
// ReferenceRepositoryImpl
// ==========================================
pub struct ReferenceRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceRepositoryImpl {
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
}

#[async_trait]
impl ReferenceRepository for ReferenceRepositoryImpl {
    async fn load_clients(&self, organization_id: &str) -> RepositoryResult<Vec<Client>> {
        let conn = self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT client_id, organization_id, name FROM clients WHERE organization_id = ?1",
        )?;

        let clients = stmt
            .query_map(params![organization_id], |row| {
                Ok(Client {
                    client_id: row.get(0)?,
                    organization_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    async fn load_currencies(
        &self,
        organization_id: &str,
    ) -> RepositoryResult<Vec<Currency>> {
        let conn = self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT currency_id, organization_id, code FROM currencies WHERE organization_id = ?1",
        )?;

        let currencies = stmt
            .query_map(params![organization_id], |row| {
                Ok(Currency {
                    currency_id: row.get(0)?,
                    organization_id: row.get(1)?,
                    code: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(currencies)
    }

    async fn load_wallets(&self, organization_id: &str) -> RepositoryResult<Vec<Wallet>> {
        let conn = self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))?;

        // 首个账户为钱包兜底,排序必须确定
        let mut stmt = conn.prepare(
            r#"
            SELECT wallet_id, organization_id, name
            FROM wallets
            WHERE organization_id = ?1
            ORDER BY created_at ASC, wallet_id ASC
            "#,
        )?;

        let wallets = stmt
            .query_map(params![organization_id], |row| {
                Ok(Wallet {
                    wallet_id: row.get(0)?,
                    organization_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(wallets)
    }

    async fn load_subcontracts(
        &self,
        organization_id: &str,
        project_id: Option<&str>,
    ) -> RepositoryResult<Vec<Subcontract>> {
        let conn = self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Subcontract> {
            Ok(Subcontract {
                subcontract_id: row.get(0)?,
                organization_id: row.get(1)?,
                project_id: row.get(2)?,
                provider_name: row.get(3)?,
                title: row.get(4)?,
                is_active: row.get::<_, i64>(5)? != 0,
            })
        };

        let subcontracts = match project_id {
            Some(pid) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT subcontract_id, organization_id, project_id,
                           provider_name, title, is_active
                    FROM subcontracts
                    WHERE organization_id = ?1 AND project_id = ?2 AND is_active = 1
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![organization_id, pid], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT subcontract_id, organization_id, project_id,
                           provider_name, title, is_active
                    FROM subcontracts
                    WHERE organization_id = ?1 AND is_active = 1
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![organization_id], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(subcontracts)
    }

    async fn existing_contact_emails(
        &self,
        organization_id: &str,
        emails: &[String],
    ) -> RepositoryResult<Vec<String>> {
        if emails.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))?;

        // 构建 IN 子句的占位符
        let placeholders = emails.iter().map(|_| "?").collect::<Vec<_>>().join(",");

        let query = format!(
            r#"
            SELECT LOWER(email) FROM {}
            WHERE organization_id = ? AND is_deleted = 0
              AND email IS NOT NULL AND LOWER(email) IN ({})
            "#,
            EntityKind::Contacts.table_name(),
            placeholders
        );

        let mut stmt = conn.prepare(&query)?;

        // 绑定参数: 组织 ID + 候选邮箱
        let mut bind: Vec<&dyn rusqlite::ToSql> = vec![&organization_id];
        for email in emails {
            bind.push(email as &dyn rusqlite::ToSql);
        }

        let existing = stmt
            .query_map(bind.as_slice(), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(existing)
    }
}
