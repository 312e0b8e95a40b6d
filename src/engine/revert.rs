// ==========================================
// 工程项目管理系统 - 批次回滚控制器
// ==========================================
// 职责: 校验回滚请求（允许表/批次存在/状态/表匹配）后委托仓储软删除
// 红线: 允许回滚的表是硬编码白名单,任何校验不过都不触碰任何记录;
//       已回滚批次再次回滚必须显式拒绝,绝不静默成功
// ==========================================

use crate::domain::batch::RevertOutcome;
use crate::domain::types::BatchStatus;
use crate::repository::import_repo::ImportRepository;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// 允许回滚的目标表白名单
pub const REVERTIBLE_TABLES: [&str; 3] = ["contacts", "client_payments", "subcontract_payments"];

// ==========================================
// RevertError - 回滚错误
// ==========================================
#[derive(Debug, Error)]
pub enum RevertError {
    #[error("目标表不允许回滚: {0}")]
    TableNotAllowed(String),

    #[error("批次不存在: {0}")]
    BatchNotFound(String),

    #[error("批次已回滚,不可重复回滚: {0}")]
    AlreadyReverted(String),

    #[error("批次实体种类与目标表不匹配: 批次为 {actual},请求表为 {requested}")]
    TableMismatch { actual: String, requested: String },

    #[error("回滚存储操作失败: {0}")]
    Storage(String),
}

// ==========================================
// RevertController - 回滚控制器
// ==========================================
pub struct RevertController<R>
where
    R: ImportRepository + ?Sized,
{
    repo: Arc<R>,
}

impl<R> RevertController<R>
where
    R: ImportRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 回滚一个导入批次
    ///
    /// # 参数
    /// - batch_id: 批次 ID
    /// - table: 目标表名（必须在白名单内,且与批次实体种类一致）
    ///
    /// # 流程
    /// 1. 白名单校验（不过 → 整体失败,零记录被触碰）
    /// 2. 批次存在性校验
    /// 3. 状态校验（REVERTED → 显式拒绝）
    /// 4. 实体种类与请求表一致性校验
    /// 5. 单事务: 批次状态翻转 + 目标表软删除
    pub async fn revert(&self, batch_id: &str, table: &str) -> Result<RevertOutcome, RevertError> {
        if !REVERTIBLE_TABLES.contains(&table) {
            warn!(batch_id, table, "回滚请求被白名单拒绝");
            return Err(RevertError::TableNotAllowed(table.to_string()));
        }

        let batch = self
            .repo
            .get_batch(batch_id)
            .await
            .map_err(|e| RevertError::Storage(e.to_string()))?
            .ok_or_else(|| RevertError::BatchNotFound(batch_id.to_string()))?;

        if batch.status == BatchStatus::Reverted {
            return Err(RevertError::AlreadyReverted(batch_id.to_string()));
        }

        let kind = batch.entity_type;
        if kind.table_name() != table {
            return Err(RevertError::TableMismatch {
                actual: kind.table_name().to_string(),
                requested: table.to_string(),
            });
        }

        let reverted_rows = self
            .repo
            .revert_batch(batch_id, kind)
            .await
            .map_err(|e| RevertError::Storage(e.to_string()))?;

        info!(batch_id, table, reverted_rows, "批次回滚完成");

        Ok(RevertOutcome {
            success: true,
            reverted_rows,
        })
    }
}

impl RevertError {
    /// 判定是否由调用方请求不合法引起（区别于存储故障）
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, RevertError::Storage(_))
    }
}
