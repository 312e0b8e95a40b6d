// ==========================================
// 工程项目管理系统 - 导入写入 Repository Trait
// ==========================================
// 职责: 定义批次与导入目标表的写入接口（不包含业务逻辑）
// 红线: Repository 不含业务规则,只做数据 CRUD;
//       批次行与记录必须同一事务提交,不允许只剩批次行的孤儿状态;
//       回滚只翻转 is_deleted/deleted_at,绝不物理删除
// ==========================================

use crate::domain::batch::ImportBatch;
use crate::domain::record::{ResolvedContact, ResolvedPayment};
use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportRepository Trait
// ==========================================
// 用途: 导入批次与记录的写入访问
// 实现者: ImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ImportRepository: Send + Sync {
    // ===== 批次提交（原子）=====

    /// 提交联系人批次: 批次行与全部记录在同一事务内落库
    ///
    /// # 返回
    /// - Ok(usize): 成功插入的记录数
    /// - Err: 数据库错误（整个事务回滚,批次行也不落库）
    async fn commit_contact_batch(
        &self,
        batch: ImportBatch,
        records: Vec<ResolvedContact>,
    ) -> RepositoryResult<usize>;

    /// 提交付款批次（客户回款或分包付款,按批次实体种类选表）
    ///
    /// # 返回
    /// - Ok(usize): 成功插入的记录数
    /// - Err: 数据库错误（整个事务回滚,批次行也不落库）
    async fn commit_payment_batch(
        &self,
        batch: ImportBatch,
        records: Vec<ResolvedPayment>,
    ) -> RepositoryResult<usize>;

    // ===== 批次查询 =====

    /// 按 ID 查询批次
    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>>;

    /// 查询组织最近的导入批次
    async fn get_recent_batches(
        &self,
        organization_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>>;

    // ===== 批次回滚 =====

    /// 回滚批次: 批次状态翻转 + 目标表软删除,单事务提交
    ///
    /// # 参数
    /// - batch_id: 批次 ID
    /// - kind: 目标表（调用方已通过允许表校验）
    ///
    /// # 返回
    /// - Ok(usize): 被软删除的记录数
    async fn revert_batch(&self, batch_id: &str, kind: EntityKind) -> RepositoryResult<usize>;

    // ===== 统计 =====

    /// 统计批次在目标表中的记录数
    ///
    /// # 返回
    /// - (live, deleted): 未删除数 / 已软删除数
    async fn count_rows_by_batch(
        &self,
        batch_id: &str,
        kind: EntityKind,
    ) -> RepositoryResult<(usize, usize)>;
}
