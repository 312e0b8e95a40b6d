// ==========================================
// 工程项目管理系统 - 批量导入器
// ==========================================
// 职责: 编排一次完整导入: 构建索引 → 并发解析 → 去重 → 建批次 → 批量落库
// 红线: 批次在校验完成后、写入之前创建,record_count 为最终落库数;
//       行失败只剔除该行,批次照常推进
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::domain::batch::{ImportBatch, ImportOutcome};
use crate::domain::record::{RawRow, ResolvedContact, ResolvedPayment, ResolvedRecord};
use crate::domain::types::{BatchStatus, EntityKind};
use crate::engine::dedup::filter_existing_contacts;
use crate::engine::lookup::LookupIndex;
use crate::engine::resolver::ResolverContext;
use crate::engine::validator::resolve_all;
use crate::repository::import_repo::ImportRepository;
use crate::repository::reference_repo::ReferenceRepository;
use chrono::Utc;
use std::error::Error;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// ==========================================
// ImportRequest - 导入请求
// ==========================================
#[derive(Debug)]
pub struct ImportRequest {
    pub kind: EntityKind,
    pub organization_id: String,
    pub project_id: Option<String>, // 仅分包付款使用（限定合同范围）
    pub rows: Vec<RawRow>,
    pub actor: String, // 已通过鉴权的操作人
}

// ==========================================
// BulkImporter - 批量导入器
// ==========================================
// 用途: 导入流程编排,依赖通过 trait 注入（便于测试替换）
pub struct BulkImporter<R, F, C>
where
    R: ImportRepository + ?Sized,
    F: ReferenceRepository + ?Sized,
    C: ImportConfigReader + ?Sized,
{
    import_repo: Arc<R>,
    reference_repo: Arc<F>,
    config: Arc<C>,
}

impl<R, F, C> BulkImporter<R, F, C>
where
    R: ImportRepository + ?Sized,
    F: ReferenceRepository + ?Sized,
    C: ImportConfigReader + ?Sized,
{
    pub fn new(import_repo: Arc<R>, reference_repo: Arc<F>, config: Arc<C>) -> Self {
        Self {
            import_repo,
            reference_repo,
            config,
        }
    }

    /// 执行一次完整导入
    ///
    /// # 流程
    /// 1. 构建组织隔离的查找索引
    /// 2. 读取配置快照（默认币种 / 汇率敏感币种 / 并发度）
    /// 3. 并发解析整批行,累积记录与行错误
    /// 4. 联系人导入: 组织内邮箱去重（静默跳过）
    /// 5. 批次与记录原子落库（批次行 + 全部记录同一事务,状态 COMPLETED,
    ///    record_count = 最终落库数）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): success + skipped == 总行数
    /// - Err: 批次级失败（索引构建/配置/落库的基础设施错误）
    pub async fn import(&self, request: ImportRequest) -> Result<ImportOutcome, Box<dyn Error>> {
        let total = request.rows.len();
        info!(
            kind = %request.kind,
            organization_id = %request.organization_id,
            total,
            actor = %request.actor,
            "开始批量导入"
        );

        // === 步骤 1: 查找索引 ===
        let index = Arc::new(
            LookupIndex::build(
                self.reference_repo.as_ref(),
                request.kind,
                &request.organization_id,
                request.project_id.as_deref(),
            )
            .await?,
        );

        // === 步骤 2: 配置快照 ===
        let ctx = ResolverContext {
            default_currency_code: self.config.get_default_currency_code().await?,
            fx_sensitive_code: self.config.get_fx_sensitive_code().await?,
        };
        let workers = self.config.get_resolver_worker_count().await?;

        // === 步骤 3: 并发解析 ===
        let resolution = resolve_all(request.kind, request.rows, index, ctx, workers).await?;
        let errors = resolution.errors;
        let warnings = resolution.warnings;

        // === 步骤 4: 去重（仅联系人）+ 记录拆分 ===
        let (contacts, payments, dedup_skipped) = match request.kind {
            EntityKind::Contacts => {
                let resolved = split_contacts(resolution.records);
                let (kept, skipped) = filter_existing_contacts(
                    self.reference_repo.as_ref(),
                    &request.organization_id,
                    resolved,
                )
                .await?;
                (kept, vec![], skipped)
            }
            EntityKind::ClientPayments | EntityKind::SubcontractPayments => {
                (vec![], split_payments(resolution.records), 0)
            }
        };

        let write_count = contacts.len() + payments.len();

        // === 步骤 5: 批次与记录原子落库 ===
        // 批次行与记录同一事务提交: 写入失败时批次行一并回滚,
        // 不允许出现零记录的 COMPLETED 孤儿批次
        let batch = ImportBatch {
            batch_id: Uuid::new_v4().to_string(),
            organization_id: request.organization_id.clone(),
            entity_type: request.kind,
            record_count: write_count as i64,
            status: BatchStatus::Completed,
            created_by: request.actor.clone(),
            created_at: Utc::now(),
        };
        let batch_id = batch.batch_id.clone();

        let inserted = match request.kind {
            EntityKind::Contacts => {
                self.import_repo
                    .commit_contact_batch(batch, contacts)
                    .await?
            }
            EntityKind::ClientPayments | EntityKind::SubcontractPayments => {
                self.import_repo
                    .commit_payment_batch(batch, payments)
                    .await?
            }
        };

        let outcome = ImportOutcome {
            batch_id,
            success: inserted,
            skipped: total - inserted,
            errors,
            warnings,
        };

        info!(
            batch_id = %outcome.batch_id,
            success = outcome.success,
            skipped = outcome.skipped,
            row_errors = outcome.errors.len(),
            dedup_skipped,
            "批量导入完成"
        );

        Ok(outcome)
    }
}

fn split_contacts(records: Vec<ResolvedRecord>) -> Vec<ResolvedContact> {
    records
        .into_iter()
        .filter_map(|r| match r {
            ResolvedRecord::Contact(c) => Some(c),
            _ => None,
        })
        .collect()
}

fn split_payments(records: Vec<ResolvedRecord>) -> Vec<ResolvedPayment> {
    records
        .into_iter()
        .filter_map(|r| match r {
            ResolvedRecord::ClientPayment(p) | ResolvedRecord::SubcontractPayment(p) => Some(p),
            _ => None,
        })
        .collect()
}
