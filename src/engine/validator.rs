// ==========================================
// 工程项目管理系统 - 校验累积器
// ==========================================
// 职责: 对整批原始行做并发解析,累积记录/错误/警告
// 红线: 行失败绝不中断批次（全量过一遍,一次性反馈所有问题）;
//       并发度有上界,查找索引只读共享
// ==========================================

use crate::domain::batch::{CoercionWarning, RowError};
use crate::domain::record::{RawRow, ResolvedRecord};
use crate::domain::types::EntityKind;
use crate::engine::lookup::LookupIndex;
use crate::engine::resolver::{resolve_row, ResolverContext};
use std::error::Error;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// ResolutionOutput - 整批解析结果
// ==========================================
// 约定: records 与 errors 按行号升序;同一行号只会出现在其中一侧
#[derive(Debug, Default)]
pub struct ResolutionOutput {
    pub records: Vec<ResolvedRecord>,
    pub errors: Vec<RowError>,
    pub warnings: Vec<CoercionWarning>,
}

/// 并发解析整批原始行
///
/// # 参数
/// - kind: 实体种类
/// - rows: 原始行（行号已在入口处编好）
/// - index: 查找索引（只读共享）
/// - ctx: 配置快照
/// - workers: 并发工作者上界（配置给定,至少为 1）
///
/// # 说明
/// - 行切成至多 workers 个连续分片,每个分片一个任务;
///   单行解析是纯同步计算,任务内顺序处理分片
/// - 合并后按行号排序,对调用方呈现确定性顺序
pub async fn resolve_all(
    kind: EntityKind,
    rows: Vec<RawRow>,
    index: Arc<LookupIndex>,
    ctx: ResolverContext,
    workers: usize,
) -> Result<ResolutionOutput, Box<dyn Error>> {
    let total = rows.len();
    if total == 0 {
        return Ok(ResolutionOutput::default());
    }

    let workers = workers.max(1).min(total);
    let chunk_size = total.div_ceil(workers);

    let mut handles = Vec::with_capacity(workers);
    let mut rows = rows;
    while !rows.is_empty() {
        let chunk: Vec<RawRow> = rows.drain(..chunk_size.min(rows.len())).collect();
        let index = Arc::clone(&index);
        let ctx = ctx.clone();

        handles.push(tokio::spawn(async move {
            let mut partial = ResolutionOutput::default();
            for row in &chunk {
                let outcome = resolve_row(kind, row, &index, &ctx);
                if let Some(record) = outcome.record {
                    partial.records.push(record);
                }
                if let Some(error) = outcome.error {
                    partial.errors.push(error);
                }
                partial.warnings.extend(outcome.warnings);
            }
            partial
        }));
    }

    let mut output = ResolutionOutput::default();
    for joined in futures::future::join_all(handles).await {
        let partial = joined.map_err(|e| format!("解析任务失败: {}", e))?;
        output.records.extend(partial.records);
        output.errors.extend(partial.errors);
        output.warnings.extend(partial.warnings);
    }

    // 分片并发完成顺序不定,统一按行号排序
    output.records.sort_by_key(|r| r.row_number());
    output.errors.sort_by_key(|e| e.row);
    output.warnings.sort_by_key(|w| w.row);

    debug!(
        kind = %kind,
        total,
        resolved = output.records.len(),
        failed = output.errors.len(),
        warned = output.warnings.len(),
        "整批行解析完成"
    );

    Ok(output)
}
