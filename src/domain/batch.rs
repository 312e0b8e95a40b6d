// ==========================================
// 工程项目管理系统 - 导入批次领域模型
// ==========================================
// 职责: 批次元信息、行级错误、纠偏警告、导入/回滚结果
// 红线: 行级错误只收集不抛出;批次级错误走 ApiError 通道
// ==========================================

use crate::domain::types::{BatchStatus, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 用途: 记录一次导入的元信息,所有落库记录通过 import_batch_id 回溯
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,              // 批次 ID（UUID）
    pub organization_id: String,       // 所属组织
    pub entity_type: EntityKind,       // 导入实体种类
    pub record_count: i64,             // 实际落库记录数
    pub status: BatchStatus,           // COMPLETED / REVERTED
    pub created_by: String,            // 操作人（审计）
    pub created_at: DateTime<Utc>,     // 创建时间
}

// ==========================================
// RowError - 行级错误
// ==========================================
// 用途: 单行解析失败,仅剔除该行,不中断批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,      // 源文件行号（1 起始,与源数据顺序一致）
    pub message: String, // 错误描述
}

// ==========================================
// CoercionWarning - 纠偏警告
// ==========================================
// 用途: 宽容导入策略下的静默默认值替换记录
// 说明: 不阻断该行,仅供前端提示（区别于 RowError）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionWarning {
    pub row: usize,      // 源文件行号（1 起始）
    pub field: String,   // 被纠偏的字段
    pub message: String, // 纠偏说明（原值 → 默认值）
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
// 用途: 导入接口返回值
// 约定: success + skipped == 源数据总行数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch_id: String,                // 本次导入批次 ID
    pub success: usize,                  // 成功落库行数
    pub skipped: usize,                  // 跳过行数（行错误 + 去重）
    pub errors: Vec<RowError>,           // 行级错误明细（按行号升序）
    pub warnings: Vec<CoercionWarning>,  // 纠偏警告明细（按行号升序）
}

// ==========================================
// RevertOutcome - 回滚结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevertOutcome {
    pub success: bool,        // 是否回滚成功
    pub reverted_rows: usize, // 被软删除的记录数
}
