// ==========================================
// 工程项目管理系统 - 领域模型层
// ==========================================
// 职责: 定义导入引擎的实体、类型与解析结果结构
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod batch;
pub mod record;
pub mod reference;
pub mod types;

// 重导出核心类型
pub use batch::{CoercionWarning, ImportBatch, ImportOutcome, RevertOutcome, RowError};
pub use record::{
    FieldKind, FieldSpec, RawRow, ResolvedContact, ResolvedPayment, ResolvedRecord,
};
pub use reference::{Client, Currency, Subcontract, Wallet};
pub use types::{BatchStatus, EntityKind};
