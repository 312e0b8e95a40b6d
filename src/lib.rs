// ==========================================
// 工程项目管理系统 - 批量导入与对账引擎
// ==========================================
// 职责: 联系人/客户回款/分包付款的批量导入、外键分层解析、
//       派生字段计算、批次追踪与可逆回滚
// 分层: api → engine → repository → SQLite
// 红线: 行级失败只剔除该行;批次级失败整体拒绝;
//       回滚只做软删除,绝不物理删除
// ==========================================

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod logging;
pub mod repository;

// 重导出常用类型,调用方无需关心内部分层
pub use api::{ApiError, ApiResult, ImportApi};
pub use domain::batch::{CoercionWarning, ImportBatch, ImportOutcome, RevertOutcome, RowError};
pub use domain::record::{RawRow, ResolvedRecord};
pub use domain::types::{BatchStatus, EntityKind};
pub use engine::{BulkImporter, ImportRequest, RevertController, RevertError};
