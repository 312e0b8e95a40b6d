// ==========================================
// 工程项目管理系统 - 对外接口层
// ==========================================
// 职责: 导入/回滚/批次查询的对外门面与错误收敛
// 红线: 一切写操作先过鉴权门禁
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
