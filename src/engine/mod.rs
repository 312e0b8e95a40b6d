// ==========================================
// 工程项目管理系统 - 导入引擎层
// ==========================================
// 职责: 导入与回滚的业务编排（索引构建/行解析/校验累积/去重/落库/回滚）
// 红线: 引擎层通过 Repository trait 访问数据,不直接写 SQL
// ==========================================

pub mod dedup;
pub mod importer;
pub mod lookup;
pub mod resolver;
pub mod revert;
pub mod validator;

// 重导出核心类型
pub use importer::{BulkImporter, ImportRequest};
pub use lookup::LookupIndex;
pub use resolver::{RefQuery, ResolverContext, RowOutcome};
pub use revert::{RevertController, RevertError, REVERTIBLE_TABLES};
pub use validator::{resolve_all, ResolutionOutput};
