// ==========================================
// 工程项目管理系统 - 批量导入对外接口
// ==========================================
// 职责: 鉴权门禁 + 入参整形 + 引擎编排调用 + 错误收敛
// 红线: 操作人缺失一律整体拒绝（Unauthorized）,绝不匿名落库;
//       同一接口实例内共享单个数据库连接
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::batch::{ImportBatch, ImportOutcome, RevertOutcome};
use crate::domain::record::RawRow;
use crate::domain::types::EntityKind;
use crate::engine::importer::{BulkImporter, ImportRequest};
use crate::engine::revert::RevertController;
use crate::repository::import_repo_impl::ImportRepositoryImpl;
use crate::repository::reference_repo::ReferenceRepositoryImpl;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ImportApi - 导入接口门面
// ==========================================
pub struct ImportApi {
    conn: Arc<Mutex<Connection>>,
}

impl ImportApi {
    /// 打开数据库并初始化表结构
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        crate::db::init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（测试与嵌入场景）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 鉴权门禁: 操作人缺失 → 整体拒绝
    fn require_actor(actor: Option<&str>) -> ApiResult<String> {
        match actor {
            Some(a) if !a.trim().is_empty() => Ok(a.trim().to_string()),
            _ => {
                warn!("拒绝匿名导入操作");
                Err(ApiError::Unauthorized("未登录或会话已失效".to_string()))
            }
        }
    }

    /// 批量导入
    ///
    /// # 参数
    /// - kind: 实体种类
    /// - organization_id: 组织 ID
    /// - project_id: 项目 ID（仅分包付款需要）
    /// - rows: 原始行字段表,顺序即源数据顺序
    /// - actor: 操作人（None → Unauthorized）
    pub async fn import_rows(
        &self,
        kind: EntityKind,
        organization_id: &str,
        project_id: Option<String>,
        rows: Vec<HashMap<String, String>>,
        actor: Option<&str>,
    ) -> ApiResult<ImportOutcome> {
        let actor = Self::require_actor(actor)?;

        if organization_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("组织 ID 不能为空".to_string()));
        }

        // 行号 1 起始,与源数据顺序一致
        let raw_rows: Vec<RawRow> = rows
            .into_iter()
            .enumerate()
            .map(|(i, fields)| RawRow::new(i + 1, fields))
            .collect();

        let config = ConfigManager::from_connection(Arc::clone(&self.conn))
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        let importer = BulkImporter::new(
            Arc::new(ImportRepositoryImpl::from_connection(Arc::clone(&self.conn))),
            Arc::new(ReferenceRepositoryImpl::from_connection(Arc::clone(&self.conn))),
            Arc::new(config),
        );

        importer
            .import(ImportRequest {
                kind,
                organization_id: organization_id.to_string(),
                project_id,
                rows: raw_rows,
                actor,
            })
            .await
            .map_err(|e| ApiError::ImportError(e.to_string()))
    }

    /// 批量导入（JSON 入口）
    ///
    /// # 说明
    /// - 前端传来的行数组里数值/布尔不保证是字符串,这里统一转成字符串
    ///   再进入与 import_rows 相同的通道;null 字段视为缺失
    pub async fn import_json(
        &self,
        kind: EntityKind,
        organization_id: &str,
        project_id: Option<String>,
        rows: serde_json::Value,
        actor: Option<&str>,
    ) -> ApiResult<ImportOutcome> {
        let rows = Self::rows_from_json(rows)?;
        self.import_rows(kind, organization_id, project_id, rows, actor)
            .await
    }

    fn rows_from_json(value: serde_json::Value) -> ApiResult<Vec<HashMap<String, String>>> {
        let items = value
            .as_array()
            .ok_or_else(|| ApiError::InvalidInput("行数据必须是 JSON 数组".to_string()))?;

        items
            .iter()
            .map(|item| {
                let obj = item.as_object().ok_or_else(|| {
                    ApiError::InvalidInput("每一行必须是 JSON 对象".to_string())
                })?;

                Ok(obj
                    .iter()
                    .filter_map(|(key, v)| {
                        let text = match v {
                            serde_json::Value::Null => return None,
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        Some((key.clone(), text))
                    })
                    .collect())
            })
            .collect()
    }

    /// 回滚一个导入批次
    pub async fn revert_batch(
        &self,
        batch_id: &str,
        table: &str,
        actor: Option<&str>,
    ) -> ApiResult<RevertOutcome> {
        Self::require_actor(actor)?;

        let controller = RevertController::new(Arc::new(ImportRepositoryImpl::from_connection(
            Arc::clone(&self.conn),
        )));

        Ok(controller.revert(batch_id, table).await?)
    }

    /// 查询组织最近的导入批次
    pub async fn recent_batches(
        &self,
        organization_id: &str,
        limit: usize,
        actor: Option<&str>,
    ) -> ApiResult<Vec<ImportBatch>> {
        use crate::repository::import_repo::ImportRepository;

        Self::require_actor(actor)?;

        let repo = ImportRepositoryImpl::from_connection(Arc::clone(&self.conn));
        repo.get_recent_batches(organization_id, limit)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }
}
