// ==========================================
// 工程项目管理系统 - 对外接口错误
// ==========================================
// 职责: 把引擎/仓储内部错误收敛为对外稳定的错误分类
// 红线: 对外错误消息不携带 SQL 与内部路径
// ==========================================

use crate::engine::revert::RevertError;
use thiserror::Error;

// ==========================================
// ApiError - 接口层错误
// ==========================================
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("未授权: {0}")]
    Unauthorized(String),

    #[error("请求参数不合法: {0}")]
    InvalidInput(String),

    #[error("资源不存在: {0}")]
    NotFound(String),

    #[error("操作被业务规则拒绝: {0}")]
    BusinessRuleViolation(String),

    #[error("导入执行失败: {0}")]
    ImportError(String),

    #[error("数据库访问失败: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<RevertError> for ApiError {
    fn from(e: RevertError) -> Self {
        match e {
            RevertError::TableNotAllowed(_) => ApiError::InvalidInput(e.to_string()),
            RevertError::BatchNotFound(_) => ApiError::NotFound(e.to_string()),
            RevertError::AlreadyReverted(_) | RevertError::TableMismatch { .. } => {
                ApiError::BusinessRuleViolation(e.to_string())
            }
            RevertError::Storage(msg) => ApiError::DatabaseError(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
