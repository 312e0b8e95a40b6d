// ==========================================
// 工程项目管理系统 - 导入引擎基础类型
// ==========================================
// 职责: 定义实体种类、批次状态等枚举类型
// 红线: 枚举与数据库存储字符串一一对应,不允许隐式转换
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// EntityKind - 可导入实体种类
// ==========================================
// 用途: 标识一次导入批次的目标实体
// 对齐: import_batch.entity_type 列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// 联系人（按邮箱去重）
    Contacts,
    /// 客户回款
    ClientPayments,
    /// 分包付款
    SubcontractPayments,
}

impl EntityKind {
    /// 数据库存储值（同时也是目标表名）
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Contacts => "contacts",
            EntityKind::ClientPayments => "client_payments",
            EntityKind::SubcontractPayments => "subcontract_payments",
        }
    }

    /// 导入目标表名
    pub fn table_name(&self) -> &'static str {
        self.as_str()
    }

    /// 从存储值解析
    pub fn parse(raw: &str) -> Option<EntityKind> {
        match raw.trim() {
            "contacts" => Some(EntityKind::Contacts),
            "client_payments" => Some(EntityKind::ClientPayments),
            "subcontract_payments" => Some(EntityKind::SubcontractPayments),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// BatchStatus - 导入批次状态
// ==========================================
// 状态机: COMPLETED → REVERTED,单向且仅一次
// 红线: 批次只在全部行解析并落库成功后才创建,不存在 pending/failed 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Completed,
    Reverted,
}

impl BatchStatus {
    /// 数据库存储值（全大写）
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Reverted => "REVERTED",
        }
    }

    /// 从存储值解析
    pub fn parse(raw: &str) -> Option<BatchStatus> {
        match raw.trim() {
            "COMPLETED" => Some(BatchStatus::Completed),
            "REVERTED" => Some(BatchStatus::Reverted),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_roundtrip() {
        for kind in [
            EntityKind::Contacts,
            EntityKind::ClientPayments,
            EntityKind::SubcontractPayments,
        ] {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("projects"), None);
    }

    #[test]
    fn test_batch_status_roundtrip() {
        assert_eq!(BatchStatus::parse("COMPLETED"), Some(BatchStatus::Completed));
        assert_eq!(BatchStatus::parse("REVERTED"), Some(BatchStatus::Reverted));
        assert_eq!(BatchStatus::parse("PENDING"), None);
    }
}
