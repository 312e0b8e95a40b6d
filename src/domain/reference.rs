// ==========================================
// 工程项目管理系统 - 参照数据领域模型
// ==========================================
// 职责: 定义导入行对账所依赖的既有规范实体
// 红线: 本引擎对参照集合只读,不做任何修改
// ==========================================

use serde::{Deserialize, Serialize};

/// 客户（单名匹配集合: 名称 → ID 直接映射）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub organization_id: String,
    pub name: String,
}

/// 币种（按大写代码查找）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub currency_id: String,
    pub organization_id: String,
    pub code: String, // ISO 代码,存储统一大写
}

/// 资金账户（可选外键;组织无账户时钱包兜底不可用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: String,
    pub organization_id: String,
    pub name: String,
}

/// 分包合同（一对多集合: 同一供应商可有多份在行合同）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcontract {
    pub subcontract_id: String,
    pub organization_id: String,
    pub project_id: String,
    pub provider_name: String, // 供应商名称（可歧义）
    pub title: String,         // 合同名称（精确匹配键）
    pub is_active: bool,       // 仅在行合同参与解析
}
