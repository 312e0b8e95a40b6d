// ==========================================
// 工程项目管理系统 - 导入行与解析结果模型
// ==========================================
// 职责: 原始行、字段 schema、解析完成的规范记录
// 红线: 原始行是松散的字符串映射,解析结果必须是强类型;
//       每种实体的字段 schema 在编译期穷举,不走隐式弱类型
// ==========================================

use crate::domain::types::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// RawRow - 原始导入行
// ==========================================
// 用途: 上游解析器（CSV/表格,协作方）产出的单行数据
// 生命周期: 仅在一次导入调用内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize,               // 源文件行号（1 起始）
    pub fields: HashMap<String, String>, // 列标识 → 原始值
}

impl RawRow {
    pub fn new(row_number: usize, fields: HashMap<String, String>) -> Self {
        Self { row_number, fields }
    }

    /// 读取字段值（去除首尾空白,空串视为缺失）
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

// ==========================================
// FieldKind - 字段期望类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,      // 文本,原样保留（去空白）
    Reference, // 外键引用（ID 或名称,分层解析）
    Currency,  // 币种代码（大写规范化）
    Amount,    // 金额（非数值默认 0）
    Rate,      // 汇率（非数值默认 1）
    Date,      // 日期（解析失败默认当前时间,记警告）
    Email,     // 邮箱（小写规范化,去重自然键）
}

// ==========================================
// FieldSpec - 字段 schema
// ==========================================
// 用途: 每种实体的导入字段定义（字段名 + 必填标志 + 期望类型）
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

/// 联系人导入 schema
pub const CONTACT_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "name", required: true, kind: FieldKind::Text },
    FieldSpec { name: "email", required: false, kind: FieldKind::Email },
    FieldSpec { name: "phone", required: false, kind: FieldKind::Text },
    FieldSpec { name: "position", required: false, kind: FieldKind::Text },
    FieldSpec { name: "address", required: false, kind: FieldKind::Text },
    FieldSpec { name: "note", required: false, kind: FieldKind::Text },
];

/// 客户回款导入 schema
pub const CLIENT_PAYMENT_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "client", required: true, kind: FieldKind::Reference },
    FieldSpec { name: "amount", required: false, kind: FieldKind::Amount },
    FieldSpec { name: "currency_code", required: false, kind: FieldKind::Currency },
    FieldSpec { name: "exchange_rate", required: false, kind: FieldKind::Rate },
    FieldSpec { name: "paid_at", required: false, kind: FieldKind::Date },
    FieldSpec { name: "wallet", required: false, kind: FieldKind::Reference },
    FieldSpec { name: "description", required: false, kind: FieldKind::Text },
];

/// 分包付款导入 schema
pub const SUBCONTRACT_PAYMENT_SCHEMA: &[FieldSpec] = &[
    FieldSpec { name: "provider", required: true, kind: FieldKind::Reference },
    FieldSpec { name: "amount", required: false, kind: FieldKind::Amount },
    FieldSpec { name: "currency_code", required: false, kind: FieldKind::Currency },
    FieldSpec { name: "exchange_rate", required: false, kind: FieldKind::Rate },
    FieldSpec { name: "paid_at", required: false, kind: FieldKind::Date },
    FieldSpec { name: "wallet", required: false, kind: FieldKind::Reference },
    FieldSpec { name: "description", required: false, kind: FieldKind::Text },
];

impl EntityKind {
    /// 该实体的导入字段 schema
    pub fn import_schema(&self) -> &'static [FieldSpec] {
        match self {
            EntityKind::Contacts => CONTACT_SCHEMA,
            EntityKind::ClientPayments => CLIENT_PAYMENT_SCHEMA,
            EntityKind::SubcontractPayments => SUBCONTRACT_PAYMENT_SCHEMA,
        }
    }
}

// ==========================================
// ResolvedContact - 解析完成的联系人
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedContact {
    pub row_number: usize,
    pub name: String,
    pub email: Option<String>, // 已小写规范化（去重自然键）
    pub phone: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    pub note: Option<String>,
}

// ==========================================
// ResolvedPayment - 解析完成的付款记录
// ==========================================
// 用途: 客户回款与分包付款共用的金额侧字段
// 说明: counterparty_id 的含义由实体种类决定
//       （client_payments → client_id, subcontract_payments → subcontract_id）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPayment {
    pub row_number: usize,
    pub counterparty_id: String,        // 已解析的对方主体规范 ID
    pub wallet_id: String,              // 已解析的资金账户 ID
    pub currency_id: String,            // 已解析的币种 ID
    pub amount: f64,                    // 金额（缺失/非数值 → 0）
    pub exchange_rate: f64,             // 汇率（缺失/非数值 → 1）
    pub functional_amount: f64,         // 本位币金额（派生字段）
    pub paid_at: DateTime<Utc>,         // 付款时间（解析失败 → now,记警告）
    pub description: Option<String>,
}

// ==========================================
// ResolvedRecord - 解析结果 tagged union
// ==========================================
// 红线: 每个变体的外键均为规范 ID,派生字段已计算
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResolvedRecord {
    Contact(ResolvedContact),
    ClientPayment(ResolvedPayment),
    SubcontractPayment(ResolvedPayment),
}

impl ResolvedRecord {
    /// 源文件行号（用于稳定排序）
    pub fn row_number(&self) -> usize {
        match self {
            ResolvedRecord::Contact(c) => c.row_number,
            ResolvedRecord::ClientPayment(p) => p.row_number,
            ResolvedRecord::SubcontractPayment(p) => p.row_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_get_trims_and_drops_empty() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), "  Acme Corp  ".to_string());
        fields.insert("email".to_string(), "   ".to_string());
        let row = RawRow::new(1, fields);

        assert_eq!(row.get("name"), Some("Acme Corp"));
        assert_eq!(row.get("email"), None);
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_schema_required_fields() {
        let required: Vec<&str> = EntityKind::ClientPayments
            .import_schema()
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, vec!["client"]);

        let required: Vec<&str> = EntityKind::Contacts
            .import_schema()
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, vec!["name"]);
    }
}
