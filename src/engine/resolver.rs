// ==========================================
// 工程项目管理系统 - 行解析器
// ==========================================
// 职责: 单行原始数据 → 规范记录（外键分层解析 + 派生字段计算）
// 红线: 纯函数,行与行之间互不影响;
//       行失败只产出 RowError,绝不中断批次
// ==========================================
// 解析分层（外键字段统一口径）:
//   (i)   值本身就是规范 ID → 直通采纳（支持前端预解析流程）
//   (ii)  规范化名称精确匹配
//   (iii) 一对多集合: 恰一候选 → 采纳;多候选 → 歧义错误;零候选 → 未找到错误
// ==========================================

use crate::domain::batch::{CoercionWarning, RowError};
use crate::domain::record::{RawRow, ResolvedContact, ResolvedPayment, ResolvedRecord};
use crate::domain::types::EntityKind;
use crate::engine::lookup::{normalize_code, normalize_name, LookupIndex};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;

// ==========================================
// ResolverContext - 解析上下文
// ==========================================
// 用途: 每批次一次性读取的配置快照（避免逐行查配置）
#[derive(Debug, Clone)]
pub struct ResolverContext {
    pub default_currency_code: String, // 币种缺失时的兜底代码（大写）
    pub fx_sensitive_code: String,     // 汇率敏感币种代码（大写）
}

// ==========================================
// RefQuery - 外键引用查询
// ==========================================
// 用途: 把"ID 或名称"二义字段显式拆成和类型,再进入查找
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefQuery {
    /// 值已是规范 ID,直通采纳
    Id(String),
    /// 名称查询,走规范化映射
    Name(String),
}

impl RefQuery {
    /// 按预加载 ID 集合分类
    pub fn classify(raw: &str, known_ids: &HashSet<String>) -> RefQuery {
        let trimmed = raw.trim();
        if known_ids.contains(trimmed) {
            RefQuery::Id(trimmed.to_string())
        } else {
            RefQuery::Name(trimmed.to_string())
        }
    }
}

// ==========================================
// RowOutcome - 单行解析结果
// ==========================================
// 约定: record 与 error 恰有其一;warnings 两种情况下都可能存在
#[derive(Debug)]
pub struct RowOutcome {
    pub record: Option<ResolvedRecord>,
    pub error: Option<RowError>,
    pub warnings: Vec<CoercionWarning>,
}

impl RowOutcome {
    fn failed(row: usize, message: String, warnings: Vec<CoercionWarning>) -> Self {
        Self {
            record: None,
            error: Some(RowError { row, message }),
            warnings,
        }
    }

    fn resolved(record: ResolvedRecord, warnings: Vec<CoercionWarning>) -> Self {
        Self {
            record: Some(record),
            error: None,
            warnings,
        }
    }
}

/// 解析单行
///
/// # 参数
/// - kind: 实体种类（决定 schema 与外键口径）
/// - row: 原始行
/// - index: 本批次的查找索引（只读共享）
/// - ctx: 配置快照
pub fn resolve_row(
    kind: EntityKind,
    row: &RawRow,
    index: &LookupIndex,
    ctx: &ResolverContext,
) -> RowOutcome {
    // schema 必填校验（编译期穷举的字段定义）
    for spec in kind.import_schema() {
        if spec.required && row.get(spec.name).is_none() {
            return RowOutcome::failed(
                row.row_number,
                format!("必填字段缺失: {}", spec.name),
                vec![],
            );
        }
    }

    match kind {
        EntityKind::Contacts => resolve_contact(row),
        EntityKind::ClientPayments => resolve_payment(kind, "client", row, index, ctx),
        EntityKind::SubcontractPayments => resolve_payment(kind, "provider", row, index, ctx),
    }
}

// ==========================================
// 联系人解析
// ==========================================
fn resolve_contact(row: &RawRow) -> RowOutcome {
    let contact = ResolvedContact {
        row_number: row.row_number,
        // 必填校验已通过
        name: row.get("name").unwrap_or_default().to_string(),
        // 邮箱小写规范化（组织内去重自然键）
        email: row.get("email").map(|e| e.to_lowercase()),
        phone: row.get("phone").map(str::to_string),
        position: row.get("position").map(str::to_string),
        address: row.get("address").map(str::to_string),
        note: row.get("note").map(str::to_string),
    };

    RowOutcome::resolved(ResolvedRecord::Contact(contact), vec![])
}

// ==========================================
// 付款解析（客户回款 / 分包付款共用骨架）
// ==========================================
fn resolve_payment(
    kind: EntityKind,
    counterparty_field: &str,
    row: &RawRow,
    index: &LookupIndex,
    ctx: &ResolverContext,
) -> RowOutcome {
    let mut warnings = Vec::new();

    // === 步骤 1: 对方主体外键解析（分层）===
    let raw_ref = row.get(counterparty_field).unwrap_or_default();
    let counterparty_id = match kind {
        EntityKind::ClientPayments => match resolve_client_ref(raw_ref, index) {
            Ok(id) => id,
            Err(msg) => return RowOutcome::failed(row.row_number, msg, warnings),
        },
        EntityKind::SubcontractPayments => match resolve_subcontract_ref(raw_ref, index) {
            Ok(id) => id,
            Err(msg) => return RowOutcome::failed(row.row_number, msg, warnings),
        },
        EntityKind::Contacts => unreachable!("联系人不走付款解析"),
    };

    // === 步骤 2: 币种解析（缺失 → 配置兜底代码）===
    let currency_id = match resolve_currency_ref(row.get("currency_code"), index, ctx) {
        Ok(id) => id,
        Err(msg) => return RowOutcome::failed(row.row_number, msg, warnings),
    };

    // === 步骤 3: 资金账户解析（可选,未解析 → 组织首个账户）===
    let wallet_id = match resolve_wallet_ref(row.get("wallet"), index) {
        Ok(id) => id,
        Err(msg) => return RowOutcome::failed(row.row_number, msg, warnings),
    };

    // === 步骤 4: 数值纠偏（绝不抛错）===
    let amount = coerce_number(row, "amount", 0.0, &mut warnings);
    let exchange_rate = coerce_number(row, "exchange_rate", 1.0, &mut warnings);

    // === 步骤 5: 日期纠偏（解析失败 → 当前时间,记警告）===
    let paid_at = coerce_date(row, "paid_at", &mut warnings);

    // === 步骤 6: 派生字段 - 本位币金额 ===
    // 仅汇率敏感币种（本域为 USD）做换算,其余币种本位币金额即原金额
    let currency_code = index
        .currency_code_by_id
        .get(&currency_id)
        .map(String::as_str)
        .unwrap_or_default();
    let functional_amount = functional_amount(amount, exchange_rate, currency_code, ctx);

    let payment = ResolvedPayment {
        row_number: row.row_number,
        counterparty_id,
        wallet_id,
        currency_id,
        amount,
        exchange_rate,
        functional_amount,
        paid_at,
        description: row.get("description").map(str::to_string),
    };

    let record = match kind {
        EntityKind::ClientPayments => ResolvedRecord::ClientPayment(payment),
        EntityKind::SubcontractPayments => ResolvedRecord::SubcontractPayment(payment),
        EntityKind::Contacts => unreachable!(),
    };

    RowOutcome::resolved(record, warnings)
}

// ==========================================
// 外键分层解析
// ==========================================

/// 客户引用解析（单名匹配集合）
fn resolve_client_ref(raw: &str, index: &LookupIndex) -> Result<String, String> {
    match RefQuery::classify(raw, &index.client_ids) {
        RefQuery::Id(id) => Ok(id),
        RefQuery::Name(name) => index
            .clients_by_name
            .get(&normalize_name(&name))
            .cloned()
            .ok_or_else(|| format!("客户未找到: {}", name)),
    }
}

/// 分包合同引用解析（一对多集合: ID 直通 → 合同名称精确 → 供应商候选）
fn resolve_subcontract_ref(raw: &str, index: &LookupIndex) -> Result<String, String> {
    match RefQuery::classify(raw, &index.subcontract_ids) {
        RefQuery::Id(id) => Ok(id),
        RefQuery::Name(name) => {
            let key = normalize_name(&name);

            if let Some(id) = index.subcontracts_by_title.get(&key) {
                return Ok(id.clone());
            }

            match index.subcontracts_by_provider.get(&key) {
                Some(candidates) if candidates.len() == 1 => Ok(candidates[0].clone()),
                Some(candidates) if candidates.len() > 1 => Err(format!(
                    "供应商名称歧义: {} 对应 {} 份在行合同,请使用合同ID或合同名称",
                    name,
                    candidates.len()
                )),
                _ => Err(format!("供应商或分包合同未找到: {}", name)),
            }
        }
    }
}

/// 币种引用解析（缺失 → 配置兜底代码）
fn resolve_currency_ref(
    raw: Option<&str>,
    index: &LookupIndex,
    ctx: &ResolverContext,
) -> Result<String, String> {
    let value = raw.unwrap_or(&ctx.default_currency_code);

    match RefQuery::classify(value, &index.currency_ids) {
        RefQuery::Id(id) => Ok(id),
        RefQuery::Name(code) => index
            .currencies_by_code
            .get(&normalize_code(&code))
            .cloned()
            .ok_or_else(|| format!("币种未找到: {}", code)),
    }
}

/// 资金账户引用解析（可选字段: 未解析/缺失 → 组织首个账户）
fn resolve_wallet_ref(raw: Option<&str>, index: &LookupIndex) -> Result<String, String> {
    if let Some(value) = raw {
        match RefQuery::classify(value, &index.wallet_ids) {
            RefQuery::Id(id) => return Ok(id),
            RefQuery::Name(name) => {
                if let Some(id) = index.wallets_by_name.get(&normalize_name(&name)) {
                    return Ok(id.clone());
                }
                // 未命中不报错,落入组织兜底账户
            }
        }
    }

    index
        .default_wallet_id
        .clone()
        .ok_or_else(|| "组织无可用资金账户,无法确定入账账户".to_string())
}

// ==========================================
// 宽容纠偏
// ==========================================

/// 数值字段纠偏: 缺失静默取默认;存在但非数值取默认并记警告
fn coerce_number(
    row: &RawRow,
    field: &str,
    default: f64,
    warnings: &mut Vec<CoercionWarning>,
) -> f64 {
    match row.get(field) {
        None => default,
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                warnings.push(CoercionWarning {
                    row: row.row_number,
                    field: field.to_string(),
                    message: format!("非数值 '{}' 已替换为默认值 {}", raw, default),
                });
                default
            }
        },
    }
}

/// 日期字段纠偏: 解析失败替换为当前时间并记警告
///
/// 注: "坏日期 → now" 是沿用的宽容导入策略,是否收紧待产品确认
fn coerce_date(row: &RawRow, field: &str, warnings: &mut Vec<CoercionWarning>) -> DateTime<Utc> {
    let raw = match row.get(field) {
        Some(v) => v,
        None => return Utc::now(),
    };

    if let Some(dt) = parse_datetime(raw) {
        return dt;
    }

    warnings.push(CoercionWarning {
        row: row.row_number,
        field: field.to_string(),
        message: format!("日期 '{}' 无法解析,已替换为当前时间", raw),
    });
    Utc::now()
}

/// 多格式日期解析: RFC3339 / ISO 日期 / 斜杠日期 / 紧凑日期
fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()?;

    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

/// 本位币金额: 仅汇率敏感币种做 amount × exchange_rate 换算
fn functional_amount(amount: f64, exchange_rate: f64, currency_code: &str, ctx: &ResolverContext) -> f64 {
    if currency_code == ctx.fx_sensitive_code {
        amount * exchange_rate
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_ctx() -> ResolverContext {
        ResolverContext {
            default_currency_code: "USD".to_string(),
            fx_sensitive_code: "USD".to_string(),
        }
    }

    fn test_index() -> LookupIndex {
        let mut index = LookupIndex::default();

        index
            .clients_by_name
            .insert("acme corp".to_string(), "cl-1".to_string());
        index.client_ids.insert("cl-1".to_string());

        index
            .currencies_by_code
            .insert("USD".to_string(), "cur-usd".to_string());
        index
            .currencies_by_code
            .insert("EUR".to_string(), "cur-eur".to_string());
        index
            .currency_code_by_id
            .insert("cur-usd".to_string(), "USD".to_string());
        index
            .currency_code_by_id
            .insert("cur-eur".to_string(), "EUR".to_string());
        index.currency_ids.insert("cur-usd".to_string());
        index.currency_ids.insert("cur-eur".to_string());

        // 同一供应商两份合同（歧义场景）
        index
            .subcontracts_by_provider
            .insert("j. perez".to_string(), vec!["sc-1".to_string(), "sc-2".to_string()]);
        index
            .subcontracts_by_provider
            .insert("obras sur".to_string(), vec!["sc-3".to_string()]);
        index
            .subcontracts_by_title
            .insert("instalaciones fase 2".to_string(), "sc-2".to_string());
        index.subcontract_ids.insert("sc-1".to_string());
        index.subcontract_ids.insert("sc-2".to_string());
        index.subcontract_ids.insert("sc-3".to_string());

        index
            .wallets_by_name
            .insert("主账户".to_string(), "w-1".to_string());
        index.wallet_ids.insert("w-1".to_string());
        index.default_wallet_id = Some("w-1".to_string());

        index
    }

    fn row(n: usize, pairs: &[(&str, &str)]) -> RawRow {
        let fields: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRow::new(n, fields)
    }

    #[test]
    fn test_client_payment_scenario() {
        // 既有客户 "Acme Corp" + 币种 USD,汇率 2 → 本位币金额 200
        let r = row(
            1,
            &[
                ("client", "Acme Corp"),
                ("amount", "100"),
                ("currency_code", "usd"),
                ("exchange_rate", "2"),
            ],
        );
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());

        let record = out.record.expect("应解析成功");
        match record {
            ResolvedRecord::ClientPayment(p) => {
                assert_eq!(p.counterparty_id, "cl-1");
                assert_eq!(p.currency_id, "cur-usd");
                assert!((p.amount - 100.0).abs() < f64::EPSILON);
                assert!((p.functional_amount - 200.0).abs() < f64::EPSILON);
            }
            other => panic!("变体不符: {:?}", other),
        }
    }

    #[test]
    fn test_id_passthrough_beats_name_lookup() {
        // 字段值即规范 ID 时直通,不走名称表
        let r = row(1, &[("client", "cl-1"), ("currency_code", "EUR")]);
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());

        match out.record.expect("应解析成功") {
            ResolvedRecord::ClientPayment(p) => assert_eq!(p.counterparty_id, "cl-1"),
            other => panic!("变体不符: {:?}", other),
        }
    }

    #[test]
    fn test_client_not_found() {
        let r = row(3, &[("client", "Nadie SA")]);
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());

        let err = out.error.expect("应产出行错误");
        assert_eq!(err.row, 3);
        assert!(err.message.contains("客户未找到"));
    }

    #[test]
    fn test_ambiguous_provider() {
        let r = row(2, &[("provider", "J. Perez"), ("amount", "50")]);
        let out = resolve_row(EntityKind::SubcontractPayments, &r, &test_index(), &test_ctx());

        let err = out.error.expect("多候选应产出歧义错误");
        assert_eq!(err.row, 2);
        assert!(err.message.contains("歧义"));
    }

    #[test]
    fn test_provider_single_candidate_and_title_match() {
        // 恰一候选 → 采纳
        let r = row(1, &[("provider", "Obras Sur")]);
        let out = resolve_row(EntityKind::SubcontractPayments, &r, &test_index(), &test_ctx());
        match out.record.expect("应解析成功") {
            ResolvedRecord::SubcontractPayment(p) => assert_eq!(p.counterparty_id, "sc-3"),
            other => panic!("变体不符: {:?}", other),
        }

        // 合同名称精确匹配优先于供应商歧义
        let r = row(2, &[("provider", "Instalaciones Fase 2")]);
        let out = resolve_row(EntityKind::SubcontractPayments, &r, &test_index(), &test_ctx());
        match out.record.expect("应解析成功") {
            ResolvedRecord::SubcontractPayment(p) => assert_eq!(p.counterparty_id, "sc-2"),
            other => panic!("变体不符: {:?}", other),
        }
    }

    #[test]
    fn test_functional_amount_only_for_fx_sensitive_code() {
        // EUR 不做换算
        let r = row(
            1,
            &[
                ("client", "Acme Corp"),
                ("amount", "100"),
                ("currency_code", "EUR"),
                ("exchange_rate", "2"),
            ],
        );
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());
        match out.record.expect("应解析成功") {
            ResolvedRecord::ClientPayment(p) => {
                assert!((p.functional_amount - 100.0).abs() < f64::EPSILON)
            }
            other => panic!("变体不符: {:?}", other),
        }
    }

    #[test]
    fn test_numeric_coercion_defaults() {
        // 金额非数值 → 0 + 警告;汇率缺失 → 1 静默
        let r = row(
            5,
            &[("client", "Acme Corp"), ("amount", "abc")],
        );
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());

        match out.record.expect("纠偏不阻断该行") {
            ResolvedRecord::ClientPayment(p) => {
                assert!((p.amount - 0.0).abs() < f64::EPSILON);
                assert!((p.exchange_rate - 1.0).abs() < f64::EPSILON);
            }
            other => panic!("变体不符: {:?}", other),
        }
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].field, "amount");
    }

    #[test]
    fn test_date_coercion_warns_and_substitutes_now() {
        let r = row(
            4,
            &[("client", "Acme Corp"), ("paid_at", "not-a-date")],
        );
        let before = Utc::now();
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());

        match out.record.expect("纠偏不阻断该行") {
            ResolvedRecord::ClientPayment(p) => assert!(p.paid_at >= before),
            other => panic!("变体不符: {:?}", other),
        }
        assert!(out
            .warnings
            .iter()
            .any(|w| w.field == "paid_at" && w.message.contains("无法解析")));
    }

    #[test]
    fn test_date_formats_accepted() {
        for raw in ["2026-03-01", "2026/03/01", "20260301", "2026-03-01T08:30:00Z"] {
            let r = row(1, &[("client", "Acme Corp"), ("paid_at", raw)]);
            let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());
            assert!(out.warnings.is_empty(), "{} 不应产生警告", raw);
        }
    }

    #[test]
    fn test_no_wallet_available_fails_row() {
        let mut index = test_index();
        index.default_wallet_id = None;
        index.wallet_ids.clear();
        index.wallets_by_name.clear();

        let r = row(1, &[("client", "Acme Corp"), ("amount", "10")]);
        let out = resolve_row(EntityKind::ClientPayments, &r, &index, &test_ctx());

        let err = out.error.expect("无账户应产出行错误");
        assert!(err.message.contains("资金账户"));
    }

    #[test]
    fn test_missing_required_field() {
        let r = row(7, &[("amount", "10")]);
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());

        let err = out.error.expect("必填缺失应产出行错误");
        assert!(err.message.contains("client"));
    }

    #[test]
    fn test_contact_email_lowercased() {
        let r = row(1, &[("name", "Ana"), ("email", "Ana@Example.COM")]);
        let out = resolve_row(EntityKind::Contacts, &r, &test_index(), &test_ctx());

        match out.record.expect("应解析成功") {
            ResolvedRecord::Contact(c) => {
                assert_eq!(c.email.as_deref(), Some("ana@example.com"))
            }
            other => panic!("变体不符: {:?}", other),
        }
    }

    #[test]
    fn test_currency_default_when_omitted() {
        let r = row(1, &[("client", "Acme Corp"), ("amount", "10")]);
        let out = resolve_row(EntityKind::ClientPayments, &r, &test_index(), &test_ctx());

        match out.record.expect("应解析成功") {
            ResolvedRecord::ClientPayment(p) => assert_eq!(p.currency_id, "cur-usd"),
            other => panic!("变体不符: {:?}", other),
        }
    }
}
