// ==========================================
// 工程项目管理系统 - 参照查找索引
// ==========================================
// 职责: 每次导入调用时一次性构建 规范化名称 → 规范 ID 的查找映射
// 红线: 按组织/项目隔离,每次调用重建,绝不跨调用缓存
//       (长驻服务下跨组织共享可变全局索引会产生脏引用)
// ==========================================

use crate::domain::types::EntityKind;
use crate::repository::reference_repo::ReferenceRepository;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use tracing::debug;

/// 名称规范化: 去首尾空白 + 小写
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 币种代码规范化: 去首尾空白 + 大写
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// ==========================================
// LookupIndex - 查找索引
// ==========================================
// 用途: 行解析阶段的只读共享数据（构建完成后可安全并发读取）
#[derive(Debug, Default)]
pub struct LookupIndex {
    // ===== 客户（单名匹配集合）=====
    pub clients_by_name: HashMap<String, String>, // 规范化名称 → client_id
    pub client_ids: HashSet<String>,              // ID 直通判定集合

    // ===== 币种 =====
    pub currencies_by_code: HashMap<String, String>, // 大写代码 → currency_id
    pub currency_ids: HashSet<String>,
    pub currency_code_by_id: HashMap<String, String>, // currency_id → 大写代码（本位币判定用）

    // ===== 分包合同（一对多集合）=====
    pub subcontracts_by_title: HashMap<String, String>, // 规范化合同名称 → subcontract_id
    pub subcontracts_by_provider: HashMap<String, Vec<String>>, // 规范化供应商名称 → 候选 ID 列表
    pub subcontract_ids: HashSet<String>,

    // ===== 资金账户 =====
    pub wallets_by_name: HashMap<String, String>, // 规范化名称 → wallet_id
    pub wallet_ids: HashSet<String>,
    pub default_wallet_id: Option<String>, // 组织首个账户（无账户时为 None,钱包兜底不可用）
}

impl LookupIndex {
    /// 按实体种类构建查找索引
    ///
    /// # 参数
    /// - repo: 参照数据仓储
    /// - kind: 导入实体种类（决定加载哪些集合）
    /// - organization_id: 组织 ID
    /// - project_id: 项目 ID（仅分包付款使用）
    ///
    /// # 说明
    /// - 每个集合一次往返;联系人导入不依赖任何参照集合
    pub async fn build<R>(
        repo: &R,
        kind: EntityKind,
        organization_id: &str,
        project_id: Option<&str>,
    ) -> Result<LookupIndex, Box<dyn Error>>
    where
        R: ReferenceRepository + ?Sized,
    {
        let mut index = LookupIndex::default();

        match kind {
            EntityKind::Contacts => {
                // 联系人只做字段解析,去重守卫单独查询
            }
            EntityKind::ClientPayments => {
                for client in repo.load_clients(organization_id).await? {
                    index
                        .clients_by_name
                        .insert(normalize_name(&client.name), client.client_id.clone());
                    index.client_ids.insert(client.client_id);
                }
                index.load_money_side(repo, organization_id).await?;
            }
            EntityKind::SubcontractPayments => {
                for sc in repo
                    .load_subcontracts(organization_id, project_id)
                    .await?
                {
                    index
                        .subcontracts_by_title
                        .insert(normalize_name(&sc.title), sc.subcontract_id.clone());
                    index
                        .subcontracts_by_provider
                        .entry(normalize_name(&sc.provider_name))
                        .or_default()
                        .push(sc.subcontract_id.clone());
                    index.subcontract_ids.insert(sc.subcontract_id);
                }
                index.load_money_side(repo, organization_id).await?;
            }
        }

        debug!(
            kind = %kind,
            clients = index.clients_by_name.len(),
            currencies = index.currencies_by_code.len(),
            subcontracts = index.subcontract_ids.len(),
            wallets = index.wallet_ids.len(),
            "查找索引构建完成"
        );

        Ok(index)
    }

    /// 加载付款类导入共用的币种与资金账户映射
    async fn load_money_side<R>(
        &mut self,
        repo: &R,
        organization_id: &str,
    ) -> Result<(), Box<dyn Error>>
    where
        R: ReferenceRepository + ?Sized,
    {
        for currency in repo.load_currencies(organization_id).await? {
            let code = normalize_code(&currency.code);
            self.currencies_by_code
                .insert(code.clone(), currency.currency_id.clone());
            self.currency_code_by_id
                .insert(currency.currency_id.clone(), code);
            self.currency_ids.insert(currency.currency_id);
        }

        let wallets = repo.load_wallets(organization_id).await?;
        self.default_wallet_id = wallets.first().map(|w| w.wallet_id.clone());
        for wallet in wallets {
            self.wallets_by_name
                .insert(normalize_name(&wallet.name), wallet.wallet_id.clone());
            self.wallet_ids.insert(wallet.wallet_id);
        }

        Ok(())
    }
}
