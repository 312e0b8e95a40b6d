// ==========================================
// 工程项目管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取默认币种代码（行内币种缺失时的兜底值）
    ///
    /// # 默认值
    /// - "USD"
    async fn get_default_currency_code(&self) -> Result<String, Box<dyn Error>>;

    /// 获取汇率敏感币种代码（仅该币种计算本位币换算）
    ///
    /// # 说明
    /// - functional_amount = amount × exchange_rate 仅对该币种生效,
    ///   其余币种 functional_amount = amount
    ///
    /// # 默认值
    /// - "USD"
    async fn get_fx_sensitive_code(&self) -> Result<String, Box<dyn Error>>;

    /// 获取行解析并发工作线程数
    ///
    /// # 默认值
    /// - 4
    async fn get_resolver_worker_count(&self) -> Result<usize, Box<dyn Error>>;
}
