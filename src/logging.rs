// ==========================================
// 工程项目管理系统 - 日志初始化
// ==========================================
// 职责: 统一 tracing 订阅器配置（应用入口与测试入口）
// 红线: 订阅器全局只装一次;测试入口必须容忍重复调用,
//       多个集成测试共享进程时不得 panic
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 应用入口的日志初始化
///
/// 导入流水线的各阶段（索引构建/行解析/去重/落库/回滚）都打
/// 结构化字段日志,按需用 RUST_LOG 调整粒度,例如:
/// `RUST_LOG=pmis_import_engine::engine=debug`
///
/// # 示例
/// ```no_run
/// pmis_import_engine::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 测试入口的日志初始化
///
/// 默认放开到 debug（行解析与索引构建的 debug 日志是排查
/// 测试失败的主要线索）,输出走测试捕获通道,不污染 cargo 输出
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("pmis_import_engine=debug"))
        .with_test_writer()
        .try_init();
}
