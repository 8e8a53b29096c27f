// ==========================================
// 细胞培养生产排程系统 - 日志初始化
// ==========================================
// 工具: tracing + tracing-subscriber
// RUST_LOG 优先；未设置时使用本 crate 的默认过滤器
// LAB_APS_LOG_FORMAT=json 切换为 JSON 行输出
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤器: 本 crate info，SQLite 驱动只报警告
pub const DEFAULT_LOG_FILTER: &str = "cell_culture_aps=info,rusqlite=warn";

/// 输出格式环境变量
pub const LOG_FORMAT_ENV: &str = "LAB_APS_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读文本（默认）
    Text,
    /// 每行一个 JSON 对象
    Json,
}

impl LogFormat {
    /// 从环境变量读取；无法识别的值回落为文本
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(v) => Self::parse(&v),
            Err(_) => LogFormat::Text,
        }
    }

    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// 初始化日志系统
///
/// # 示例
/// ```no_run
/// use cell_culture_aps::logging;
/// logging::init();
/// ```
pub fn init() {
    match LogFormat::from_env() {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .with_line_number(true)
            .init(),
        LogFormat::Json => fmt().json().with_env_filter(env_filter()).with_target(true).init(),
    }
}

/// 测试日志: 写入测试捕获输出，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("cell_culture_aps=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
        tracing::debug!("日志测试");
    }
}
