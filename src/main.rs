// ==========================================
// 细胞培养生产排程系统 - 主入口
// ==========================================
// 初始化日志、解析数据库路径、建表、组装 AppState 并输出存储摘要
// 无界面；外部 CRUD/HTTP 层以库的方式嵌入 AppState
// ==========================================

use anyhow::{anyhow, Context, Result};
use cell_culture_aps::app::{get_default_db_path, AppState};
use cell_culture_aps::db::{count_rows, read_schema_version};
use cell_culture_aps::{logging, APP_NAME, VERSION};

fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", APP_NAME);
    tracing::info!("系统版本: {}", VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e)).context("无法初始化AppState")?;

    let conn = state
        .conn
        .lock()
        .map_err(|e| anyhow!("数据库锁获取失败: {}", e))?;

    let schema_version = read_schema_version(&conn)?;
    tracing::info!(schema_version = ?schema_version, "数据库表结构就绪");

    for table in ["ticket", "production_target", "ticket_schedule", "material_request"] {
        let rows = count_rows(&conn, table).with_context(|| format!("统计表{}失败", table))?;
        tracing::info!(table, rows, "存储摘要");
    }
    drop(conn);

    let config = state.config_api.get_engine_config()?;
    tracing::info!(
        default_priority = %config.default_priority,
        promote_on_create = config.promote_on_create,
        strict_transitions = config.strict_transitions,
        "引擎配置"
    );

    Ok(())
}
