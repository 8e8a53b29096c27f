// ==========================================
// 细胞培养生产排程系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{ConfigApi, MaterialApi, ScheduleApi, TargetApi, TicketApi};
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::repository::{MaterialRequestRepository, ScheduleRepository, TargetRepository, TicketRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "LAB_APS_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享连接，供外部 CRUD/HTTP 层持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享连接（事务边界由各 API 通过 db::with_transaction 控制）
    pub conn: Arc<Mutex<Connection>>,

    pub ticket_api: Arc<TicketApi>,
    pub target_api: Arc<TargetApi>,
    pub schedule_api: Arc<ScheduleApi>,
    pub material_api: Arc<MaterialApi>,
    pub config_api: Arc<ConfigApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开连接并应用统一 PRAGMA
    /// 2. 幂等建表
    /// 3. 初始化所有Repository与API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("无法初始化数据库表结构: {}", e))?;

        Ok(Self::from_connection(db_path, conn))
    }

    /// 基于已配置、已建表的连接组装应用状态
    pub fn from_connection(db_path: String, conn: Connection) -> Self {
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let ticket_repo = Arc::new(TicketRepository::new(conn.clone()));
        let target_repo = Arc::new(TargetRepository::new(conn.clone()));
        let schedule_repo = Arc::new(ScheduleRepository::new(conn.clone()));
        let material_request_repo = Arc::new(MaterialRequestRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let ticket_api = Arc::new(TicketApi::new(ticket_repo.clone()));
        let target_api = Arc::new(TargetApi::new(
            conn.clone(),
            target_repo,
            schedule_repo.clone(),
            config_manager.clone(),
        ));
        let schedule_api = Arc::new(ScheduleApi::new(
            conn.clone(),
            schedule_repo,
            config_manager.clone(),
        ));
        let material_api = Arc::new(MaterialApi::new(
            conn.clone(),
            ticket_repo,
            material_request_repo,
        ));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Self {
            db_path,
            conn,
            ticket_api,
            target_api,
            schedule_api,
            material_api,
            config_api,
            config_manager,
        }
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 LAB_APS_DB_PATH > 用户数据目录 > ./lab_aps.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./lab_aps.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("cell-culture-aps");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("lab_aps.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"), "路径应以 .db 结尾: {}", path);
    }

    #[test]
    fn test_in_memory_state_has_schema() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let state = AppState::from_connection(":memory:".to_string(), conn);

        assert_eq!(state.get_db_path(), ":memory:");
        assert!(state.target_api.list_targets(None).unwrap().is_empty());
    }
}
