// ==========================================
// 细胞培养生产排程系统 - 应用层
// ==========================================
// 职责: 组装共享连接、仓储与 API，供外部 CRUD/HTTP 层持有
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
