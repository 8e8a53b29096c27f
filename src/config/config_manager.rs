// ==========================================
// 细胞培养生产排程系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)，当前仅使用 global scope
// ==========================================

use crate::domain::types::SchedulePriority;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 配置键
pub mod config_keys {
    /// 新建排程未指定优先级时使用的默认值
    pub const DEFAULT_PRIORITY: &str = "schedule.default_priority";
    /// 对 PLANNING 目标新建排程时是否立即晋级
    pub const PROMOTE_ON_CREATE: &str = "schedule.promote_on_create";
    /// 是否拒绝迁移图之外的状态编辑
    pub const STRICT_TRANSITIONS: &str = "schedule.strict_transitions";
}

const GLOBAL_SCOPE: &str = "global";

/// 引擎运行时配置快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub default_priority: SchedulePriority,
    pub promote_on_create: bool,
    pub strict_transitions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_priority: SchedulePriority::Medium,
            promote_on_create: true,
            strict_transitions: false,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    fn get_bool_or(&self, key: &str, default: bool) -> RepositoryResult<bool> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(RepositoryError::FieldValueError {
                    field: key.to_string(),
                    message: format!("无法解析为布尔值: {}", raw),
                }),
            },
        }
    }

    // ===== 排程配置 =====

    pub fn get_default_priority(&self) -> RepositoryResult<SchedulePriority> {
        match self.get_global_config_value(config_keys::DEFAULT_PRIORITY)? {
            None => Ok(EngineConfig::default().default_priority),
            Some(raw) => raw.parse::<SchedulePriority>().map_err(|e| RepositoryError::FieldValueError {
                field: config_keys::DEFAULT_PRIORITY.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn is_promote_on_create_enabled(&self) -> RepositoryResult<bool> {
        self.get_bool_or(config_keys::PROMOTE_ON_CREATE, EngineConfig::default().promote_on_create)
    }

    pub fn is_strict_transitions_enabled(&self) -> RepositoryResult<bool> {
        self.get_bool_or(config_keys::STRICT_TRANSITIONS, EngineConfig::default().strict_transitions)
    }

    /// 一次性读取引擎配置
    pub fn load_engine_config(&self) -> RepositoryResult<EngineConfig> {
        Ok(EngineConfig {
            default_priority: self.get_default_priority()?,
            promote_on_create: self.is_promote_on_create_enabled()?,
            strict_transitions: self.is_strict_transitions_enabled()?,
        })
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}
