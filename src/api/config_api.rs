// ==========================================
// 细胞培养生产排程系统 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新
// 约束: 仅接受已知配置键，写入前校验取值
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::parse_enum;
use crate::config::{config_keys, ConfigManager, EngineConfig};
use crate::domain::types::SchedulePriority;

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 当前生效的引擎配置（未设置的键取默认值）
    pub fn get_engine_config(&self) -> ApiResult<EngineConfig> {
        Ok(self.config_manager.load_engine_config()?)
    }

    /// 已写入的全部 global 配置
    pub fn list_configs(&self) -> ApiResult<BTreeMap<String, String>> {
        let snapshot = self.config_manager.get_config_snapshot()?;
        serde_json::from_str(&snapshot).map_err(|e| ApiError::InternalError(e.to_string()))
    }

    /// 更新单个配置
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let normalized = match key {
            config_keys::DEFAULT_PRIORITY => parse_enum::<SchedulePriority>(key, value)?.to_db_str().to_string(),
            config_keys::PROMOTE_ON_CREATE | config_keys::STRICT_TRANSITIONS => parse_bool(key, value)?.to_string(),
            _ => return Err(ApiError::InvalidInput(format!("未知配置键: {}", key))),
        };

        self.config_manager.set_global_config_value(key, &normalized)?;
        info!(key, value = %normalized, "配置已更新");
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> ApiResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::ValidationError(format!("{}需要布尔值: {}", key, raw))),
    }
}
