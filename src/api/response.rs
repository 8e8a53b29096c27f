// ==========================================
// 细胞培养生产排程系统 - 统一响应包装
// ==========================================
// 外部 CRUD/HTTP 层统一返回 {success, message, data}
// ==========================================

use crate::api::error::ApiResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error_code: None,
        }
    }

    pub fn fail(message: impl Into<String>, error_code: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_code: Some(error_code.to_string()),
        }
    }

    /// 由 API 结果构造响应；失败时 message 为错误描述
    pub fn from_result(result: ApiResult<T>, success_message: &str) -> Self {
        match result {
            Ok(data) => Self::ok(data, success_message),
            Err(e) => {
                tracing::debug!(code = e.code(), "请求失败: {}", e);
                Self::fail(e.to_string(), e.code())
            }
        }
    }
}
