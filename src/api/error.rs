// ==========================================
// 细胞培养生产排程系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可区分的错误类别
// 类别: 校验错误 / 未找到 / 冲突 / 状态迁移 / 数据访问 / 内部
// ==========================================

use crate::engine::requisition::MaterialIndexOutOfRange;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 校验错误（在任何写入之前拒绝）
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("物料下标越界: index={index}, 共{len}项")]
    MaterialIndexOutOfRange { index: usize, len: usize },

    // ==========================================
    // 未找到
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 冲突
    // ==========================================
    #[error("冲突: {0}")]
    Conflict(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 供外部 HTTP 层映射状态码的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_)
            | ApiError::ValidationError(_)
            | ApiError::MaterialIndexOutOfRange { .. } => "VALIDATION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InvalidStateTransition { .. } => "INVALID_TRANSITION",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "DATABASE",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL",
        }
    }

    pub fn is_validation(&self) -> bool {
        self.code() == "VALIDATION"
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::NotFound(format!("引用的记录不存在: {}", msg))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::CorruptColumn { column, message } => {
                ApiError::InternalError(format!("存储数据损坏(列{}): {}", column, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<MaterialIndexOutOfRange> for ApiError {
    fn from(err: MaterialIndexOutOfRange) -> Self {
        ApiError::MaterialIndexOutOfRange {
            index: err.index,
            len: err.len,
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
