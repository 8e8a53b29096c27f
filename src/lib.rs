// ==========================================
// 细胞培养生产排程系统 - 核心库
// ==========================================
// 职责: 生产目标展开为逐日工单排程、目标/排程状态机、物料申领计算
// 技术栈: Rust + SQLite
// 外部 CRUD/HTTP 层、表单、导出、对话助手通过 API 层调用本库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/事务）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    MaterialRequestStatus, SchedulePriority, ScheduleStatus, TargetStatus, TicketStatus, TicketType,
};

// 领域实体
pub use domain::{MaterialLine, MaterialList, MaterialRequest, ProductionTarget, Ticket, TicketPayload, TicketSchedule};

// 引擎
pub use engine::{MaterialCalculator, PromotionRule, RequisitionStatus, ScheduleGenerator, ScheduleOrder};

// API
pub use api::{ApiError, ApiResponse, ApiResult, MaterialApi, ScheduleApi, TargetApi, TicketApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "细胞培养生产排程系统";
