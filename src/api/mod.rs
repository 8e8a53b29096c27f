// ==========================================
// 细胞培养生产排程系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供外部 CRUD/HTTP 层调用
// ==========================================

pub mod config_api;
pub mod error;
pub mod material_api;
pub mod response;
pub mod schedule_api;
pub mod target_api;
pub mod ticket_api;
pub mod validator;

// 重导出核心类型
pub use config_api::ConfigApi;
pub use error::{ApiError, ApiResult};
pub use material_api::{BatchRecalcError, BatchRecalcResult, MaterialApi, UpsertMaterialRequestResponse};
pub use response::ApiResponse;
pub use schedule_api::{CreateScheduleRequest, ScheduleApi, ScheduleMutationResponse, UpdateScheduleRequest};
pub use target_api::{CreateTargetRequest, CreateTargetResponse, TargetApi, UpdateTargetRequest};
pub use ticket_api::{CreateTicketRequest, TicketApi, UpdateTicketRequest};
