// ==========================================
// 细胞培养生产排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod material;
pub mod schedule;
pub mod target;
pub mod ticket;
pub mod types;

// 重导出核心类型
pub use material::{MaterialLine, MaterialList, MaterialRequest, MATERIAL_LIST_SCHEMA_VERSION};
pub use schedule::TicketSchedule;
pub use target::{ProductionTarget, TargetProgress};
pub use ticket::{
    AoiPayload, ChangeMediumPayload, CollectAndDiscardPayload, FreezePayload, SubAndFreezePayload,
    SubPayload, ThawPayload, Ticket, TicketPayload,
};
pub use types::{
    MaterialRequestStatus, ParseEnumError, SchedulePriority, ScheduleStatus, TargetStatus,
    TicketStatus, TicketType,
};
