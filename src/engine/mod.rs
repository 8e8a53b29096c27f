// ==========================================
// 细胞培养生产排程系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 判定逻辑为纯函数；需要写库的步骤通过 repository 完成
// ==========================================

pub mod material_calculator;
pub mod requisition;
pub mod schedule_generator;
pub mod schedule_order;
pub mod state_machine;

// 重导出核心引擎
pub use material_calculator::{CalculationContext, MaterialCalculator};
pub use requisition::{MaterialIndexOutOfRange, RequisitionStatus};
pub use schedule_generator::{GenerationResult, PlannedDay, ScheduleGenerator, ROTATION_PATTERN};
pub use schedule_order::ScheduleOrder;
pub use state_machine::{PromotionDecision, PromotionRule, TransitionGuard};
