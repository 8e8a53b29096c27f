// ==========================================
// 细胞培养生产排程系统 - 工单排程领域模型
// ==========================================

use crate::domain::types::{SchedulePriority, ScheduleStatus};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// TicketSchedule - 工单排程
// ==========================================
// 一张工单与一个生产目标在某日（可选时刻）的绑定
// 唯一约束: (ticket_id, target_id, scheduled_date)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSchedule {
    pub schedule_id: String,
    pub ticket_id: String,
    pub target_id: String,
    pub scheduled_date: NaiveDate,         // 本地日历日期，不做时区换算
    pub scheduled_time: Option<NaiveTime>, // HH:mm，可缺省
    pub priority: SchedulePriority,
    pub status: ScheduleStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TicketSchedule {
    pub fn is_in_progress(&self) -> bool {
        self.status == ScheduleStatus::InProgress
    }
}
