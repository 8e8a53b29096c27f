// ==========================================
// 细胞培养生产排程系统 - 排程生成引擎
// ==========================================
// 职责: 将新生产目标展开为逐日工单 + 排程
// 规则:
// - 从今天（本地日历日）到预计完成日期，每天一张工单
// - 第 0 天固定为复苏 (Thaw)
// - 第 i 天 (i>=1) 按 [AOI, AOI, ChangeMedium, AOI, AOI, ChangeMedium][(i-1) mod 6] 轮转
// - 完成日期早于今天: 不生成任何排程，返回 0（合法的空操作，不是错误）
// 红线: 轮转固定、可复现；单个目标的全部写入处于同一事务
// ==========================================

use crate::domain::schedule::TicketSchedule;
use crate::domain::target::ProductionTarget;
use crate::domain::ticket::{Ticket, TicketPayload};
use crate::domain::types::{SchedulePriority, ScheduleStatus, TicketStatus, TicketType};
use crate::repository::error::RepositoryResult;
use crate::repository::{ScheduleRepository, TicketRepository};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// 首日之后的轮转模式
pub const ROTATION_PATTERN: [TicketType; 6] = [
    TicketType::Aoi,
    TicketType::Aoi,
    TicketType::ChangeMedium,
    TicketType::Aoi,
    TicketType::Aoi,
    TicketType::ChangeMedium,
];

/// 生成的排程统一使用中优先级
pub const GENERATED_PRIORITY: SchedulePriority = SchedulePriority::Medium;

/// 单日计划
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedDay {
    pub day_index: usize,
    pub date: NaiveDate,
    pub ticket_type: TicketType,
}

/// 生成结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub tickets_created: usize,
    pub schedules_created: usize,
}

// ==========================================
// ScheduleGenerator
// ==========================================
pub struct ScheduleGenerator;

impl ScheduleGenerator {
    /// 第 i 天的工单类型
    pub fn ticket_type_for_day(day_index: usize) -> TicketType {
        if day_index == 0 {
            TicketType::Thaw
        } else {
            ROTATION_PATTERN[(day_index - 1) % ROTATION_PATTERN.len()]
        }
    }

    /// 计算逐日计划（纯函数）
    ///
    /// # 参数
    /// - today: 本地日历今天（已去除时刻）
    /// - completion_date: 预计完成日期（含当天）
    ///
    /// # 返回
    /// - completion_date < today 时为空
    pub fn plan(today: NaiveDate, completion_date: NaiveDate) -> Vec<PlannedDay> {
        if completion_date < today {
            return Vec::new();
        }

        today
            .iter_days()
            .take_while(|d| *d <= completion_date)
            .enumerate()
            .map(|(day_index, date)| PlannedDay {
                day_index,
                date,
                ticket_type: Self::ticket_type_for_day(day_index),
            })
            .collect()
    }

    /// 将计划物化为工单 + 排程
    ///
    /// created_at 按天序递增 1 微秒，保证同批次内创建顺序可区分
    pub fn materialize(
        target_id: &str,
        plan: &[PlannedDay],
        now: NaiveDateTime,
    ) -> Vec<(Ticket, TicketSchedule)> {
        plan.iter()
            .map(|day| {
                let created_at = now + Duration::microseconds(day.day_index as i64);
                let ticket = Ticket {
                    ticket_id: Uuid::new_v4().to_string(),
                    payload: TicketPayload::empty(day.ticket_type),
                    status: TicketStatus::Open,
                    notes: None,
                    created_at,
                    updated_at: created_at,
                };
                let schedule = TicketSchedule {
                    schedule_id: Uuid::new_v4().to_string(),
                    ticket_id: ticket.ticket_id.clone(),
                    target_id: target_id.to_string(),
                    scheduled_date: day.date,
                    scheduled_time: None,
                    priority: GENERATED_PRIORITY,
                    status: ScheduleStatus::Open,
                    created_at,
                    updated_at: created_at,
                };
                (ticket, schedule)
            })
            .collect()
    }

    /// 在给定连接（事务）内为目标生成并写入排程
    ///
    /// 调用方负责事务边界；任一写入失败即返回错误，由事务回滚全部写入。
    /// 不修改目标状态（仍为 PLANNING）。
    pub fn generate_in(
        conn: &Connection,
        target: &ProductionTarget,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> RepositoryResult<GenerationResult> {
        let plan = Self::plan(today, target.expected_completion_date);
        if plan.is_empty() {
            debug!(
                target_id = %target.target_id,
                completion = %target.expected_completion_date,
                "预计完成日期早于今天，跳过排程生成"
            );
            return Ok(GenerationResult::default());
        }

        let mut result = GenerationResult::default();
        for (ticket, schedule) in Self::materialize(&target.target_id, &plan, now) {
            TicketRepository::insert_in(conn, &ticket)?;
            result.tickets_created += 1;
            ScheduleRepository::insert_in(conn, &schedule)?;
            result.schedules_created += 1;
        }

        Ok(result)
    }
}
