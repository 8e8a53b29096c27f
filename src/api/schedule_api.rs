// ==========================================
// 细胞培养生产排程系统 - 工单排程 API
// ==========================================
// 职责: 排程增删改查、规范顺序查询、状态变更触发目标晋级
// 红线:
// - (ticket, target, date) 唯一，重复创建返回 Conflict
// - 晋级判定与晋级写入处于同一事务；仅从 PLANNING 出发
// - 列表查询统一经 ScheduleOrder 排序
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_date, parse_enum, parse_optional_enum, parse_optional_time, require_id};
use crate::config::ConfigManager;
use crate::db::with_transaction;
use crate::domain::schedule::TicketSchedule;
use crate::domain::types::{SchedulePriority, ScheduleStatus};
use crate::engine::schedule_order::ScheduleOrder;
use crate::engine::state_machine::{PromotionDecision, PromotionRule, TransitionGuard};
use crate::repository::{ScheduleRepository, TargetRepository, TicketRepository};

// ==========================================
// 请求 / 响应
// ==========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub ticket_id: String,
    pub target_id: String,
    pub scheduled_date: String,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    /// 缺省时取配置 schedule.default_priority
    #[serde(default)]
    pub priority: Option<String>,
}

/// 更新排程（None 表示不修改；scheduledTime 传空串表示清除时刻）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMutationResponse {
    pub schedule: TicketSchedule,
    /// 本次操作涉及晋级判定时的结论
    pub promotion: Option<PromotionDecision>,
    /// 本次操作是否实际把目标从 PLANNING 改为 IN_PROGRESS
    pub target_promoted: bool,
}

// ==========================================
// ScheduleApi - 工单排程 API
// ==========================================
pub struct ScheduleApi {
    conn: Arc<Mutex<Connection>>,
    schedule_repo: Arc<ScheduleRepository>,
    config_manager: Arc<ConfigManager>,
}

impl ScheduleApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        schedule_repo: Arc<ScheduleRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            schedule_repo,
            config_manager,
        }
    }

    // ==========================================
    // 写入接口
    // ==========================================

    pub fn create_schedule(&self, req: CreateScheduleRequest) -> ApiResult<ScheduleMutationResponse> {
        self.create_schedule_at(req, Local::now().naive_local())
    }

    /// 新建排程
    ///
    /// 目标处于 PLANNING 且 schedule.promote_on_create 开启时，同一事务内晋级为 IN_PROGRESS
    pub fn create_schedule_at(
        &self,
        req: CreateScheduleRequest,
        now: NaiveDateTime,
    ) -> ApiResult<ScheduleMutationResponse> {
        require_id("ticketId", &req.ticket_id)?;
        require_id("targetId", &req.target_id)?;
        let scheduled_date = parse_date("scheduledDate", &req.scheduled_date)?;
        let scheduled_time = parse_optional_time("scheduledTime", req.scheduled_time.as_deref())?;
        let priority: SchedulePriority = match parse_optional_enum("priority", req.priority.as_deref())? {
            Some(p) => p,
            None => self.config_manager.get_default_priority()?,
        };
        let promote_on_create = self.config_manager.is_promote_on_create_enabled()?;

        let schedule = TicketSchedule {
            schedule_id: Uuid::new_v4().to_string(),
            ticket_id: req.ticket_id.trim().to_string(),
            target_id: req.target_id.trim().to_string(),
            scheduled_date,
            scheduled_time,
            priority,
            status: ScheduleStatus::Open,
            created_at: now,
            updated_at: now,
        };

        let (decision, promoted) = with_transaction(&self.conn, |tx| {
            if TicketRepository::find_by_id_in(tx, &schedule.ticket_id)?.is_none() {
                return Err(ApiError::NotFound(format!("Ticket(id={})不存在", schedule.ticket_id)));
            }
            let target = TargetRepository::find_by_id_in(tx, &schedule.target_id)?.ok_or_else(|| {
                ApiError::NotFound(format!("ProductionTarget(id={})不存在", schedule.target_id))
            })?;
            if ScheduleRepository::exists_in(tx, &schedule.ticket_id, &schedule.target_id, scheduled_date)? {
                return Err(ApiError::Conflict(format!(
                    "工单{}在{}已排入目标{}",
                    schedule.ticket_id, scheduled_date, schedule.target_id
                )));
            }

            ScheduleRepository::insert_in(tx, &schedule)?;

            let decision = PromotionRule::on_schedule_created(target.status, promote_on_create);
            let promoted = decision.should_promote()
                && TargetRepository::promote_if_planning_in(tx, &schedule.target_id, now)?;
            Ok((decision, promoted))
        })?;

        info!(
            schedule_id = %schedule.schedule_id,
            target_id = %schedule.target_id,
            date = %scheduled_date,
            promoted,
            reason = %decision.reason(),
            "排程已创建"
        );

        Ok(ScheduleMutationResponse {
            schedule,
            promotion: Some(decision),
            target_promoted: promoted,
        })
    }

    pub fn update_schedule(
        &self,
        schedule_id: &str,
        req: UpdateScheduleRequest,
    ) -> ApiResult<ScheduleMutationResponse> {
        self.update_schedule_at(schedule_id, req, Local::now().naive_local())
    }

    /// 更新排程日期/时刻/优先级/状态
    ///
    /// 状态被置为 IN_PROGRESS 时，若目标为 PLANNING 且本排程是规范顺序第一条，则目标晋级
    pub fn update_schedule_at(
        &self,
        schedule_id: &str,
        req: UpdateScheduleRequest,
        now: NaiveDateTime,
    ) -> ApiResult<ScheduleMutationResponse> {
        require_id("scheduleId", schedule_id)?;
        let scheduled_date = req
            .scheduled_date
            .as_deref()
            .map(|raw| parse_date("scheduledDate", raw))
            .transpose()?;
        let scheduled_time = match req.scheduled_time.as_deref() {
            None => None,
            Some(raw) => Some(parse_optional_time("scheduledTime", Some(raw))?),
        };
        let priority: Option<SchedulePriority> = parse_optional_enum("priority", req.priority.as_deref())?;
        let status: Option<ScheduleStatus> = parse_optional_enum("status", req.status.as_deref())?;
        let guard = TransitionGuard::new(self.config_manager.is_strict_transitions_enabled()?);

        let (schedule, decision, promoted) = with_transaction(&self.conn, |tx| {
            let mut schedule = ScheduleRepository::find_by_id_in(tx, schedule_id)?
                .ok_or_else(|| ApiError::NotFound(format!("TicketSchedule(id={})不存在", schedule_id)))?;

            if let Some(date) = scheduled_date {
                schedule.scheduled_date = date;
            }
            if let Some(time) = scheduled_time {
                schedule.scheduled_time = time;
            }
            if let Some(priority) = priority {
                schedule.priority = priority;
            }
            if let Some(next) = status {
                if next != schedule.status {
                    guard.check_schedule(schedule_id, schedule.status, next)?;
                }
                schedule.status = next;
            }
            schedule.updated_at = now;
            ScheduleRepository::update_in(tx, &schedule)?;

            if status != Some(ScheduleStatus::InProgress) {
                return Ok((schedule, None, false));
            }

            let target = TargetRepository::find_by_id_in(tx, &schedule.target_id)?.ok_or_else(|| {
                ApiError::NotFound(format!("ProductionTarget(id={})不存在", schedule.target_id))
            })?;
            let snapshot = ScheduleRepository::list_by_target_in(tx, &schedule.target_id)?;
            let decision = PromotionRule::on_status_change(target.status, &schedule, &snapshot);
            let promoted = decision.should_promote()
                && TargetRepository::promote_if_planning_in(tx, &schedule.target_id, now)?;
            Ok::<_, ApiError>((schedule, Some(decision), promoted))
        })?;

        match &decision {
            Some(d) => info!(
                schedule_id,
                target_id = %schedule.target_id,
                promoted,
                reason = %d.reason(),
                "排程已开始"
            ),
            None => debug!(schedule_id, status = %schedule.status, "排程已更新"),
        }

        Ok(ScheduleMutationResponse {
            schedule,
            promotion: decision,
            target_promoted: promoted,
        })
    }

    /// 仅修改排程状态
    pub fn set_schedule_status(&self, schedule_id: &str, status: &str) -> ApiResult<ScheduleMutationResponse> {
        self.update_schedule(
            schedule_id,
            UpdateScheduleRequest {
                status: Some(status.to_string()),
                ..UpdateScheduleRequest::default()
            },
        )
    }

    /// 删除排程（工单保留）
    pub fn delete_schedule(&self, schedule_id: &str) -> ApiResult<()> {
        require_id("scheduleId", schedule_id)?;
        self.schedule_repo.delete(schedule_id)?;
        info!(schedule_id, "排程已删除");
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn get_schedule(&self, schedule_id: &str) -> ApiResult<TicketSchedule> {
        require_id("scheduleId", schedule_id)?;
        self.schedule_repo
            .find_by_id(schedule_id)?
            .ok_or_else(|| ApiError::NotFound(format!("TicketSchedule(id={})不存在", schedule_id)))
    }

    /// 目标下全部排程（规范顺序）
    pub fn list_by_target(&self, target_id: &str) -> ApiResult<Vec<TicketSchedule>> {
        require_id("targetId", target_id)?;
        Ok(ScheduleOrder::sorted(self.schedule_repo.list_by_target(target_id)?))
    }

    /// 某日全部排程（规范顺序）
    pub fn list_by_date(&self, date: &str) -> ApiResult<Vec<TicketSchedule>> {
        let date = parse_date("date", date)?;
        self.list_on(date)
    }

    /// 今日排程（本地日历日）
    pub fn list_today(&self) -> ApiResult<Vec<TicketSchedule>> {
        self.list_on(Local::now().date_naive())
    }

    fn list_on(&self, date: NaiveDate) -> ApiResult<Vec<TicketSchedule>> {
        Ok(ScheduleOrder::sorted(self.schedule_repo.list_by_date(date)?))
    }

    /// 按状态字符串过滤目标下排程
    pub fn list_by_target_and_status(&self, target_id: &str, status: &str) -> ApiResult<Vec<TicketSchedule>> {
        let status: ScheduleStatus = parse_enum("status", status)?;
        Ok(self
            .list_by_target(target_id)?
            .into_iter()
            .filter(|s| s.status == status)
            .collect())
    }
}
