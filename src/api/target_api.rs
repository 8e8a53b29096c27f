// ==========================================
// 细胞培养生产排程系统 - 生产目标 API
// ==========================================
// 职责: 生产目标增删改查、创建时展开逐日排程、进度汇总
// 红线:
// - 目标写入与排程生成在同一事务内，失败时不留下部分工单
// - 状态编辑经 TransitionGuard（严格模式可拒绝）
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{
    parse_date, parse_enum, parse_optional_date, parse_optional_enum, require_id, require_non_empty,
};
use crate::config::ConfigManager;
use crate::db::with_transaction;
use crate::domain::target::{ProductionTarget, TargetProgress};
use crate::domain::types::{ScheduleStatus, TargetStatus};
use crate::engine::schedule_generator::{GenerationResult, ScheduleGenerator};
use crate::engine::state_machine::TransitionGuard;
use crate::repository::{ScheduleRepository, TargetRepository};

// ==========================================
// 请求 / 响应
// ==========================================

/// 新建生产目标请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetRequest {
    pub name: String,
    #[serde(default)]
    pub material_type: Option<String>,
    #[serde(default)]
    pub responsible_person: Option<String>,
    #[serde(default)]
    pub production_target_label: Option<String>,
    #[serde(default)]
    pub start_culture_date: Option<String>,
    #[serde(default)]
    pub generation: Option<i32>,
    #[serde(default)]
    pub box_count: Option<u32>,
    pub expected_completion_date: String,
}

/// 更新生产目标描述字段（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetRequest {
    pub name: Option<String>,
    pub material_type: Option<String>,
    pub responsible_person: Option<String>,
    pub production_target_label: Option<String>,
    pub start_culture_date: Option<String>,
    pub generation: Option<i32>,
    pub box_count: Option<u32>,
    pub expected_completion_date: Option<String>,
}

/// 新建生产目标结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResponse {
    pub target: ProductionTarget,
    pub tickets_created: usize,
    pub schedules_created: usize,
}

// ==========================================
// TargetApi - 生产目标 API
// ==========================================
pub struct TargetApi {
    conn: Arc<Mutex<Connection>>,
    target_repo: Arc<TargetRepository>,
    schedule_repo: Arc<ScheduleRepository>,
    config_manager: Arc<ConfigManager>,
}

impl TargetApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        target_repo: Arc<TargetRepository>,
        schedule_repo: Arc<ScheduleRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            target_repo,
            schedule_repo,
            config_manager,
        }
    }

    /// 新建生产目标并生成从今天到预计完成日期的逐日排程
    pub fn create_target(&self, req: CreateTargetRequest) -> ApiResult<CreateTargetResponse> {
        let now = Local::now().naive_local();
        self.create_target_on(req, now.date(), now)
    }

    /// 以给定的"今天"新建生产目标
    ///
    /// # 参数
    /// - today: 本地日历日，生成的第 0 天
    /// - now: 写入时间戳
    ///
    /// # 返回
    /// 预计完成日期早于 today 时目标照常创建，生成数量为 0
    pub fn create_target_on(
        &self,
        req: CreateTargetRequest,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> ApiResult<CreateTargetResponse> {
        // 校验在任何写入之前完成
        let name = require_non_empty("name", &req.name)?;
        let expected_completion_date = parse_date("expectedCompletionDate", &req.expected_completion_date)?;
        let start_culture_date = parse_optional_date("startCultureDate", req.start_culture_date.as_deref())?;

        let target = ProductionTarget {
            target_id: Uuid::new_v4().to_string(),
            name,
            material_type: non_blank(req.material_type),
            responsible_person: non_blank(req.responsible_person),
            production_target_label: non_blank(req.production_target_label),
            start_culture_date,
            generation: req.generation,
            box_count: req.box_count,
            expected_completion_date,
            status: TargetStatus::Planning,
            created_at: now,
            updated_at: now,
        };

        let generation: GenerationResult = with_transaction(&self.conn, |tx| {
            TargetRepository::insert_in(tx, &target)?;
            ScheduleGenerator::generate_in(tx, &target, today, now)
        })
        .map_err(ApiError::from)?;

        info!(
            target_id = %target.target_id,
            today = %today,
            completion = %expected_completion_date,
            tickets = generation.tickets_created,
            schedules = generation.schedules_created,
            "生产目标已创建"
        );

        Ok(CreateTargetResponse {
            target,
            tickets_created: generation.tickets_created,
            schedules_created: generation.schedules_created,
        })
    }

    pub fn get_target(&self, target_id: &str) -> ApiResult<ProductionTarget> {
        require_id("targetId", target_id)?;
        self.target_repo
            .find_by_id(target_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ProductionTarget(id={})不存在", target_id)))
    }

    pub fn list_targets(&self, status: Option<&str>) -> ApiResult<Vec<ProductionTarget>> {
        let status: Option<TargetStatus> = parse_optional_enum("status", status)?;
        Ok(self.target_repo.list(status)?)
    }

    /// 更新描述性字段
    ///
    /// 修改预计完成日期不会重新生成排程
    pub fn update_target(&self, target_id: &str, req: UpdateTargetRequest) -> ApiResult<ProductionTarget> {
        let mut target = self.get_target(target_id)?;

        if let Some(name) = req.name {
            target.name = require_non_empty("name", &name)?;
        }
        if let Some(raw) = req.expected_completion_date {
            target.expected_completion_date = parse_date("expectedCompletionDate", &raw)?;
        }
        if let Some(raw) = req.start_culture_date {
            target.start_culture_date = parse_optional_date("startCultureDate", Some(&raw))?;
        }
        if req.material_type.is_some() {
            target.material_type = non_blank(req.material_type);
        }
        if req.responsible_person.is_some() {
            target.responsible_person = non_blank(req.responsible_person);
        }
        if req.production_target_label.is_some() {
            target.production_target_label = non_blank(req.production_target_label);
        }
        if req.generation.is_some() {
            target.generation = req.generation;
        }
        if req.box_count.is_some() {
            target.box_count = req.box_count;
        }
        target.updated_at = Local::now().naive_local();

        self.target_repo.update_details(&target)?;
        Ok(target)
    }

    /// 人工设置目标状态
    pub fn set_target_status(&self, target_id: &str, status: &str) -> ApiResult<ProductionTarget> {
        require_id("targetId", target_id)?;
        let next: TargetStatus = parse_enum("status", status)?;
        let guard = TransitionGuard::new(self.config_manager.is_strict_transitions_enabled()?);
        let now = Local::now().naive_local();

        let updated = with_transaction(&self.conn, |tx| {
            let mut target = TargetRepository::find_by_id_in(tx, target_id)?
                .ok_or_else(|| ApiError::NotFound(format!("ProductionTarget(id={})不存在", target_id)))?;
            if target.status != next {
                guard.check_target(target_id, target.status, next)?;
                TargetRepository::update_status_in(tx, target_id, next, now)?;
                target.status = next;
                target.updated_at = now;
            }
            Ok::<_, ApiError>(target)
        })?;

        info!(target_id, status = %updated.status, "生产目标状态已更新");
        Ok(updated)
    }

    /// 删除生产目标（其排程随之删除，工单保留）
    pub fn delete_target(&self, target_id: &str) -> ApiResult<()> {
        require_id("targetId", target_id)?;
        self.target_repo.delete(target_id)?;
        info!(target_id, "生产目标已删除");
        Ok(())
    }

    /// 目标下各状态的排程数量
    pub fn get_target_progress(&self, target_id: &str) -> ApiResult<TargetProgress> {
        let target = self.get_target(target_id)?;
        let schedules = self.schedule_repo.list_by_target(&target.target_id)?;

        let mut progress = TargetProgress {
            target_id: target.target_id,
            total: schedules.len(),
            ..TargetProgress::default()
        };
        for schedule in &schedules {
            match schedule.status {
                ScheduleStatus::Open => progress.open += 1,
                ScheduleStatus::InProgress => progress.in_progress += 1,
                ScheduleStatus::Completed => progress.completed += 1,
                ScheduleStatus::Cancelled => progress.cancelled += 1,
            }
        }
        Ok(progress)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
