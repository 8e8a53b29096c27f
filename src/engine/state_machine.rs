// ==========================================
// 细胞培养生产排程系统 - 排程/目标状态机
// ==========================================
// 职责:
// 1. 状态迁移校验（严格模式可拒绝，宽松模式仅告警）
// 2. 自动晋级判定: 目标 PLANNING → IN_PROGRESS
//    - 途径一: 某排程被置为 IN_PROGRESS，且它是目标下规范顺序第一条
//    - 途径二: 对 PLANNING 目标新建排程
//    两条途径都只从 PLANNING 出发，已完成/已取消的目标不会被重新打开
// 红线: 判定为纯函数，输入为显式快照，不在此处访问数据库
// ==========================================

use crate::domain::schedule::TicketSchedule;
use crate::domain::types::{ScheduleStatus, TargetStatus};
use crate::engine::schedule_order::ScheduleOrder;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ==========================================
// 晋级判定
// ==========================================

/// 晋级判定结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionDecision {
    /// 应晋级
    Promote,
    /// 目标已不在 PLANNING
    TargetNotPlanning { status: TargetStatus },
    /// 该排程不是规范顺序第一条
    NotFirstSchedule { first_schedule_id: String },
    /// 排程状态不是 IN_PROGRESS
    ScheduleNotStarted,
    /// 新建即晋级已被配置关闭
    PromoteOnCreateDisabled,
}

impl PromotionDecision {
    pub fn should_promote(&self) -> bool {
        matches!(self, PromotionDecision::Promote)
    }

    /// 日志用的简短原因
    pub fn reason(&self) -> String {
        match self {
            PromotionDecision::Promote => "首条排程已开始".to_string(),
            PromotionDecision::TargetNotPlanning { status } => {
                format!("目标状态为{}，不再晋级", status)
            }
            PromotionDecision::NotFirstSchedule { first_schedule_id } => {
                format!("非首条排程，首条为{}", first_schedule_id)
            }
            PromotionDecision::ScheduleNotStarted => "排程未进入IN_PROGRESS".to_string(),
            PromotionDecision::PromoteOnCreateDisabled => "新建排程晋级已关闭".to_string(),
        }
    }
}

pub struct PromotionRule;

impl PromotionRule {
    /// 排程状态变更后的晋级判定
    ///
    /// # 参数
    /// - target_status: 目标当前状态
    /// - schedule: 已应用本次变更的排程
    /// - snapshot: 目标下全部排程（需包含 schedule 的最新版本）
    pub fn on_status_change(
        target_status: TargetStatus,
        schedule: &TicketSchedule,
        snapshot: &[TicketSchedule],
    ) -> PromotionDecision {
        if schedule.status != ScheduleStatus::InProgress {
            return PromotionDecision::ScheduleNotStarted;
        }
        if target_status != TargetStatus::Planning {
            return PromotionDecision::TargetNotPlanning {
                status: target_status,
            };
        }

        match ScheduleOrder::first(snapshot) {
            Some(first) if first.schedule_id == schedule.schedule_id => PromotionDecision::Promote,
            Some(first) => PromotionDecision::NotFirstSchedule {
                first_schedule_id: first.schedule_id.clone(),
            },
            // 快照缺失时以本排程自身为唯一候选
            None => PromotionDecision::Promote,
        }
    }

    /// 新建排程时的晋级判定
    pub fn on_schedule_created(target_status: TargetStatus, promote_on_create: bool) -> PromotionDecision {
        if target_status != TargetStatus::Planning {
            return PromotionDecision::TargetNotPlanning {
                status: target_status,
            };
        }
        if !promote_on_create {
            return PromotionDecision::PromoteOnCreateDisabled;
        }
        PromotionDecision::Promote
    }
}

// ==========================================
// 迁移校验
// ==========================================

/// 状态迁移守卫
///
/// - strict=true: 迁移图之外的编辑返回 InvalidStateTransition
/// - strict=false: 照常应用，记录告警
#[derive(Debug, Clone, Copy)]
pub struct TransitionGuard {
    strict: bool,
}

impl TransitionGuard {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn check_schedule(
        &self,
        schedule_id: &str,
        from: ScheduleStatus,
        to: ScheduleStatus,
    ) -> Result<(), RepositoryError> {
        if from.can_transition_to(to) {
            return Ok(());
        }
        self.reject_or_warn("TicketSchedule", schedule_id, &from.to_string(), &to.to_string())
    }

    pub fn check_target(
        &self,
        target_id: &str,
        from: TargetStatus,
        to: TargetStatus,
    ) -> Result<(), RepositoryError> {
        if from.can_transition_to(to) {
            return Ok(());
        }
        self.reject_or_warn("ProductionTarget", target_id, &from.to_string(), &to.to_string())
    }

    fn reject_or_warn(&self, entity: &str, id: &str, from: &str, to: &str) -> Result<(), RepositoryError> {
        if self.strict {
            return Err(RepositoryError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        warn!(entity, id, from, to, "状态迁移不在迁移图内，按人工编辑照常应用");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SchedulePriority;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn schedule(
        id: &str,
        date: &str,
        time: Option<&str>,
        created: &str,
        status: ScheduleStatus,
    ) -> TicketSchedule {
        let created_at = NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S").unwrap();
        TicketSchedule {
            schedule_id: id.to_string(),
            ticket_id: format!("T-{}", id),
            target_id: "TG1".to_string(),
            scheduled_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            scheduled_time: time.map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap()),
            priority: SchedulePriority::Medium,
            status,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_first_schedule_started_promotes_planning_target() {
        let a = schedule("A", "2025-02-01", None, "2025-01-01 00:00:00", ScheduleStatus::Open);
        let b = schedule("B", "2025-02-01", Some("09:00"), "2025-01-02 00:00:00", ScheduleStatus::InProgress);
        let snapshot = vec![a, b.clone()];

        let decision = PromotionRule::on_status_change(TargetStatus::Planning, &b, &snapshot);
        assert_eq!(decision, PromotionDecision::Promote);
    }

    #[test]
    fn test_untimed_schedule_is_not_first_when_timed_exists() {
        let a = schedule("A", "2025-02-01", None, "2025-01-01 00:00:00", ScheduleStatus::InProgress);
        let b = schedule("B", "2025-02-01", Some("09:00"), "2025-01-02 00:00:00", ScheduleStatus::Open);
        let snapshot = vec![a.clone(), b];

        let decision = PromotionRule::on_status_change(TargetStatus::Planning, &a, &snapshot);
        assert_eq!(
            decision,
            PromotionDecision::NotFirstSchedule {
                first_schedule_id: "B".to_string()
            }
        );
    }

    #[test]
    fn test_already_in_progress_target_is_noop() {
        let a = schedule("A", "2025-02-01", None, "2025-01-01 00:00:00", ScheduleStatus::InProgress);
        let snapshot = vec![a.clone()];

        for status in [TargetStatus::InProgress, TargetStatus::Completed, TargetStatus::Cancelled] {
            let decision = PromotionRule::on_status_change(status, &a, &snapshot);
            assert!(!decision.should_promote(), "{} 不应被晋级", status);
        }
    }

    #[test]
    fn test_non_in_progress_status_never_promotes() {
        let a = schedule("A", "2025-02-01", None, "2025-01-01 00:00:00", ScheduleStatus::Completed);
        let decision = PromotionRule::on_status_change(TargetStatus::Planning, &a, &[a.clone()]);
        assert_eq!(decision, PromotionDecision::ScheduleNotStarted);
    }

    #[test]
    fn test_schedule_created_promotes_only_from_planning() {
        assert!(PromotionRule::on_schedule_created(TargetStatus::Planning, true).should_promote());
        assert!(!PromotionRule::on_schedule_created(TargetStatus::Planning, false).should_promote());
        assert!(!PromotionRule::on_schedule_created(TargetStatus::Cancelled, true).should_promote());
        assert!(!PromotionRule::on_schedule_created(TargetStatus::Completed, true).should_promote());
    }

    #[test]
    fn test_transition_guard_modes() {
        let lenient = TransitionGuard::new(false);
        assert!(lenient
            .check_schedule("S1", ScheduleStatus::Completed, ScheduleStatus::Open)
            .is_ok());

        let strict = TransitionGuard::new(true);
        assert!(strict
            .check_schedule("S1", ScheduleStatus::Open, ScheduleStatus::InProgress)
            .is_ok());
        let err = strict
            .check_target("TG1", TargetStatus::Cancelled, TargetStatus::Planning)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));
    }
}
