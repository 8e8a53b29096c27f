// ==========================================
// 目标自动晋级集成测试
// ==========================================
// 测试范围:
// 1. 状态变更途径: 规范顺序第一条排程开始 → 目标 IN_PROGRESS
// 2. 新建途径: 对 PLANNING 目标新建排程立即晋级
// 3. 只从 PLANNING 出发，已取消目标不会被重新打开
// 4. 严格迁移模式
// ==========================================


use cell_culture_aps::api::UpdateScheduleRequest;
use cell_culture_aps::config::config_keys;
use cell_culture_aps::domain::{AoiPayload, TicketPayload};
use cell_culture_aps::domain::types::{ScheduleStatus, TargetStatus};
use cell_culture_aps::engine::PromotionDecision;
use test_helpers::*;

fn start(status: &str) -> UpdateScheduleRequest {
    UpdateScheduleRequest {
        status: Some(status.to_string()),
        ..UpdateScheduleRequest::default()
    }
}

fn aoi() -> TicketPayload {
    TicketPayload::Aoi(AoiPayload::default())
}

// ==========================================
// 状态变更途径
// ==========================================

#[test]
fn test_timed_schedule_precedes_earlier_created_untimed() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.set_config(config_keys::PROMOTE_ON_CREATE, "false");

    let target = env.create_empty_target("T").target;
    let ticket_a = env.create_ticket(aoi());
    let ticket_b = env.create_ticket(aoi());
    let api = &env.state.schedule_api;

    // A 先创建、无时刻；B 后创建、09:00
    let a = api
        .create_schedule_at(
            schedule_request(&ticket_a.ticket_id, &target.target_id, "2025-03-01", None),
            ts("2025-02-01", "10:00:00"),
        )
        .unwrap();
    assert!(!a.target_promoted);
    assert_eq!(a.promotion, Some(PromotionDecision::PromoteOnCreateDisabled));

    let b = api
        .create_schedule_at(
            schedule_request(&ticket_b.ticket_id, &target.target_id, "2025-03-01", Some("09:00")),
            ts("2025-02-01", "11:00:00"),
        )
        .unwrap();

    let ordered = api.list_by_target(&target.target_id).unwrap();
    assert_eq!(ordered[0].schedule_id, b.schedule.schedule_id, "有时刻的排程应排在前面");

    // 先开始 A: 非首条，不晋级
    let resp = api
        .update_schedule_at(&a.schedule.schedule_id, start("IN_PROGRESS"), ts("2025-03-01", "08:00:00"))
        .unwrap();
    assert!(!resp.target_promoted);
    assert_eq!(
        resp.promotion,
        Some(PromotionDecision::NotFirstSchedule {
            first_schedule_id: b.schedule.schedule_id.clone()
        })
    );
    assert_eq!(env.state.target_api.get_target(&target.target_id).unwrap().status, TargetStatus::Planning);

    // 开始 B: 晋级
    let resp = api
        .update_schedule_at(&b.schedule.schedule_id, start("IN_PROGRESS"), ts("2025-03-01", "09:00:00"))
        .unwrap();
    assert!(resp.target_promoted);
    assert_eq!(resp.promotion, Some(PromotionDecision::Promote));
    assert_eq!(
        env.state.target_api.get_target(&target.target_id).unwrap().status,
        TargetStatus::InProgress
    );
}

#[test]
fn test_second_promotion_is_noop() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.set_config(config_keys::PROMOTE_ON_CREATE, "false");

    let target = env.create_empty_target("T").target;
    let ticket_a = env.create_ticket(aoi());
    let ticket_b = env.create_ticket(aoi());
    let api = &env.state.schedule_api;

    let a = api
        .create_schedule_at(
            schedule_request(&ticket_a.ticket_id, &target.target_id, "2025-03-01", None),
            ts("2025-02-01", "10:00:00"),
        )
        .unwrap();
    let b = api
        .create_schedule_at(
            schedule_request(&ticket_b.ticket_id, &target.target_id, "2025-03-01", Some("09:00")),
            ts("2025-02-01", "11:00:00"),
        )
        .unwrap();

    let first = api
        .update_schedule_at(&b.schedule.schedule_id, start("IN_PROGRESS"), ts("2025-03-01", "09:00:00"))
        .unwrap();
    assert!(first.target_promoted);

    let second = api
        .update_schedule_at(&a.schedule.schedule_id, start("IN_PROGRESS"), ts("2025-03-01", "10:00:00"))
        .unwrap();
    assert!(!second.target_promoted, "目标已在进行中，重复晋级应为空操作");
    assert_eq!(
        second.promotion,
        Some(PromotionDecision::TargetNotPlanning {
            status: TargetStatus::InProgress
        })
    );

    // 再次把首条置为 IN_PROGRESS 也不会重复写入
    let again = api
        .update_schedule_at(&b.schedule.schedule_id, start("IN_PROGRESS"), ts("2025-03-01", "11:00:00"))
        .unwrap();
    assert!(!again.target_promoted);
    assert_eq!(
        env.state.target_api.get_target(&target.target_id).unwrap().status,
        TargetStatus::InProgress
    );
}

#[test]
fn test_generated_target_promotes_on_first_day_only() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let resp = env.create_target("T", "2025-01-01", "2025-01-05");
    let target_id = resp.target.target_id;
    let schedules = env.state.schedule_api.list_by_target(&target_id).unwrap();
    assert_eq!(schedules.len(), 5);

    let api = &env.state.schedule_api;
    let later = api
        .update_schedule_at(&schedules[3].schedule_id, start("IN_PROGRESS"), ts("2025-01-01", "09:00:00"))
        .unwrap();
    assert!(!later.target_promoted, "第 3 天的排程不是首条");

    let first = api
        .update_schedule_at(&schedules[0].schedule_id, start("IN_PROGRESS"), ts("2025-01-01", "09:30:00"))
        .unwrap();
    assert!(first.target_promoted, "第 0 天的复苏排程开始后目标应晋级");
    assert_eq!(env.state.target_api.get_target(&target_id).unwrap().status, TargetStatus::InProgress);
}

#[test]
fn test_non_in_progress_edits_do_not_evaluate_promotion() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let resp = env.create_target("T", "2025-01-01", "2025-01-02");
    let schedules = env.state.schedule_api.list_by_target(&resp.target.target_id).unwrap();

    let updated = env
        .state
        .schedule_api
        .update_schedule(
            &schedules[0].schedule_id,
            UpdateScheduleRequest {
                scheduled_time: Some("14:30".to_string()),
                priority: Some("HIGH".to_string()),
                ..UpdateScheduleRequest::default()
            },
        )
        .unwrap();
    assert!(updated.promotion.is_none());
    assert_eq!(updated.schedule.status, ScheduleStatus::Open);
    assert_eq!(
        env.state.target_api.get_target(&resp.target.target_id).unwrap().status,
        TargetStatus::Planning
    );
}

// ==========================================
// 新建途径
// ==========================================

#[test]
fn test_create_schedule_promotes_planning_target() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let target = env.create_empty_target("T").target;
    let ticket_1 = env.create_ticket(aoi());
    let ticket_2 = env.create_ticket(aoi());

    let first = env
        .state
        .schedule_api
        .create_schedule(schedule_request(&ticket_1.ticket_id, &target.target_id, "2025-04-01", None))
        .unwrap();
    assert!(first.target_promoted);
    assert_eq!(
        env.state.target_api.get_target(&target.target_id).unwrap().status,
        TargetStatus::InProgress
    );

    let second = env
        .state
        .schedule_api
        .create_schedule(schedule_request(&ticket_2.ticket_id, &target.target_id, "2025-04-02", None))
        .unwrap();
    assert!(!second.target_promoted);
    assert_eq!(
        second.promotion,
        Some(PromotionDecision::TargetNotPlanning {
            status: TargetStatus::InProgress
        })
    );
}

#[test]
fn test_cancelled_target_is_never_reopened() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let target = env.create_empty_target("T").target;
    env.state
        .target_api
        .set_target_status(&target.target_id, "CANCELLED")
        .unwrap();

    let ticket = env.create_ticket(aoi());
    let created = env
        .state
        .schedule_api
        .create_schedule(schedule_request(&ticket.ticket_id, &target.target_id, "2025-04-01", None))
        .unwrap();
    assert!(!created.target_promoted);

    let started = env
        .state
        .schedule_api
        .set_schedule_status(&created.schedule.schedule_id, "IN_PROGRESS")
        .unwrap();
    assert!(!started.target_promoted);
    assert_eq!(
        env.state.target_api.get_target(&target.target_id).unwrap().status,
        TargetStatus::Cancelled
    );
}

#[test]
fn test_duplicate_schedule_is_conflict() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let target = env.create_empty_target("T").target;
    let ticket = env.create_ticket(aoi());
    let api = &env.state.schedule_api;

    api.create_schedule(schedule_request(&ticket.ticket_id, &target.target_id, "2025-04-01", None))
        .unwrap();
    let err = api
        .create_schedule(schedule_request(&ticket.ticket_id, &target.target_id, "2025-04-01", Some("10:00")))
        .unwrap_err();
    assert!(err.is_conflict(), "重复 (ticket, target, date) 应为冲突: {}", err);

    // 不同日期可以
    api.create_schedule(schedule_request(&ticket.ticket_id, &target.target_id, "2025-04-02", None))
        .unwrap();
    assert_eq!(env.count("ticket_schedule"), 2);
}

#[test]
fn test_create_schedule_missing_references_are_not_found() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let target = env.create_empty_target("T").target;
    let ticket = env.create_ticket(aoi());
    let api = &env.state.schedule_api;

    let err = api
        .create_schedule(schedule_request("no-such-ticket", &target.target_id, "2025-04-01", None))
        .unwrap_err();
    assert!(err.is_not_found());

    let err = api
        .create_schedule(schedule_request(&ticket.ticket_id, "no-such-target", "2025-04-01", None))
        .unwrap_err();
    assert!(err.is_not_found());

    let err = api
        .create_schedule(schedule_request(&ticket.ticket_id, &target.target_id, "2025-04-01", Some("9am")))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(env.count("ticket_schedule"), 0);
}

// ==========================================
// 迁移校验
// ==========================================

#[test]
fn test_lenient_mode_applies_out_of_graph_edit() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let resp = env.create_target("T", "2025-01-01", "2025-01-01");
    let schedule = &env.state.schedule_api.list_by_target(&resp.target.target_id).unwrap()[0];

    let updated = env
        .state
        .schedule_api
        .set_schedule_status(&schedule.schedule_id, "COMPLETED")
        .expect("宽松模式应照常应用");
    assert_eq!(updated.schedule.status, ScheduleStatus::Completed);
}

#[test]
fn test_strict_mode_rejects_out_of_graph_edit() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.set_config(config_keys::STRICT_TRANSITIONS, "true");

    let resp = env.create_target("T", "2025-01-01", "2025-01-01");
    let schedule = &env.state.schedule_api.list_by_target(&resp.target.target_id).unwrap()[0];

    let err = env
        .state
        .schedule_api
        .set_schedule_status(&schedule.schedule_id, "COMPLETED")
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
    assert_eq!(
        env.state.schedule_api.get_schedule(&schedule.schedule_id).unwrap().status,
        ScheduleStatus::Open,
        "被拒绝的编辑不应落库"
    );

    // 合法迁移照常
    env.state
        .schedule_api
        .set_schedule_status(&schedule.schedule_id, "IN_PROGRESS")
        .unwrap();

    let err = env
        .state
        .target_api
        .set_target_status(&resp.target.target_id, "PLANNING")
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION", "IN_PROGRESS → PLANNING 不在迁移图内");
}
