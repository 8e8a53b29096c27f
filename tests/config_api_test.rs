// ==========================================
// 配置管理 API 集成测试
// ==========================================
// 测试范围:
// 1. 默认值与覆写
// 2. 未知键、非法取值拒绝
// 3. 配置对排程新建的影响
// ==========================================


use cell_culture_aps::config::config_keys;
use cell_culture_aps::domain::types::{SchedulePriority, TargetStatus};
use cell_culture_aps::domain::{AoiPayload, TicketPayload};
use cell_culture_aps::engine::PromotionDecision;
use test_helpers::*;

#[test]
fn test_defaults_when_nothing_written() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let config = env.state.config_api.get_engine_config().unwrap();

    assert_eq!(config.default_priority, SchedulePriority::Medium);
    assert!(config.promote_on_create);
    assert!(!config.strict_transitions);
    assert!(env.state.config_api.list_configs().unwrap().is_empty());
}

#[test]
fn test_update_normalizes_values() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.set_config(config_keys::STRICT_TRANSITIONS, "YES");
    env.set_config(config_keys::DEFAULT_PRIORITY, "HIGH");

    let configs = env.state.config_api.list_configs().unwrap();
    assert_eq!(configs.get(config_keys::STRICT_TRANSITIONS).map(String::as_str), Some("true"));
    assert_eq!(configs.get(config_keys::DEFAULT_PRIORITY).map(String::as_str), Some("HIGH"));

    let config = env.state.config_api.get_engine_config().unwrap();
    assert!(config.strict_transitions);
    assert_eq!(config.default_priority, SchedulePriority::High);
}

#[test]
fn test_rejects_unknown_key_and_bad_values() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let api = &env.state.config_api;

    assert!(api.update_config("schedule.unknown", "1").unwrap_err().is_validation());
    assert!(api
        .update_config(config_keys::PROMOTE_ON_CREATE, "maybe")
        .unwrap_err()
        .is_validation());
    assert!(api
        .update_config(config_keys::DEFAULT_PRIORITY, "URGENT")
        .unwrap_err()
        .is_validation());
    assert!(api.list_configs().unwrap().is_empty(), "非法写入不应落库");
}

#[test]
fn test_default_priority_applies_to_created_schedule() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.set_config(config_keys::DEFAULT_PRIORITY, "LOW");
    let target = env.create_empty_target("T").target;
    let ticket = env.create_ticket(TicketPayload::Aoi(AoiPayload::default()));

    let resp = env
        .state
        .schedule_api
        .create_schedule(schedule_request(&ticket.ticket_id, &target.target_id, "2025-04-01", None))
        .unwrap();
    assert_eq!(resp.schedule.priority, SchedulePriority::Low);
}

#[test]
fn test_promote_on_create_disabled_keeps_target_planning() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.set_config(config_keys::PROMOTE_ON_CREATE, "false");
    let target = env.create_empty_target("T").target;
    let ticket = env.create_ticket(TicketPayload::Aoi(AoiPayload::default()));

    let resp = env
        .state
        .schedule_api
        .create_schedule(schedule_request(&ticket.ticket_id, &target.target_id, "2025-04-01", None))
        .unwrap();
    assert!(!resp.target_promoted);
    assert_eq!(resp.promotion, Some(PromotionDecision::PromoteOnCreateDisabled));
    assert_eq!(
        env.state.target_api.get_target(&target.target_id).unwrap().status,
        TargetStatus::Planning
    );
}
