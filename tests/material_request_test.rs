// ==========================================
// 物料申领集成测试
// ==========================================
// 测试范围:
// 1. 换液工单盒数缺失 → 待定，目标盒数补齐后重算得到数量
// 2. 领取切换与 PENDING/PREPARED 派生
// 3. CANCELLED 不被切换恢复
// 4. 下标越界为输入错误
// 5. 批量重算: 逐条独立，失败记录后继续
// ==========================================


use cell_culture_aps::api::UpdateTargetRequest;
use cell_culture_aps::domain::types::{MaterialRequestStatus, TicketType};
use cell_culture_aps::domain::{AoiPayload, ChangeMediumPayload, CollectAndDiscardPayload, SubPayload, TicketPayload};
use cell_culture_aps::repository::UpsertOutcome;
use cell_culture_aps::ApiError;
use test_helpers::*;

fn aoi() -> TicketPayload {
    TicketPayload::Aoi(AoiPayload::default())
}

#[test]
fn test_change_medium_quantity_resolves_after_target_box_count_known() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let resp = env.create_target("T", "2025-01-01", "2025-01-04");
    let schedules = env.state.schedule_api.list_by_target(&resp.target.target_id).unwrap();

    // 第 3 天为换液
    let ticket_id = schedules[3].ticket_id.clone();
    assert_eq!(
        env.state.ticket_api.get_ticket(&ticket_id).unwrap().ticket_type(),
        TicketType::ChangeMedium
    );

    let first = env.state.material_api.upsert_material_request(&ticket_id).unwrap();
    assert_eq!(first.outcome, UpsertOutcome::Created);
    assert_eq!(first.request.device_type, TicketType::ChangeMedium);
    assert_eq!(first.request.status, MaterialRequestStatus::Pending);
    let medium = &first.request.materials.items[0];
    assert_eq!(medium.name, "Medium");
    assert_eq!(medium.quantity, None, "未知数量必须为 null 而不是 0");
    assert!(medium.pending);

    env.state
        .target_api
        .update_target(
            &resp.target.target_id,
            UpdateTargetRequest {
                box_count: Some(4),
                ..UpdateTargetRequest::default()
            },
        )
        .unwrap();

    let second = env.state.material_api.upsert_material_request(&ticket_id).unwrap();
    assert_eq!(second.outcome, UpsertOutcome::Updated);
    assert_eq!(second.request.request_id, first.request.request_id, "upsert 应沿用原申领单");
    let medium = &second.request.materials.items[0];
    assert_eq!(medium.quantity, Some(100.0));
    assert!(!medium.pending);
    assert_eq!(env.count("material_request"), 1);
}

#[test]
fn test_calculate_materials_is_side_effect_free() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let ticket = env.create_ticket(TicketPayload::Sub(SubPayload {
        parent_box_count: Some(2),
        child_box_count: Some(6),
        medium_type: None,
    }));

    let lines = env.state.material_api.calculate_materials(&ticket.ticket_id).unwrap();
    let trypsin = lines.iter().find(|m| m.name == "Trypsin").unwrap();
    assert_eq!(trypsin.quantity, Some(8.0));
    let medium = lines.iter().find(|m| m.name == "Medium").unwrap();
    assert_eq!(medium.quantity, Some(150.0));
    assert_eq!(env.count("material_request"), 0);
}

#[test]
fn test_collect_toggle_derives_status() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let ticket = env.create_ticket(aoi());
    let request = env.state.material_api.upsert_material_request(&ticket.ticket_id).unwrap().request;
    assert_eq!(request.materials.len(), 2);
    assert_eq!(request.status, MaterialRequestStatus::Pending);

    let api = &env.state.material_api;
    let r = api.set_material_collected(&request.request_id, 0, true).unwrap();
    assert_eq!(r.status, MaterialRequestStatus::Pending, "仍有未领取物料");

    let r = api.set_material_collected(&request.request_id, 1, true).unwrap();
    assert_eq!(r.status, MaterialRequestStatus::Prepared, "全部领取后应为 PREPARED");

    let r = api.set_material_collected(&request.request_id, 0, false).unwrap();
    assert_eq!(r.status, MaterialRequestStatus::Pending, "取消一项领取应回到 PENDING");

    let stored = api.get_material_request(&request.request_id).unwrap();
    assert!(!stored.materials.items[0].collected);
    assert!(stored.materials.items[1].collected);
    assert_eq!(stored.status, MaterialRequestStatus::Pending);
}

#[test]
fn test_recompute_resets_collected_flags() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let ticket = env.create_ticket(TicketPayload::CollectAndDiscard(CollectAndDiscardPayload::default()));
    let api = &env.state.material_api;

    let request = api.upsert_material_request(&ticket.ticket_id).unwrap().request;
    let r = api.set_material_collected(&request.request_id, 0, true).unwrap();
    assert_eq!(r.status, MaterialRequestStatus::Prepared);

    let again = api.upsert_material_request(&ticket.ticket_id).unwrap().request;
    assert!(!again.materials.items[0].collected, "整体重算应重置领取标记");
    assert_eq!(again.status, MaterialRequestStatus::Pending);
}

#[test]
fn test_cancelled_request_stays_cancelled() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let ticket = env.create_ticket(aoi());
    let api = &env.state.material_api;
    let request = api.upsert_material_request(&ticket.ticket_id).unwrap().request;

    let cancelled = api.cancel_material_request(&request.request_id).unwrap();
    assert_eq!(cancelled.status, MaterialRequestStatus::Cancelled);

    api.set_material_collected(&request.request_id, 0, true).unwrap();
    let r = api.set_material_collected(&request.request_id, 1, true).unwrap();
    assert_eq!(r.status, MaterialRequestStatus::Cancelled, "领取切换不应恢复已取消的申领单");
    assert!(r.materials.all_collected());

    let listed = api.list_material_requests(Some("CANCELLED")).unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn test_out_of_range_index_is_input_error() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let ticket = env.create_ticket(aoi());
    let api = &env.state.material_api;
    let request = api.upsert_material_request(&ticket.ticket_id).unwrap().request;

    let err = api.set_material_collected(&request.request_id, 2, true).unwrap_err();
    assert!(matches!(err, ApiError::MaterialIndexOutOfRange { index: 2, len: 2 }));
    assert!(err.is_validation());

    let err = api.set_material_collected("no-such-request", 0, true).unwrap_err();
    assert!(err.is_not_found(), "未知申领单应为未找到: {}", err);

    let stored = api.get_material_request(&request.request_id).unwrap();
    assert!(stored.materials.items.iter().all(|m| !m.collected));
}

#[test]
fn test_get_by_ticket_and_cascade_on_ticket_delete() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let ticket = env.create_ticket(aoi());
    let api = &env.state.material_api;

    assert!(api.get_material_request_by_ticket(&ticket.ticket_id).unwrap_err().is_not_found());
    let request = api.upsert_material_request(&ticket.ticket_id).unwrap().request;
    assert_eq!(
        api.get_material_request_by_ticket(&ticket.ticket_id).unwrap().request_id,
        request.request_id
    );

    env.state.ticket_api.delete_ticket(&ticket.ticket_id).unwrap();
    assert_eq!(env.count("material_request"), 0, "删除工单应级联删除申领单");
}

#[test]
fn test_batch_recalculation_counts_and_isolates_failures() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.create_target("T", "2025-01-01", "2025-01-03");
    env.create_ticket(aoi());

    let result = env.state.material_api.recalculate_all().unwrap();
    assert_eq!(result.total, 4);
    assert_eq!(result.processed, 4);
    assert_eq!(result.created, 4);
    assert_eq!(result.updated, 0);
    assert!(result.errors.is_empty());

    // 写入一条专属字段损坏的工单
    env.execute_sql(
        "INSERT INTO ticket (ticket_id, ticket_type, status, payload_json, created_at, updated_at)
         VALUES ('broken', 'AOI', 'OPEN', 'not-json', '2025-01-01 00:00:00.000000', '2025-01-01 00:00:00.000000');",
    );

    let result = env.state.material_api.recalculate_all().unwrap();
    assert_eq!(result.total, 5);
    assert_eq!(result.processed, 4, "单条失败不应中断批处理");
    assert_eq!(result.created, 0);
    assert_eq!(result.updated, 4);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].ticket_id, "broken");
    assert_eq!(env.count("material_request"), 4);
}

#[test]
fn test_recompute_keeps_cancelled_status() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let ticket = env.create_ticket(aoi());
    let api = &env.state.material_api;
    let request = api.upsert_material_request(&ticket.ticket_id).unwrap().request;
    api.cancel_material_request(&request.request_id).unwrap();

    let single = api.upsert_material_request(&ticket.ticket_id).unwrap();
    assert_eq!(single.outcome, UpsertOutcome::Updated);
    assert_eq!(single.request.status, MaterialRequestStatus::Cancelled, "单条重算不应恢复已取消的申领单");
    assert!(single.request.materials.items.iter().all(|m| !m.collected));

    let batch = api.recalculate_all().unwrap();
    assert_eq!(batch.updated, 1);
    let after = api.get_material_request(&request.request_id).unwrap();
    assert_eq!(after.status, MaterialRequestStatus::Cancelled, "批量重算不应恢复已取消的申领单");
}

#[test]
fn test_change_medium_uses_first_target_with_box_count() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let without_count = env.create_empty_target("无盒数").target;
    let with_count = env.create_empty_target("有盒数").target;
    env.state
        .target_api
        .update_target(
            &with_count.target_id,
            UpdateTargetRequest {
                box_count: Some(2),
                ..UpdateTargetRequest::default()
            },
        )
        .unwrap();

    let ticket = env.create_ticket(TicketPayload::ChangeMedium(ChangeMediumPayload {
        box_count: None,
        medium_type: None,
    }));
    let schedules = &env.state.schedule_api;
    schedules
        .create_schedule(schedule_request(&ticket.ticket_id, &without_count.target_id, "2025-04-01", None))
        .unwrap();
    schedules
        .create_schedule(schedule_request(&ticket.ticket_id, &with_count.target_id, "2025-04-02", None))
        .unwrap();

    let request = env.state.material_api.upsert_material_request(&ticket.ticket_id).unwrap().request;
    let medium = &request.materials.items[0];
    assert_eq!(medium.quantity, Some(50.0), "应回溯到首个配置了盒数的目标");
    assert!(!medium.pending);
}
