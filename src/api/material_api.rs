// ==========================================
// 细胞培养生产排程系统 - 物料申领 API
// ==========================================
// 职责: 工单物料计算、申领单 upsert / 批量重算、领取切换、取消
// 规则:
// - upsert 整体替换清单，领取标记全部重置；CANCELLED 保持不变
// - 批量重算逐条独立，单条失败记录后继续
// - 领取切换后重算状态；CANCELLED 不会被切换恢复
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_optional_enum, require_id};
use crate::db::with_transaction;
use crate::domain::material::{MaterialLine, MaterialList, MaterialRequest};
use crate::domain::ticket::Ticket;
use crate::domain::types::MaterialRequestStatus;
use crate::engine::material_calculator::{CalculationContext, MaterialCalculator};
use crate::engine::requisition::RequisitionStatus;
use crate::engine::schedule_order::ScheduleOrder;
use crate::repository::{
    MaterialRequestRepository, ScheduleRepository, TargetRepository, TicketRepository, UpsertOutcome,
};

// ==========================================
// 响应结构
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMaterialRequestResponse {
    pub request: MaterialRequest,
    pub outcome: UpsertOutcome,
}

/// 单条重算失败
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecalcError {
    pub ticket_id: String,
    pub message: String,
}

/// 批量重算结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecalcResult {
    pub total: usize,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<BatchRecalcError>,
}

// ==========================================
// MaterialApi - 物料申领 API
// ==========================================
pub struct MaterialApi {
    conn: Arc<Mutex<Connection>>,
    ticket_repo: Arc<TicketRepository>,
    material_request_repo: Arc<MaterialRequestRepository>,
}

impl MaterialApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        ticket_repo: Arc<TicketRepository>,
        material_request_repo: Arc<MaterialRequestRepository>,
    ) -> Self {
        Self {
            conn,
            ticket_repo,
            material_request_repo,
        }
    }

    // ==========================================
    // 计算
    // ==========================================

    /// 计算工单物料清单（不落库）
    pub fn calculate_materials(&self, ticket_id: &str) -> ApiResult<Vec<MaterialLine>> {
        require_id("ticketId", ticket_id)?;
        with_transaction(&self.conn, |tx| {
            let ticket = load_ticket_in(tx, ticket_id)?;
            let ctx = calculation_context_in(tx, &ticket)?;
            Ok::<_, ApiError>(MaterialCalculator::calculate(&ticket.payload, &ctx))
        })
    }

    // ==========================================
    // 申领单写入
    // ==========================================

    pub fn upsert_material_request(&self, ticket_id: &str) -> ApiResult<UpsertMaterialRequestResponse> {
        self.upsert_material_request_at(ticket_id, Local::now().naive_local())
    }

    /// 计算并写入工单的物料申领单
    ///
    /// 已存在时沿用原申领单ID，清单整体替换、领取标记重置；已取消的申领单保持 CANCELLED
    pub fn upsert_material_request_at(
        &self,
        ticket_id: &str,
        now: NaiveDateTime,
    ) -> ApiResult<UpsertMaterialRequestResponse> {
        require_id("ticketId", ticket_id)?;

        let (request, outcome) = with_transaction(&self.conn, |tx| {
            let ticket = load_ticket_in(tx, ticket_id)?;
            let ctx = calculation_context_in(tx, &ticket)?;
            let materials = MaterialList::new(MaterialCalculator::calculate(&ticket.payload, &ctx));

            let status = match MaterialRequestRepository::find_by_ticket_in(tx, ticket_id)? {
                Some(existing) => RequisitionStatus::recompute(existing.status, &materials),
                None => RequisitionStatus::initial(&materials),
            };

            let candidate = MaterialRequest {
                request_id: Uuid::new_v4().to_string(),
                ticket_id: ticket.ticket_id.clone(),
                device_type: ticket.ticket_type(),
                status,
                materials,
                created_at: now,
                updated_at: now,
            };

            let outcome = MaterialRequestRepository::upsert_in(tx, &candidate)?;
            let stored = MaterialRequestRepository::find_by_ticket_in(tx, ticket_id)?
                .ok_or_else(|| ApiError::InternalError(format!("申领单写入后未找到: ticket={}", ticket_id)))?;
            Ok::<_, ApiError>((stored, outcome))
        })?;

        info!(
            ticket_id,
            request_id = %request.request_id,
            outcome = ?outcome,
            status = %request.status,
            pending = request.materials.pending_count(),
            "物料申领单已计算"
        );
        Ok(UpsertMaterialRequestResponse { request, outcome })
    }

    /// 对全部工单重算物料申领单
    ///
    /// 逐条处理，单条失败记入 errors 后继续
    pub fn recalculate_all(&self) -> ApiResult<BatchRecalcResult> {
        let ticket_ids = self.ticket_repo.list_ids()?;
        let now = Local::now().naive_local();

        let mut result = BatchRecalcResult {
            total: ticket_ids.len(),
            ..BatchRecalcResult::default()
        };

        for ticket_id in ticket_ids {
            match self.upsert_material_request_at(&ticket_id, now) {
                Ok(resp) => {
                    result.processed += 1;
                    match resp.outcome {
                        UpsertOutcome::Created => result.created += 1,
                        UpsertOutcome::Updated => result.updated += 1,
                    }
                }
                Err(e) => {
                    warn!(ticket_id = %ticket_id, error = %e, "物料重算失败，继续处理");
                    result.errors.push(BatchRecalcError {
                        ticket_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            total = result.total,
            processed = result.processed,
            created = result.created,
            updated = result.updated,
            failed = result.errors.len(),
            "批量物料重算完成"
        );
        Ok(result)
    }

    /// 设置单条物料的领取标记并重算申领状态
    pub fn set_material_collected(
        &self,
        request_id: &str,
        material_index: usize,
        collected: bool,
    ) -> ApiResult<MaterialRequest> {
        require_id("requestId", request_id)?;
        let now = Local::now().naive_local();

        let request = with_transaction(&self.conn, |tx| {
            let mut request = MaterialRequestRepository::find_by_id_in(tx, request_id)?
                .ok_or_else(|| ApiError::NotFound(format!("MaterialRequest(id={})不存在", request_id)))?;

            RequisitionStatus::set_collected(&mut request.materials, material_index, collected)?;
            request.status = RequisitionStatus::recompute(request.status, &request.materials);
            request.updated_at = now;

            MaterialRequestRepository::update_materials_in(
                tx,
                request_id,
                &request.materials,
                request.status,
                now,
            )?;
            Ok::<_, ApiError>(request)
        })?;

        info!(
            request_id,
            material_index,
            collected,
            status = %request.status,
            "物料领取标记已更新"
        );
        Ok(request)
    }

    /// 取消申领单（仅显式设置）
    pub fn cancel_material_request(&self, request_id: &str) -> ApiResult<MaterialRequest> {
        require_id("requestId", request_id)?;
        let now = Local::now().naive_local();

        let request = with_transaction(&self.conn, |tx| {
            let mut request = MaterialRequestRepository::find_by_id_in(tx, request_id)?
                .ok_or_else(|| ApiError::NotFound(format!("MaterialRequest(id={})不存在", request_id)))?;
            request.status = MaterialRequestStatus::Cancelled;
            request.updated_at = now;
            MaterialRequestRepository::update_materials_in(tx, request_id, &request.materials, request.status, now)?;
            Ok::<_, ApiError>(request)
        })?;

        info!(request_id, "物料申领单已取消");
        Ok(request)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_material_request(&self, request_id: &str) -> ApiResult<MaterialRequest> {
        require_id("requestId", request_id)?;
        self.material_request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| ApiError::NotFound(format!("MaterialRequest(id={})不存在", request_id)))
    }

    pub fn get_material_request_by_ticket(&self, ticket_id: &str) -> ApiResult<MaterialRequest> {
        require_id("ticketId", ticket_id)?;
        self.material_request_repo
            .find_by_ticket(ticket_id)?
            .ok_or_else(|| ApiError::NotFound(format!("工单{}尚无物料申领单", ticket_id)))
    }

    pub fn list_material_requests(&self, status: Option<&str>) -> ApiResult<Vec<MaterialRequest>> {
        let status: Option<MaterialRequestStatus> = parse_optional_enum("status", status)?;
        Ok(self.material_request_repo.list(status)?)
    }
}

fn load_ticket_in(conn: &Connection, ticket_id: &str) -> ApiResult<Ticket> {
    TicketRepository::find_by_id_in(conn, ticket_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Ticket(id={})不存在", ticket_id)))
}

/// 工单所属生产目标的配置盒数
///
/// 工单挂在多个目标下时，按规范顺序取第一条配置了盒数的目标
fn calculation_context_in(conn: &Connection, ticket: &Ticket) -> ApiResult<CalculationContext> {
    let schedules = ScheduleOrder::sorted(ScheduleRepository::list_by_ticket_in(conn, &ticket.ticket_id)?);
    for schedule in &schedules {
        if let Some(target) = TargetRepository::find_by_id_in(conn, &schedule.target_id)? {
            if target.box_count.is_some() {
                return Ok(CalculationContext {
                    target_box_count: target.box_count,
                });
            }
        }
    }
    Ok(CalculationContext::default())
}
