// ==========================================
// 细胞培养生产排程系统 - 工单 API
// ==========================================
// 职责: 工单增删改查（类型标签 + 类型专属字段）
// 说明: 工单状态 OPEN/CLOSED 与排程状态相互独立
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_enum, parse_optional_enum, require_id};
use crate::domain::ticket::{Ticket, TicketPayload};
use crate::domain::types::{TicketStatus, TicketType};
use crate::repository::TicketRepository;

/// 新建工单请求
///
/// payload 形如 `{"type": "ChangeMedium", "fields": {"box_count": 4}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub payload: TicketPayload,
    #[serde(default)]
    pub notes: Option<String>,
}

/// 更新工单请求（整体替换专属字段，允许更换类型）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub payload: TicketPayload,
    #[serde(default)]
    pub notes: Option<String>,
}

// ==========================================
// TicketApi - 工单 API
// ==========================================
pub struct TicketApi {
    ticket_repo: Arc<TicketRepository>,
}

impl TicketApi {
    pub fn new(ticket_repo: Arc<TicketRepository>) -> Self {
        Self { ticket_repo }
    }

    pub fn create_ticket(&self, req: CreateTicketRequest) -> ApiResult<Ticket> {
        self.create_ticket_at(req, Local::now().naive_local())
    }

    /// 按指定时刻新建工单
    pub fn create_ticket_at(&self, req: CreateTicketRequest, now: NaiveDateTime) -> ApiResult<Ticket> {
        let ticket = Ticket {
            ticket_id: Uuid::new_v4().to_string(),
            payload: req.payload,
            status: TicketStatus::Open,
            notes: req.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        self.ticket_repo.insert(&ticket)?;
        info!(ticket_id = %ticket.ticket_id, ticket_type = %ticket.ticket_type(), "工单已创建");
        Ok(ticket)
    }

    pub fn get_ticket(&self, ticket_id: &str) -> ApiResult<Ticket> {
        require_id("ticketId", ticket_id)?;
        self.ticket_repo
            .find_by_id(ticket_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Ticket(id={})不存在", ticket_id)))
    }

    /// 查询工单列表
    ///
    /// # 参数
    /// - ticket_type: 可选类型过滤（如 "AOI"）
    /// - status: 可选状态过滤（OPEN/CLOSED）
    pub fn list_tickets(&self, ticket_type: Option<&str>, status: Option<&str>) -> ApiResult<Vec<Ticket>> {
        let ticket_type: Option<TicketType> = parse_optional_enum("type", ticket_type)?;
        let status: Option<TicketStatus> = parse_optional_enum("status", status)?;
        Ok(self.ticket_repo.list(ticket_type, status)?)
    }

    pub fn update_ticket(&self, ticket_id: &str, req: UpdateTicketRequest) -> ApiResult<Ticket> {
        require_id("ticketId", ticket_id)?;
        let now = Local::now().naive_local();
        self.ticket_repo
            .update_payload(ticket_id, &req.payload, req.notes.as_deref(), now)?;
        self.get_ticket(ticket_id)
    }

    pub fn set_ticket_status(&self, ticket_id: &str, status: &str) -> ApiResult<Ticket> {
        require_id("ticketId", ticket_id)?;
        let status: TicketStatus = parse_enum("status", status)?;
        self.ticket_repo
            .update_status(ticket_id, status, Local::now().naive_local())?;
        info!(ticket_id, status = %status, "工单状态已更新");
        self.get_ticket(ticket_id)
    }

    /// 删除工单（其排程与物料申领单随之删除）
    pub fn delete_ticket(&self, ticket_id: &str) -> ApiResult<()> {
        require_id("ticketId", ticket_id)?;
        self.ticket_repo.delete(ticket_id)?;
        info!(ticket_id, "工单已删除");
        Ok(())
    }
}
