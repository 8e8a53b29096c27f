// ==========================================
// 细胞培养生产排程系统 - 工单领域模型
// ==========================================
// 工单字段按类型建模为带标签的联合体:
// 每种工单只携带与其类型相关的字段，物料计算按类型穷尽匹配
// ==========================================

use crate::domain::types::{TicketStatus, TicketType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// 各类型工单的专属字段
// ==========================================
// 所有计数字段均可缺省：排程生成时尚未知晓，由现场补录

/// 复苏
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThawPayload {
    pub tube_count: Option<u32>,      // 复苏冻存管数
    pub box_count: Option<u32>,       // 接种培养盒数
    pub medium_type: Option<String>,  // 培养基类型
}

/// 观察 (AOI)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiPayload {
    pub box_count: Option<u32>,
}

/// 换液
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeMediumPayload {
    pub box_count: Option<u32>,       // 缺省时回退到生产目标的盒数
    pub medium_type: Option<String>,
}

/// 传代
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPayload {
    pub parent_box_count: Option<u32>, // 母代盒数
    pub child_box_count: Option<u32>,  // 子代盒数
    pub medium_type: Option<String>,
}

/// 传代并冻存
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubAndFreezePayload {
    pub parent_box_count: Option<u32>,
    pub child_box_count: Option<u32>,
    pub tube_count: Option<u32>,       // 冻存管数
    pub tube_spec: Option<String>,     // 冻存管规格
    pub medium_type: Option<String>,
}

/// 冻存
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezePayload {
    pub box_count: Option<u32>,
    pub tube_count: Option<u32>,
    pub tube_spec: Option<String>,
}

/// 收集与废弃
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectAndDiscardPayload {
    pub box_count: Option<u32>,
}

// ==========================================
// TicketPayload - 工单类型 + 专属字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "fields")]
pub enum TicketPayload {
    Thaw(ThawPayload),
    #[serde(rename = "AOI")]
    Aoi(AoiPayload),
    ChangeMedium(ChangeMediumPayload),
    Sub(SubPayload),
    SubAndFreeze(SubAndFreezePayload),
    Freeze(FreezePayload),
    CollectAndDiscard(CollectAndDiscardPayload),
}

impl TicketPayload {
    /// 构造某类型的空字段工单（排程生成使用）
    pub fn empty(ticket_type: TicketType) -> Self {
        match ticket_type {
            TicketType::Thaw => TicketPayload::Thaw(ThawPayload::default()),
            TicketType::Aoi => TicketPayload::Aoi(AoiPayload::default()),
            TicketType::ChangeMedium => TicketPayload::ChangeMedium(ChangeMediumPayload::default()),
            TicketType::Sub => TicketPayload::Sub(SubPayload::default()),
            TicketType::SubAndFreeze => TicketPayload::SubAndFreeze(SubAndFreezePayload::default()),
            TicketType::Freeze => TicketPayload::Freeze(FreezePayload::default()),
            TicketType::CollectAndDiscard => {
                TicketPayload::CollectAndDiscard(CollectAndDiscardPayload::default())
            }
        }
    }

    pub fn ticket_type(&self) -> TicketType {
        match self {
            TicketPayload::Thaw(_) => TicketType::Thaw,
            TicketPayload::Aoi(_) => TicketType::Aoi,
            TicketPayload::ChangeMedium(_) => TicketType::ChangeMedium,
            TicketPayload::Sub(_) => TicketType::Sub,
            TicketPayload::SubAndFreeze(_) => TicketType::SubAndFreeze,
            TicketPayload::Freeze(_) => TicketType::Freeze,
            TicketPayload::CollectAndDiscard(_) => TicketType::CollectAndDiscard,
        }
    }
}

// ==========================================
// Ticket - 工单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub payload: TicketPayload,
    pub status: TicketStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Ticket {
    pub fn ticket_type(&self) -> TicketType {
        self.payload.ticket_type()
    }
}
