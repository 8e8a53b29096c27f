// ==========================================
// 细胞培养生产排程系统 - 领域类型定义
// ==========================================
// 序列化格式与数据库一致:
// - 工单类型沿用实验室惯用名 (Thaw / AOI / ChangeMedium ...)
// - 状态与优先级使用 SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 枚举字符串解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的{kind}取值: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ==========================================
// 工单类型 (Ticket Type)
// ==========================================
// 封闭集合，新增类型需同步物料清单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketType {
    Thaw,              // 复苏
    #[serde(rename = "AOI")]
    Aoi,               // 观察
    ChangeMedium,      // 换液
    Sub,               // 传代
    SubAndFreeze,      // 传代并冻存
    Freeze,            // 冻存
    CollectAndDiscard, // 收集与废弃
}

impl TicketType {
    pub const ALL: [TicketType; 7] = [
        TicketType::Thaw,
        TicketType::Aoi,
        TicketType::ChangeMedium,
        TicketType::Sub,
        TicketType::SubAndFreeze,
        TicketType::Freeze,
        TicketType::CollectAndDiscard,
    ];

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TicketType::Thaw => "Thaw",
            TicketType::Aoi => "AOI",
            TicketType::ChangeMedium => "ChangeMedium",
            TicketType::Sub => "Sub",
            TicketType::SubAndFreeze => "SubAndFreeze",
            TicketType::Freeze => "Freeze",
            TicketType::CollectAndDiscard => "CollectAndDiscard",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for TicketType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketType::ALL
            .iter()
            .copied()
            .find(|t| t.to_db_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("工单类型", s))
    }
}

// ==========================================
// 工单状态 (Ticket Status)
// ==========================================
// 与排程状态相互独立
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for TicketStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Ok(TicketStatus::Open),
            "CLOSED" => Ok(TicketStatus::Closed),
            _ => Err(ParseEnumError::new("工单状态", s)),
        }
    }
}

// ==========================================
// 生产目标状态 (Target Status)
// ==========================================
// PLANNING → IN_PROGRESS → COMPLETED
// CANCELLED 仅可由 PLANNING / IN_PROGRESS 进入
// 引擎只会自动执行 PLANNING → IN_PROGRESS，其余均为人工编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetStatus {
    Planning,   // 计划中
    InProgress, // 进行中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl TargetStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TargetStatus::Planning => "PLANNING",
            TargetStatus::InProgress => "IN_PROGRESS",
            TargetStatus::Completed => "COMPLETED",
            TargetStatus::Cancelled => "CANCELLED",
        }
    }

    /// 是否为合法迁移（同状态视为无变化，合法）
    pub fn can_transition_to(&self, next: TargetStatus) -> bool {
        use TargetStatus::*;
        matches!(
            (self, next),
            (Planning, Planning)
                | (InProgress, InProgress)
                | (Completed, Completed)
                | (Cancelled, Cancelled)
                | (Planning, InProgress)
                | (InProgress, Completed)
                | (Planning, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    /// 终态：不会再被自动流程改变
    pub fn is_terminal(&self) -> bool {
        matches!(self, TargetStatus::Completed | TargetStatus::Cancelled)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for TargetStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLANNING" => Ok(TargetStatus::Planning),
            "IN_PROGRESS" => Ok(TargetStatus::InProgress),
            "COMPLETED" => Ok(TargetStatus::Completed),
            "CANCELLED" => Ok(TargetStatus::Cancelled),
            _ => Err(ParseEnumError::new("生产目标状态", s)),
        }
    }
}

// ==========================================
// 排程状态 (Schedule Status)
// ==========================================
// OPEN → IN_PROGRESS → COMPLETED
// CANCELLED 仅可由 OPEN / IN_PROGRESS 进入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Open => "OPEN",
            ScheduleStatus::InProgress => "IN_PROGRESS",
            ScheduleStatus::Completed => "COMPLETED",
            ScheduleStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(&self, next: ScheduleStatus) -> bool {
        use ScheduleStatus::*;
        matches!(
            (self, next),
            (Open, Open)
                | (InProgress, InProgress)
                | (Completed, Completed)
                | (Cancelled, Cancelled)
                | (Open, InProgress)
                | (InProgress, Completed)
                | (Open, Cancelled)
                | (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Ok(ScheduleStatus::Open),
            "IN_PROGRESS" => Ok(ScheduleStatus::InProgress),
            "COMPLETED" => Ok(ScheduleStatus::Completed),
            "CANCELLED" => Ok(ScheduleStatus::Cancelled),
            _ => Err(ParseEnumError::new("排程状态", s)),
        }
    }
}

// ==========================================
// 排程优先级 (Schedule Priority)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulePriority {
    High,
    Medium,
    Low,
}

impl SchedulePriority {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SchedulePriority::High => "HIGH",
            SchedulePriority::Medium => "MEDIUM",
            SchedulePriority::Low => "LOW",
        }
    }
}

impl Default for SchedulePriority {
    fn default() -> Self {
        SchedulePriority::Medium
    }
}

impl fmt::Display for SchedulePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for SchedulePriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Ok(SchedulePriority::High),
            "MEDIUM" => Ok(SchedulePriority::Medium),
            "LOW" => Ok(SchedulePriority::Low),
            _ => Err(ParseEnumError::new("排程优先级", s)),
        }
    }
}

// ==========================================
// 物料申领状态 (Material Request Status)
// ==========================================
// PENDING ↔ PREPARED 由领取标记自动派生
// CANCELLED 仅人工设置，领取切换不会使其复活
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialRequestStatus {
    Pending,   // 待备料
    Prepared,  // 已备齐
    Cancelled, // 已取消
}

impl MaterialRequestStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MaterialRequestStatus::Pending => "PENDING",
            MaterialRequestStatus::Prepared => "PREPARED",
            MaterialRequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for MaterialRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for MaterialRequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(MaterialRequestStatus::Pending),
            "PREPARED" => Ok(MaterialRequestStatus::Prepared),
            "CANCELLED" => Ok(MaterialRequestStatus::Cancelled),
            _ => Err(ParseEnumError::new("物料申领状态", s)),
        }
    }
}
