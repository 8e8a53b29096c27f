// ==========================================
// 细胞培养生产排程系统 - 生产目标领域模型
// ==========================================

use crate::domain::types::TargetStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionTarget - 生产目标
// ==========================================
// 一个多日生产批次，拥有一组按日排程的工单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTarget {
    pub target_id: String,
    pub name: String,
    pub material_type: Option<String>,           // 细胞/物料类型
    pub responsible_person: Option<String>,      // 负责人
    pub production_target_label: Option<String>, // 产量标签，如 "3L"
    pub start_culture_date: Option<NaiveDate>,   // 开始培养日期
    pub generation: Option<i32>,                 // 代次
    pub box_count: Option<u32>,                  // 配置盒数（换液物料的回退来源）
    pub expected_completion_date: NaiveDate,     // 预计完成日期（必填）
    pub status: TargetStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProductionTarget {
    pub fn is_planning(&self) -> bool {
        self.status == TargetStatus::Planning
    }
}

/// 目标下各状态排程数量（只读汇总）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProgress {
    pub target_id: String,
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}
