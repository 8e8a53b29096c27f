// ==========================================
// 细胞培养生产排程系统 - 物料申领状态派生
// ==========================================
// 规则:
// - 全部物料已领取 → PREPARED；任一未领取 → PENDING
// - CANCELLED 只能人工设置，领取切换不会使其复活
// - 空清单视为"全部已领取"（没有需要准备的东西），直接为 PREPARED
// 红线: 纯函数，无 I/O
// ==========================================

use crate::domain::material::MaterialList;
use crate::domain::types::MaterialRequestStatus;
use thiserror::Error;

/// 物料下标越界
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("物料下标越界: index={index}, len={len}")]
pub struct MaterialIndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

pub struct RequisitionStatus;

impl RequisitionStatus {
    /// 新计算（或整体重算）清单的初始状态
    pub fn initial(materials: &MaterialList) -> MaterialRequestStatus {
        if materials.all_collected() {
            MaterialRequestStatus::Prepared
        } else {
            MaterialRequestStatus::Pending
        }
    }

    /// 领取切换后的状态重算
    pub fn recompute(current: MaterialRequestStatus, materials: &MaterialList) -> MaterialRequestStatus {
        match current {
            MaterialRequestStatus::Cancelled => MaterialRequestStatus::Cancelled,
            MaterialRequestStatus::Pending | MaterialRequestStatus::Prepared => Self::initial(materials),
        }
    }

    /// 设置单条物料的领取标记
    pub fn set_collected(
        materials: &mut MaterialList,
        index: usize,
        collected: bool,
    ) -> Result<(), MaterialIndexOutOfRange> {
        let len = materials.len();
        let line = materials
            .items
            .get_mut(index)
            .ok_or(MaterialIndexOutOfRange { index, len })?;
        line.collected = collected;
        Ok(())
    }
}
