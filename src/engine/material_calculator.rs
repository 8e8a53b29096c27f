// ==========================================
// 细胞培养生产排程系统 - 物料需求计算引擎
// ==========================================
// 职责: 工单类型 + 专属字段 → 物料清单
// 规则:
// - 每种工单类型有固定的物料清单（顺序固定）
// - 数量为计数字段的线性函数，或固定常量
// - 计数字段缺失时仍输出该物料: quantity=null, pending=true（不得省略，不得写 0）
// - 换液工单的盒数缺失时回退到生产目标的配置盒数
// 红线: 纯函数，无 I/O
// ==========================================

use crate::domain::material::MaterialLine;
use crate::domain::ticket::{
    AoiPayload, ChangeMediumPayload, CollectAndDiscardPayload, FreezePayload, SubAndFreezePayload,
    SubPayload, ThawPayload, TicketPayload,
};

// ===== 单位用量 =====
pub const MEDIUM_ML_PER_BOX: f64 = 25.0;
pub const TRYPSIN_ML_PER_PARENT_BOX: f64 = 4.0;
pub const DPBS_ML_PER_PARENT_BOX: f64 = 10.0;
pub const CRYO_MEDIUM_ML_PER_TUBE: f64 = 1.5;
pub const THAW_WASH_MEDIUM_ML_PER_TUBE: f64 = 9.0;

// ===== 固定数量 =====
pub const PYRAMID_RACKS_LIGHT: f64 = 2.0; // 复苏/观察/冻存
pub const PYRAMID_RACKS_HEAVY: f64 = 3.0; // 换液/传代
pub const RECOVERY_BOTTLES: f64 = 1.0;
pub const FREEZING_CONTAINERS: f64 = 1.0;
pub const ALCOHOL_BOTTLES: f64 = 1.0;

// ===== 物料名称 =====
pub const MEDIUM: &str = "Medium";
pub const TRYPSIN: &str = "Trypsin";
pub const DPBS: &str = "DPBS";
pub const CRYO_MEDIUM: &str = "Cryopreservation medium";
pub const CRYO_TUBE: &str = "Cryo tube";
pub const CULTURE_BOX: &str = "Culture box";
pub const CENTRIFUGE_TUBE: &str = "Centrifuge tube";
pub const SEROLOGICAL_PIPETTE: &str = "Serological pipette";
pub const PYRAMID_RACK: &str = "Pyramid rack";
pub const FREEZING_CONTAINER: &str = "Freezing container";
pub const RECOVERY_BOTTLE: &str = "Recovery bottle";
pub const ALCOHOL_75: &str = "75% alcohol";

/// 计算所需的外部上下文
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculationContext {
    /// 工单所属生产目标的配置盒数
    pub target_box_count: Option<u32>,
}

/// 线性用量；计数缺失即未知
fn per_unit(count: Option<u32>, rate: f64) -> Option<f64> {
    count.map(|c| f64::from(c) * rate)
}

fn count_of(count: Option<u32>) -> Option<f64> {
    count.map(f64::from)
}

// ==========================================
// MaterialCalculator
// ==========================================
pub struct MaterialCalculator;

impl MaterialCalculator {
    /// 计算工单的物料清单
    pub fn calculate(payload: &TicketPayload, ctx: &CalculationContext) -> Vec<MaterialLine> {
        match payload {
            TicketPayload::Thaw(p) => Self::thaw(p),
            TicketPayload::Aoi(p) => Self::aoi(p),
            TicketPayload::ChangeMedium(p) => Self::change_medium(p, ctx),
            TicketPayload::Sub(p) => Self::sub(p),
            TicketPayload::SubAndFreeze(p) => Self::sub_and_freeze(p),
            TicketPayload::Freeze(p) => Self::freeze(p),
            TicketPayload::CollectAndDiscard(p) => Self::collect_and_discard(p),
        }
    }

    fn thaw(p: &ThawPayload) -> Vec<MaterialLine> {
        let medium_type = p.medium_type.as_deref();
        vec![
            MaterialLine::maybe(MEDIUM, per_unit(p.box_count, MEDIUM_ML_PER_BOX), "ml")
                .with_type(medium_type),
            MaterialLine::maybe(
                "Wash medium",
                per_unit(p.tube_count, THAW_WASH_MEDIUM_ML_PER_TUBE),
                "ml",
            )
            .with_type(medium_type),
            MaterialLine::maybe(CENTRIFUGE_TUBE, count_of(p.tube_count), "pcs").with_spec(Some("15 ml")),
            MaterialLine::maybe(CULTURE_BOX, count_of(p.box_count), "pcs"),
            MaterialLine::known(PYRAMID_RACK, PYRAMID_RACKS_LIGHT, "pcs"),
        ]
    }

    // 观察只需固定耗材
    fn aoi(_p: &AoiPayload) -> Vec<MaterialLine> {
        vec![
            MaterialLine::known(PYRAMID_RACK, PYRAMID_RACKS_LIGHT, "pcs"),
            MaterialLine::known(ALCOHOL_75, ALCOHOL_BOTTLES, "bottle"),
        ]
    }

    fn change_medium(p: &ChangeMediumPayload, ctx: &CalculationContext) -> Vec<MaterialLine> {
        let box_count = p.box_count.or(ctx.target_box_count);
        vec![
            MaterialLine::maybe(MEDIUM, per_unit(box_count, MEDIUM_ML_PER_BOX), "ml")
                .with_type(p.medium_type.as_deref()),
            MaterialLine::maybe(SEROLOGICAL_PIPETTE, count_of(box_count), "pcs").with_spec(Some("25 ml")),
            MaterialLine::known(PYRAMID_RACK, PYRAMID_RACKS_HEAVY, "pcs"),
        ]
    }

    fn sub(p: &SubPayload) -> Vec<MaterialLine> {
        vec![
            MaterialLine::maybe(TRYPSIN, per_unit(p.parent_box_count, TRYPSIN_ML_PER_PARENT_BOX), "ml"),
            MaterialLine::maybe(DPBS, per_unit(p.parent_box_count, DPBS_ML_PER_PARENT_BOX), "ml"),
            MaterialLine::maybe(MEDIUM, per_unit(p.child_box_count, MEDIUM_ML_PER_BOX), "ml")
                .with_type(p.medium_type.as_deref()),
            MaterialLine::maybe(CULTURE_BOX, count_of(p.child_box_count), "pcs"),
            MaterialLine::maybe(CENTRIFUGE_TUBE, count_of(p.parent_box_count), "pcs").with_spec(Some("15 ml")),
            MaterialLine::known(PYRAMID_RACK, PYRAMID_RACKS_HEAVY, "pcs"),
        ]
    }

    fn sub_and_freeze(p: &SubAndFreezePayload) -> Vec<MaterialLine> {
        vec![
            MaterialLine::maybe(TRYPSIN, per_unit(p.parent_box_count, TRYPSIN_ML_PER_PARENT_BOX), "ml"),
            MaterialLine::maybe(DPBS, per_unit(p.parent_box_count, DPBS_ML_PER_PARENT_BOX), "ml"),
            MaterialLine::maybe(MEDIUM, per_unit(p.child_box_count, MEDIUM_ML_PER_BOX), "ml")
                .with_type(p.medium_type.as_deref()),
            MaterialLine::maybe(CULTURE_BOX, count_of(p.child_box_count), "pcs"),
            MaterialLine::maybe(CRYO_MEDIUM, per_unit(p.tube_count, CRYO_MEDIUM_ML_PER_TUBE), "ml"),
            MaterialLine::maybe(CRYO_TUBE, count_of(p.tube_count), "pcs").with_spec(p.tube_spec.as_deref()),
            MaterialLine::known(FREEZING_CONTAINER, FREEZING_CONTAINERS, "pcs"),
            MaterialLine::known(PYRAMID_RACK, PYRAMID_RACKS_HEAVY, "pcs"),
        ]
    }

    fn freeze(p: &FreezePayload) -> Vec<MaterialLine> {
        vec![
            MaterialLine::maybe(TRYPSIN, per_unit(p.box_count, TRYPSIN_ML_PER_PARENT_BOX), "ml"),
            MaterialLine::maybe(DPBS, per_unit(p.box_count, DPBS_ML_PER_PARENT_BOX), "ml"),
            MaterialLine::maybe(CRYO_MEDIUM, per_unit(p.tube_count, CRYO_MEDIUM_ML_PER_TUBE), "ml"),
            MaterialLine::maybe(CRYO_TUBE, count_of(p.tube_count), "pcs").with_spec(p.tube_spec.as_deref()),
            MaterialLine::known(FREEZING_CONTAINER, FREEZING_CONTAINERS, "pcs"),
            MaterialLine::known(PYRAMID_RACK, PYRAMID_RACKS_LIGHT, "pcs"),
        ]
    }

    fn collect_and_discard(_p: &CollectAndDiscardPayload) -> Vec<MaterialLine> {
        vec![MaterialLine::known(RECOVERY_BOTTLE, RECOVERY_BOTTLES, "bottle")]
    }
}
