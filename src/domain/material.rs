// ==========================================
// 细胞培养生产排程系统 - 物料申领领域模型
// ==========================================
// 物料清单以带版本号的 JSON 存储于 material_request.materials_json
// - v1: {"schema_version": 1, "items": [...]}
// - v0: 早期裸数组 [...]，读取时迁移为 v1
// ==========================================

use crate::domain::types::{MaterialRequestStatus, TicketType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 当前物料清单 schema 版本
pub const MATERIAL_LIST_SCHEMA_VERSION: u32 = 1;

// ==========================================
// MaterialLine - 单条物料需求
// ==========================================
// 不变量: pending == quantity.is_none()
// 数量未知时为 null，界面显示"待确定"，不得以 0 代替
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    pub quantity: Option<f64>,
    pub unit: String,
    #[serde(default)]
    pub collected: bool,
    #[serde(default)]
    pub pending: bool,
}

impl MaterialLine {
    /// 已知数量的物料
    pub fn known(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            material_type: None,
            spec: None,
            quantity: Some(quantity),
            unit: unit.to_string(),
            collected: false,
            pending: false,
        }
    }

    /// 由可缺省的数量构造；None 即"待确定"
    pub fn maybe(name: &str, quantity: Option<f64>, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            material_type: None,
            spec: None,
            pending: quantity.is_none(),
            quantity,
            unit: unit.to_string(),
            collected: false,
        }
    }

    pub fn with_type(mut self, material_type: Option<&str>) -> Self {
        self.material_type = material_type.map(str::to_string);
        self
    }

    pub fn with_spec(mut self, spec: Option<&str>) -> Self {
        self.spec = spec.map(str::to_string);
        self
    }
}

// ==========================================
// MaterialList - 带版本的物料清单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialList {
    pub schema_version: u32,
    pub items: Vec<MaterialLine>,
}

/// 反序列化兼容层
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMaterialList {
    Versioned {
        schema_version: u32,
        items: Vec<MaterialLine>,
    },
    Legacy(Vec<MaterialLine>),
}

impl<'de> Deserialize<'de> for MaterialList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let stored = StoredMaterialList::deserialize(deserializer)?;
        Ok(MaterialList::migrate(stored))
    }
}

impl MaterialList {
    pub fn new(items: Vec<MaterialLine>) -> Self {
        Self {
            schema_version: MATERIAL_LIST_SCHEMA_VERSION,
            items,
        }
    }

    fn migrate(stored: StoredMaterialList) -> Self {
        let (from_version, mut items) = match stored {
            StoredMaterialList::Versioned {
                schema_version,
                items,
            } => (schema_version, items),
            StoredMaterialList::Legacy(items) => (0, items),
        };

        // v0 没有 pending 字段，按数量是否缺失补齐
        if from_version < 1 {
            for item in items.iter_mut() {
                item.pending = item.quantity.is_none();
            }
        }

        Self::new(items)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 是否全部领取（空清单视为已全部领取）
    pub fn all_collected(&self) -> bool {
        self.items.iter().all(|m| m.collected)
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|m| m.pending).count()
    }
}

// ==========================================
// MaterialRequest - 物料申领单
// ==========================================
// 每张工单至多一条（upsert 语义）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequest {
    pub request_id: String,
    pub ticket_id: String,
    pub device_type: TicketType, // 计算时工单类型的快照
    pub status: MaterialRequestStatus,
    pub materials: MaterialList,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_quantity_serializes_as_null() {
        let line = MaterialLine::maybe("Medium", None, "ml");
        let json = serde_json::to_value(&line).unwrap();
        assert!(json["quantity"].is_null(), "未知数量必须为 null 而不是 0");
        assert_eq!(json["pending"], true);
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_legacy_bare_array_is_migrated() {
        let raw = r#"[
            {"name":"Medium","type":"DMEM","quantity":null,"unit":"ml","collected":false},
            {"name":"Recovery bottle","quantity":1,"unit":"pcs","collected":true}
        ]"#;
        let list = MaterialList::from_json(raw).unwrap();

        assert_eq!(list.schema_version, MATERIAL_LIST_SCHEMA_VERSION);
        assert_eq!(list.len(), 2);
        assert!(list.items[0].pending);
        assert_eq!(list.items[0].material_type.as_deref(), Some("DMEM"));
        assert!(!list.items[1].pending);
        assert!(list.items[1].collected);
    }

    #[test]
    fn test_versioned_json_keeps_flags() {
        let list = MaterialList::new(vec![MaterialLine::known("Trypsin", 8.0, "ml")]);
        let raw = list.to_json().unwrap();
        assert!(raw.contains("\"schema_version\":1"));

        let back = MaterialList::from_json(&raw).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_empty_list_counts_as_all_collected() {
        assert!(MaterialList::new(vec![]).all_collected());
    }
}
