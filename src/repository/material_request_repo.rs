// ==========================================
// 细胞培养生产排程系统 - 物料申领单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（状态派生在 engine::requisition_status）
// 存储: materials_json 为带 schema_version 的结构化清单
// ==========================================

use crate::db::{format_timestamp, timestamp_column};
use crate::domain::material::{MaterialList, MaterialRequest};
use crate::domain::types::{MaterialRequestStatus, TicketType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = r#"SELECT request_id, ticket_id, device_type, status, materials_json,
       created_at, updated_at
  FROM material_request"#;

/// upsert 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

// ==========================================
// MaterialRequestRepository - 物料申领单仓储
// ==========================================
pub struct MaterialRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRequestRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 连接级操作
    // ==========================================

    pub fn find_by_id_in(conn: &Connection, request_id: &str) -> RepositoryResult<Option<MaterialRequest>> {
        let sql = format!("{} WHERE request_id = ?", SELECT_COLUMNS);
        match conn.query_row(&sql, params![request_id], map_row) {
            Ok(request) => Ok(Some(request)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_by_ticket_in(conn: &Connection, ticket_id: &str) -> RepositoryResult<Option<MaterialRequest>> {
        let sql = format!("{} WHERE ticket_id = ?", SELECT_COLUMNS);
        match conn.query_row(&sql, params![ticket_id], map_row) {
            Ok(request) => Ok(Some(request)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 ticket_id 插入或整体替换
    ///
    /// 已存在时沿用原 request_id / created_at，物料清单与状态整体覆盖
    pub fn upsert_in(conn: &Connection, request: &MaterialRequest) -> RepositoryResult<UpsertOutcome> {
        let materials_json = request.materials.to_json()?;

        let affected = conn.execute(
            r#"UPDATE material_request
               SET device_type = ?, status = ?, materials_json = ?, updated_at = ?
               WHERE ticket_id = ?"#,
            params![
                request.device_type.to_db_str(),
                request.status.to_db_str(),
                &materials_json,
                format_timestamp(request.updated_at),
                &request.ticket_id,
            ],
        )?;
        if affected > 0 {
            return Ok(UpsertOutcome::Updated);
        }

        conn.execute(
            r#"INSERT INTO material_request (
                request_id, ticket_id, device_type, status, materials_json, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &request.request_id,
                &request.ticket_id,
                request.device_type.to_db_str(),
                request.status.to_db_str(),
                &materials_json,
                format_timestamp(request.created_at),
                format_timestamp(request.updated_at),
            ],
        )?;
        Ok(UpsertOutcome::Created)
    }

    /// 更新物料清单与状态（领取切换）
    pub fn update_materials_in(
        conn: &Connection,
        request_id: &str,
        materials: &MaterialList,
        status: MaterialRequestStatus,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"UPDATE material_request
               SET materials_json = ?, status = ?, updated_at = ?
               WHERE request_id = ?"#,
            params![
                materials.to_json()?,
                status.to_db_str(),
                format_timestamp(updated_at),
                request_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("MaterialRequest", request_id));
        }
        Ok(())
    }

    // ==========================================
    // 仓储接口
    // ==========================================

    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<MaterialRequest>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, request_id)
    }

    pub fn find_by_ticket(&self, ticket_id: &str) -> RepositoryResult<Option<MaterialRequest>> {
        let conn = self.get_conn()?;
        Self::find_by_ticket_in(&conn, ticket_id)
    }

    pub fn list(&self, status: Option<MaterialRequestStatus>) -> RepositoryResult<Vec<MaterialRequest>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE (?1 IS NULL OR status = ?1) ORDER BY updated_at DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let requests = stmt
            .query_map(params![status.map(|s| s.to_db_str())], map_row)?
            .collect::<Result<Vec<MaterialRequest>, _>>()?;
        Ok(requests)
    }
}

/// 映射数据库行到MaterialRequest对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<MaterialRequest> {
    let device_raw: String = row.get(2)?;
    let device_type = device_raw.parse::<TicketType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status_raw: String = row.get(3)?;
    let status = status_raw.parse::<MaterialRequestStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let materials_raw: String = row.get(4)?;
    let materials = MaterialList::from_json(&materials_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(MaterialRequest {
        request_id: row.get(0)?,
        ticket_id: row.get(1)?,
        device_type,
        status,
        materials,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}
