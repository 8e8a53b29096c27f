// ==========================================
// 细胞培养生产排程系统 - 生产目标数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 删除目标依赖 ticket_schedule 的外键级联
// ==========================================

use crate::db::{date_column, format_date, format_timestamp, optional_date_column, timestamp_column};
use crate::domain::target::ProductionTarget;
use crate::domain::types::TargetStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = r#"SELECT target_id, name, material_type, responsible_person,
       production_target_label, start_culture_date, generation, box_count,
       expected_completion_date, status, created_at, updated_at
  FROM production_target"#;

// ==========================================
// TargetRepository - 生产目标仓储
// ==========================================
pub struct TargetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TargetRepository {
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

    pub fn insert_in(conn: &Connection, target: &ProductionTarget) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO production_target (
                target_id, name, material_type, responsible_person,
                production_target_label, start_culture_date, generation, box_count,
                expected_completion_date, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &target.target_id,
                &target.name,
                &target.material_type,
                &target.responsible_person,
                &target.production_target_label,
                target.start_culture_date.map(format_date),
                &target.generation,
                &target.box_count,
                format_date(target.expected_completion_date),
                target.status.to_db_str(),
                format_timestamp(target.created_at),
                format_timestamp(target.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id_in(conn: &Connection, target_id: &str) -> RepositoryResult<Option<ProductionTarget>> {
        let sql = format!("{} WHERE target_id = ?", SELECT_COLUMNS);
        match conn.query_row(&sql, params![target_id], map_row) {
            Ok(target) => Ok(Some(target)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 仅当当前状态为 PLANNING 时晋级为 IN_PROGRESS
    ///
    /// # 返回
    /// - `Ok(true)`: 本次调用完成了晋级
    /// - `Ok(false)`: 目标已不在 PLANNING（重复晋级是安全的空操作）
    pub fn promote_if_planning_in(
        conn: &Connection,
        target_id: &str,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let affected = conn.execute(
            "UPDATE production_target SET status = ?, updated_at = ? WHERE target_id = ? AND status = ?",
            params![
                TargetStatus::InProgress.to_db_str(),
                format_timestamp(updated_at),
                target_id,
                TargetStatus::Planning.to_db_str(),
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn update_status_in(
        conn: &Connection,
        target_id: &str,
        status: TargetStatus,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE production_target SET status = ?, updated_at = ? WHERE target_id = ?",
            params![status.to_db_str(), format_timestamp(updated_at), target_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ProductionTarget", target_id));
        }
        Ok(())
    }

    // ==========================================
    // 仓储接口
    // ==========================================

    pub fn find_by_id(&self, target_id: &str) -> RepositoryResult<Option<ProductionTarget>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, target_id)
    }

    /// 查询生产目标列表（可按状态过滤），按创建时间降序
    pub fn list(&self, status: Option<TargetStatus>) -> RepositoryResult<Vec<ProductionTarget>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "{} WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let targets = stmt
            .query_map(params![status.map(|s| s.to_db_str())], map_row)?
            .collect::<Result<Vec<ProductionTarget>, _>>()?;

        Ok(targets)
    }

    /// 更新描述性字段（不含状态，状态走独立流程）
    pub fn update_details(&self, target: &ProductionTarget) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"UPDATE production_target
               SET name = ?, material_type = ?, responsible_person = ?,
                   production_target_label = ?, start_culture_date = ?, generation = ?,
                   box_count = ?, expected_completion_date = ?, updated_at = ?
               WHERE target_id = ?"#,
            params![
                &target.name,
                &target.material_type,
                &target.responsible_person,
                &target.production_target_label,
                target.start_culture_date.map(format_date),
                &target.generation,
                &target.box_count,
                format_date(target.expected_completion_date),
                format_timestamp(target.updated_at),
                &target.target_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("ProductionTarget", &target.target_id));
        }
        Ok(())
    }

    /// 删除生产目标（级联删除其排程，工单保留）
    pub fn delete(&self, target_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM production_target WHERE target_id = ?",
            params![target_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("ProductionTarget", target_id));
        }
        Ok(())
    }
}

/// 映射数据库行到ProductionTarget对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ProductionTarget> {
    let status_raw: String = row.get(9)?;
    let status = status_raw.parse::<TargetStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ProductionTarget {
        target_id: row.get(0)?,
        name: row.get(1)?,
        material_type: row.get(2)?,
        responsible_person: row.get(3)?,
        production_target_label: row.get(4)?,
        start_culture_date: optional_date_column(row, 5)?,
        generation: row.get(6)?,
        box_count: row.get(7)?,
        expected_completion_date: date_column(row, 8)?,
        status,
        created_at: timestamp_column(row, 10)?,
        updated_at: timestamp_column(row, 11)?,
    })
}
