// ==========================================
// 细胞培养生产排程系统 - 工单排程数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 注意: 返回顺序仅为存储顺序，"谁是第一条"一律交给 engine::schedule_order 判定
// ==========================================

use crate::db::{date_column, format_date, format_time, format_timestamp, optional_time_column, timestamp_column};
use crate::domain::schedule::TicketSchedule;
use crate::domain::types::{SchedulePriority, ScheduleStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = r#"SELECT schedule_id, ticket_id, target_id, scheduled_date, scheduled_time,
       priority, status, created_at, updated_at
  FROM ticket_schedule"#;

// ==========================================
// ScheduleRepository - 工单排程仓储
// ==========================================
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
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

    pub fn insert_in(conn: &Connection, schedule: &TicketSchedule) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO ticket_schedule (
                schedule_id, ticket_id, target_id, scheduled_date, scheduled_time,
                priority, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &schedule.schedule_id,
                &schedule.ticket_id,
                &schedule.target_id,
                format_date(schedule.scheduled_date),
                schedule.scheduled_time.map(format_time),
                schedule.priority.to_db_str(),
                schedule.status.to_db_str(),
                format_timestamp(schedule.created_at),
                format_timestamp(schedule.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id_in(conn: &Connection, schedule_id: &str) -> RepositoryResult<Option<TicketSchedule>> {
        let sql = format!("{} WHERE schedule_id = ?", SELECT_COLUMNS);
        match conn.query_row(&sql, params![schedule_id], map_row) {
            Ok(schedule) => Ok(Some(schedule)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 目标下全部排程（未排序快照）
    pub fn list_by_target_in(conn: &Connection, target_id: &str) -> RepositoryResult<Vec<TicketSchedule>> {
        let sql = format!("{} WHERE target_id = ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(params![target_id], map_row)?
            .collect::<Result<Vec<TicketSchedule>, _>>()?;
        Ok(schedules)
    }

    /// 工单所属的排程（用于物料计算时回溯生产目标）
    pub fn list_by_ticket_in(conn: &Connection, ticket_id: &str) -> RepositoryResult<Vec<TicketSchedule>> {
        let sql = format!("{} WHERE ticket_id = ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(params![ticket_id], map_row)?
            .collect::<Result<Vec<TicketSchedule>, _>>()?;
        Ok(schedules)
    }

    /// (ticket_id, target_id, scheduled_date) 是否已存在
    pub fn exists_in(
        conn: &Connection,
        ticket_id: &str,
        target_id: &str,
        scheduled_date: NaiveDate,
    ) -> RepositoryResult<bool> {
        let count: i64 = conn.query_row(
            r#"SELECT COUNT(*) FROM ticket_schedule
               WHERE ticket_id = ? AND target_id = ? AND scheduled_date = ?"#,
            params![ticket_id, target_id, format_date(scheduled_date)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 整行更新可变字段（日期/时刻/优先级/状态）
    pub fn update_in(conn: &Connection, schedule: &TicketSchedule) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"UPDATE ticket_schedule
               SET scheduled_date = ?, scheduled_time = ?, priority = ?, status = ?, updated_at = ?
               WHERE schedule_id = ?"#,
            params![
                format_date(schedule.scheduled_date),
                schedule.scheduled_time.map(format_time),
                schedule.priority.to_db_str(),
                schedule.status.to_db_str(),
                format_timestamp(schedule.updated_at),
                &schedule.schedule_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("TicketSchedule", &schedule.schedule_id));
        }
        Ok(())
    }

    // ==========================================
    // 仓储接口
    // ==========================================

    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<TicketSchedule>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, schedule_id)
    }

    pub fn list_by_target(&self, target_id: &str) -> RepositoryResult<Vec<TicketSchedule>> {
        let conn = self.get_conn()?;
        Self::list_by_target_in(&conn, target_id)
    }

    /// 某日全部排程（跨目标，未排序快照）
    pub fn list_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<TicketSchedule>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE scheduled_date = ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(params![format_date(date)], map_row)?
            .collect::<Result<Vec<TicketSchedule>, _>>()?;
        Ok(schedules)
    }

    /// 删除排程（工单保留）
    pub fn delete(&self, schedule_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM ticket_schedule WHERE schedule_id = ?",
            params![schedule_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("TicketSchedule", schedule_id));
        }
        Ok(())
    }
}

/// 映射数据库行到TicketSchedule对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<TicketSchedule> {
    let priority_raw: String = row.get(5)?;
    let priority = priority_raw.parse::<SchedulePriority>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status_raw: String = row.get(6)?;
    let status = status_raw.parse::<ScheduleStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(TicketSchedule {
        schedule_id: row.get(0)?,
        ticket_id: row.get(1)?,
        target_id: row.get(2)?,
        scheduled_date: date_column(row, 3)?,
        scheduled_time: optional_time_column(row, 4)?,
        priority,
        status,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}
