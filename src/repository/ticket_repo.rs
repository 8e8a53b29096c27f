// ==========================================
// 细胞培养生产排程系统 - 工单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: *_in 系列函数接收任意连接（含事务），供服务层组合事务使用
// ==========================================

use crate::db::{format_timestamp, timestamp_column};
use crate::domain::ticket::{Ticket, TicketPayload};
use crate::domain::types::{TicketStatus, TicketType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str =
    "SELECT ticket_id, ticket_type, status, payload_json, notes, created_at, updated_at FROM ticket";

// ==========================================
// TicketRepository - 工单仓储
// ==========================================
pub struct TicketRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TicketRepository {
    /// 创建新的TicketRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 连接级操作
    // ==========================================

    /// 插入工单
    pub fn insert_in(conn: &Connection, ticket: &Ticket) -> RepositoryResult<()> {
        let payload_json = serde_json::to_string(&ticket.payload)?;

        conn.execute(
            r#"INSERT INTO ticket (
                ticket_id, ticket_type, status, payload_json, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &ticket.ticket_id,
                ticket.ticket_type().to_db_str(),
                ticket.status.to_db_str(),
                payload_json,
                &ticket.notes,
                format_timestamp(ticket.created_at),
                format_timestamp(ticket.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按 ticket_id 查询
    pub fn find_by_id_in(conn: &Connection, ticket_id: &str) -> RepositoryResult<Option<Ticket>> {
        let sql = format!("{} WHERE ticket_id = ?", SELECT_COLUMNS);
        match conn.query_row(&sql, params![ticket_id], map_row) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================
    // 仓储接口
    // ==========================================

    pub fn insert(&self, ticket: &Ticket) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, ticket)?;
        Ok(ticket.ticket_id.clone())
    }

    pub fn find_by_id(&self, ticket_id: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, ticket_id)
    }

    /// 查询工单列表
    ///
    /// # 参数
    /// - `ticket_type`: 可选类型过滤
    /// - `status`: 可选状态过滤
    ///
    /// # 返回
    /// 按 created_at 升序
    pub fn list(
        &self,
        ticket_type: Option<TicketType>,
        status: Option<TicketStatus>,
    ) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "{} WHERE (?1 IS NULL OR ticket_type = ?1) AND (?2 IS NULL OR status = ?2) \
             ORDER BY created_at ASC, ticket_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let tickets = stmt
            .query_map(
                params![
                    ticket_type.map(|t| t.to_db_str()),
                    status.map(|s| s.to_db_str())
                ],
                map_row,
            )?
            .collect::<Result<Vec<Ticket>, _>>()?;

        Ok(tickets)
    }

    /// 列出全部工单ID（批量重算物料使用，逐条加载以隔离单条失败）
    pub fn list_ids(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT ticket_id FROM ticket ORDER BY created_at ASC, ticket_id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// 替换工单专属字段（允许改变类型）
    pub fn update_payload(
        &self,
        ticket_id: &str,
        payload: &TicketPayload,
        notes: Option<&str>,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let payload_json = serde_json::to_string(payload)?;

        let affected = conn.execute(
            r#"UPDATE ticket
               SET ticket_type = ?, payload_json = ?, notes = COALESCE(?, notes), updated_at = ?
               WHERE ticket_id = ?"#,
            params![
                payload.ticket_type().to_db_str(),
                payload_json,
                notes,
                format_timestamp(updated_at),
                ticket_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Ticket", ticket_id));
        }
        Ok(())
    }

    pub fn update_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE ticket SET status = ?, updated_at = ? WHERE ticket_id = ?",
            params![status.to_db_str(), format_timestamp(updated_at), ticket_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Ticket", ticket_id));
        }
        Ok(())
    }

    /// 删除工单（级联删除其排程与物料申领单）
    pub fn delete(&self, ticket_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM ticket WHERE ticket_id = ?", params![ticket_id])?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Ticket", ticket_id));
        }
        Ok(())
    }
}

/// 映射数据库行到Ticket对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
    let payload_raw: String = row.get(3)?;
    let payload: TicketPayload = serde_json::from_str(&payload_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status_raw: String = row.get(2)?;
    let status = status_raw.parse::<TicketStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Ticket {
        ticket_id: row.get(0)?,
        payload,
        status,
        notes: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}
