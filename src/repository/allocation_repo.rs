// ==========================================
// 托盘库存分配引擎 - 分配记录仓储
// ==========================================
// 职责: allocation_run / allocation_record 表的写入与查询
// 红线: Repository 不含业务逻辑
// 红线: 分配记录只追加, 不提供更新
// ==========================================

use crate::domain::allocation::AllocationRecord;
use crate::domain::types::{AllocationStrategy, RunStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// AllocationRunEntity - 分配运行头
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRunEntity {
    pub run_id: String,
    pub warehouse_id: String,
    pub reference_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub status: RunStatus,
    /// AllocationSummary JSON
    pub summary_json: String,
    /// 提交时的 config_kv 快照
    pub config_snapshot_json: Option<String>,
}

// ==========================================
// AllocationRecordRepository
// ==========================================
pub struct AllocationRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中写入运行头
    pub fn insert_run_tx(tx: &Transaction, run: &AllocationRunEntity) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO allocation_run (
                run_id, warehouse_id, reference_date, created_at,
                status, summary_json, config_snapshot_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                run.run_id,
                run.warehouse_id,
                run.reference_date,
                run.created_at,
                run.status.to_string(),
                run.summary_json,
                run.config_snapshot_json,
            ],
        )?;
        Ok(())
    }

    /// 在事务中批量写入分配记录 (seq_no 从 1 开始, 保持输入顺序)
    pub fn batch_insert_records_tx(
        tx: &Transaction,
        run_id: &str,
        records: &[AllocationRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO allocation_record (
                run_id, seq_no, demand_line_id, order_id, item_id, item_code,
                batch_number, expiry_date, manufacturing_date,
                location_id, pallet_id, allocated_quantity, strategy
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )?;

        let mut count = 0;
        for (index, record) in records.iter().enumerate() {
            stmt.execute(params![
                run_id,
                (index + 1) as i64,
                record.demand_line_id,
                record.order_id,
                record.item_id,
                record.item_code,
                record.batch_number,
                record.expiry_date,
                record.manufacturing_date,
                record.location_id,
                record.pallet_id,
                record.allocated_quantity,
                record.strategy.as_str(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 按运行ID查询运行头
    pub fn find_run(&self, run_id: &str) -> RepositoryResult<Option<AllocationRunEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT run_id, warehouse_id, reference_date, created_at,
                   status, summary_json, config_snapshot_json
            FROM allocation_run
            WHERE run_id = ?1
            "#,
        )?;

        let result = stmt
            .query_row(params![run_id], |row| {
                let status: String = row.get(4)?;
                Ok(AllocationRunEntity {
                    run_id: row.get(0)?,
                    warehouse_id: row.get(1)?,
                    reference_date: row.get(2)?,
                    created_at: row.get(3)?,
                    status: parse_run_status(&status),
                    summary_json: row.get(5)?,
                    config_snapshot_json: row.get(6)?,
                })
            })
            .optional()?;

        Ok(result)
    }

    /// 按运行ID查询分配记录 (seq_no 顺序)
    pub fn find_records_by_run(&self, run_id: &str) -> RepositoryResult<Vec<AllocationRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT demand_line_id, order_id, item_id, item_code,
                   batch_number, expiry_date, manufacturing_date,
                   location_id, pallet_id, allocated_quantity, strategy
            FROM allocation_record
            WHERE run_id = ?1
            ORDER BY seq_no
            "#,
        )?;

        let records = stmt
            .query_map(params![run_id], map_record_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn parse_run_status(raw: &str) -> RunStatus {
    match raw.trim() {
        "COMMITTED" => RunStatus::Committed,
        _ => RunStatus::Rejected,
    }
}

fn map_record_row(row: &rusqlite::Row) -> rusqlite::Result<AllocationRecord> {
    let strategy: String = row.get(10)?;
    Ok(AllocationRecord {
        demand_line_id: row.get(0)?,
        order_id: row.get(1)?,
        item_id: row.get(2)?,
        item_code: row.get(3)?,
        batch_number: row.get(4)?,
        expiry_date: row.get(5)?,
        manufacturing_date: row.get(6)?,
        location_id: row.get(7)?,
        pallet_id: row.get(8)?,
        allocated_quantity: row.get(9)?,
        strategy: strategy
            .parse::<AllocationStrategy>()
            .unwrap_or(AllocationStrategy::Fifo),
    })
}
