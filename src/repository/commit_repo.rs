// ==========================================
// 托盘库存分配引擎 - 分配提交仓储
// ==========================================
// 职责: 在一个 SQLite 事务中完成
//   1) 托盘 revision 复核 + 可用量扣减
//   2) 运行头写入
//   3) 分配记录写入
// 红线: 任一步失败 → 整体回滚, 不落任何数据
// ==========================================

use crate::domain::allocation::AllocationRecord;
use crate::repository::allocation_repo::{AllocationRecordRepository, AllocationRunEntity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_repo::{InventoryRepository, PalletDrawDown};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct AllocationCommitRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationCommitRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 提交一次分配运行
    ///
    /// # 返回
    /// - Ok(record_count): 已提交
    /// - Err: 已回滚
    pub fn commit(
        &self,
        run: &AllocationRunEntity,
        records: &[AllocationRecord],
        draws: &[PalletDrawDown],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let pallets = InventoryRepository::apply_draw_down_tx(&tx, &run.warehouse_id, draws)?;
        AllocationRecordRepository::insert_run_tx(&tx, run)?;
        let count = AllocationRecordRepository::batch_insert_records_tx(&tx, &run.run_id, records)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(run_id = %run.run_id, pallets, records = count, "分配事务已提交");
        Ok(count)
    }
}
