// ==========================================
// 托盘库存分配引擎 - 库存数据仓储
// ==========================================
// 职责: inventory_unit 表的快照读取、导入写入、提交扣减
// 红线: Repository 不含业务逻辑 (分配规则在引擎层)
// 并发: 扣减按 revision 做乐观校验, 冲突即整体回滚
// ==========================================

use crate::domain::inventory::InventoryUnit;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};

/// 浮点扣减容差
const DRAW_DOWN_EPSILON: f64 = 1e-9;

// ==========================================
// StoredInventoryUnit - 带版本号的库存行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct StoredInventoryUnit {
    pub warehouse_id: String,
    pub unit: InventoryUnit,
    pub revision: i64,
}

// ==========================================
// PalletDrawDown - 单托盘扣减指令
// ==========================================
// 同一托盘在一次提交中只出现一次 (数量已合并)
#[derive(Debug, Clone, PartialEq)]
pub struct PalletDrawDown {
    pub pallet_id: String,
    pub item_id: String,
    pub batch_number: Option<String>,
    pub location_id: String,
    pub quantity: f64,
    /// 快照读取时的 revision
    pub expected_revision: i64,
}

// ==========================================
// InventoryRepository - 库存仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量写入库存 (导入用, 同主键覆盖并递增 revision)
    pub fn upsert_units(&self, warehouse_id: &str, units: &[InventoryUnit]) -> RepositoryResult<usize> {
        if units.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO inventory_unit (
                    warehouse_id, pallet_id, item_id, item_code, batch_number,
                    manufacturing_date, expiry_date, location_id,
                    on_hand_quantity, available_quantity, received_at, revision
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)
                ON CONFLICT(warehouse_id, pallet_id, item_id, batch_number, location_id) DO UPDATE SET
                    item_code = excluded.item_code,
                    manufacturing_date = excluded.manufacturing_date,
                    expiry_date = excluded.expiry_date,
                    on_hand_quantity = excluded.on_hand_quantity,
                    available_quantity = excluded.available_quantity,
                    received_at = excluded.received_at,
                    revision = inventory_unit.revision + 1
                "#,
            )?;

            for unit in units {
                stmt.execute(params![
                    warehouse_id,
                    unit.pallet_id,
                    unit.item_id,
                    unit.item_code,
                    unit.batch_number.as_deref().unwrap_or(""),
                    unit.manufacturing_date,
                    unit.expiry_date,
                    unit.location_id,
                    unit.on_hand_quantity,
                    unit.available_quantity,
                    unit.received_at,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    /// 读取仓库库存快照
    ///
    /// # 参数
    /// - `item_ids`: None 表示全部物料; Some 时只查询这些物料 (空列表返回空)
    ///
    /// # 返回
    /// 按 rowid 顺序 (即写入顺序) 返回, 保证托盘组顺序稳定
    pub fn load_snapshot(
        &self,
        warehouse_id: &str,
        item_ids: Option<&[String]>,
    ) -> RepositoryResult<Vec<StoredInventoryUnit>> {
        let mut sql = String::from(
            r#"
            SELECT warehouse_id, pallet_id, item_id, item_code, batch_number,
                   manufacturing_date, expiry_date, location_id,
                   on_hand_quantity, available_quantity, received_at, revision
            FROM inventory_unit
            WHERE warehouse_id = ?1
            "#,
        );

        let mut bind: Vec<&str> = vec![warehouse_id];
        if let Some(ids) = item_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders: Vec<String> = (0..ids.len()).map(|i| format!("?{}", i + 2)).collect();
            sql.push_str(&format!(" AND item_id IN ({})", placeholders.join(", ")));
            bind.extend(ids.iter().map(String::as_str));
        }
        sql.push_str(" ORDER BY rowid");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bind), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 在事务中执行扣减
    ///
    /// 校验顺序:
    /// 1) 托盘行存在, 否则 NotFound
    /// 2) revision 与快照一致, 否则 OptimisticLockFailure
    /// 3) 扣减后可用量不为负, 否则 InsufficientAvailable
    ///
    /// 任一失败直接返回错误, 由调用方丢弃事务 (自动回滚)
    pub fn apply_draw_down_tx(
        tx: &Transaction,
        warehouse_id: &str,
        draws: &[PalletDrawDown],
    ) -> RepositoryResult<usize> {
        let mut select = tx.prepare(
            r#"
            SELECT available_quantity, revision FROM inventory_unit
            WHERE warehouse_id = ?1 AND pallet_id = ?2 AND item_id = ?3
              AND batch_number = ?4 AND location_id = ?5
            "#,
        )?;
        let mut update = tx.prepare(
            r#"
            UPDATE inventory_unit
            SET available_quantity = ?1, revision = revision + 1
            WHERE warehouse_id = ?2 AND pallet_id = ?3 AND item_id = ?4
              AND batch_number = ?5 AND location_id = ?6 AND revision = ?7
            "#,
        )?;

        let mut count = 0;
        for draw in draws {
            let batch = draw.batch_number.as_deref().unwrap_or("");
            let current: Option<(f64, i64)> = select
                .query_row(
                    params![warehouse_id, draw.pallet_id, draw.item_id, batch, draw.location_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (available, revision) = current.ok_or_else(|| RepositoryError::NotFound {
                entity: "InventoryUnit".to_string(),
                id: draw.pallet_id.clone(),
            })?;

            if revision != draw.expected_revision {
                return Err(RepositoryError::OptimisticLockFailure {
                    pallet_id: draw.pallet_id.clone(),
                    expected: draw.expected_revision,
                    actual: revision,
                });
            }

            let mut remaining = available - draw.quantity;
            if remaining < -DRAW_DOWN_EPSILON {
                return Err(RepositoryError::InsufficientAvailable {
                    pallet_id: draw.pallet_id.clone(),
                    requested: draw.quantity,
                    available,
                });
            }
            if remaining.abs() <= DRAW_DOWN_EPSILON {
                remaining = 0.0;
            }

            let affected = update.execute(params![
                remaining,
                warehouse_id,
                draw.pallet_id,
                draw.item_id,
                batch,
                draw.location_id,
                draw.expected_revision,
            ])?;
            if affected != 1 {
                return Err(RepositoryError::DatabaseTransactionError(format!(
                    "托盘扣减未生效: pallet_id={}",
                    draw.pallet_id
                )));
            }
            count += 1;
        }

        Ok(count)
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<StoredInventoryUnit> {
    let batch_number: String = row.get(4)?;
    Ok(StoredInventoryUnit {
        warehouse_id: row.get(0)?,
        unit: InventoryUnit {
            pallet_id: row.get(1)?,
            item_id: row.get(2)?,
            item_code: row.get(3)?,
            batch_number: if batch_number.is_empty() {
                None
            } else {
                Some(batch_number)
            },
            manufacturing_date: row.get(5)?,
            expiry_date: row.get(6)?,
            location_id: row.get(7)?,
            on_hand_quantity: row.get(8)?,
            available_quantity: row.get(9)?,
            received_at: row.get(10)?,
        },
        revision: row.get(11)?,
    })
}
