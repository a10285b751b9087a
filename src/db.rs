// ==========================================
// 托盘库存分配引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表 (幂等)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表 (CREATE TABLE IF NOT EXISTS, 可重复执行)
///
/// 说明：
/// - inventory_unit.batch_number 以空串表示“无批次”，便于参与主键
/// - allocation_record 随 allocation_run 级联删除
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS inventory_unit (
            warehouse_id TEXT NOT NULL,
            pallet_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            item_code TEXT NOT NULL,
            batch_number TEXT NOT NULL DEFAULT '',
            manufacturing_date TEXT,
            expiry_date TEXT,
            location_id TEXT NOT NULL,
            on_hand_quantity REAL NOT NULL,
            available_quantity REAL NOT NULL,
            received_at TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (warehouse_id, pallet_id, item_id, batch_number, location_id)
        );

        CREATE INDEX IF NOT EXISTS idx_inventory_unit_item
            ON inventory_unit (warehouse_id, item_id);

        CREATE TABLE IF NOT EXISTS allocation_run (
            run_id TEXT PRIMARY KEY,
            warehouse_id TEXT NOT NULL,
            reference_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            status TEXT NOT NULL,
            summary_json TEXT NOT NULL,
            config_snapshot_json TEXT
        );

        CREATE TABLE IF NOT EXISTS allocation_record (
            run_id TEXT NOT NULL REFERENCES allocation_run(run_id) ON DELETE CASCADE,
            seq_no INTEGER NOT NULL,
            demand_line_id TEXT NOT NULL,
            order_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            item_code TEXT NOT NULL,
            batch_number TEXT,
            expiry_date TEXT,
            manufacturing_date TEXT,
            location_id TEXT NOT NULL,
            pallet_id TEXT NOT NULL,
            allocated_quantity REAL NOT NULL,
            strategy TEXT NOT NULL,
            PRIMARY KEY (run_id, seq_no)
        );

        CREATE INDEX IF NOT EXISTS idx_allocation_record_line
            ON allocation_record (demand_line_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
