// ==========================================
// 托盘库存分配引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::allocation_config::{DEFAULT_QUANTITY_EPSILON, MAX_QUANTITY_EPSILON};
use crate::config::allocation_config_trait::AllocationConfigReader;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 提交分配运行时记录配置快照 (审计)
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    fn get_optional_f64(&self, key: &str) -> Result<Option<f64>, Box<dyn Error>> {
        let value = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        match value.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && parsed > 0.0 => Ok(Some(parsed)),
            _ => {
                tracing::warn!(config_key = key, raw_value = %value, "配置值非法，忽略");
                Ok(None)
            }
        }
    }
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
impl AllocationConfigReader for ConfigManager {
    fn get_reference_date(&self) -> Result<Option<NaiveDate>, Box<dyn Error>> {
        let value = match self.get_config_value(config_keys::REFERENCE_DATE)? {
            Some(v) if !v.trim().is_empty() => v,
            _ => return Ok(None),
        };

        match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
            Ok(date) => Ok(Some(date)),
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::REFERENCE_DATE,
                    raw_value = %value,
                    "参考日期格式错误，使用当天"
                );
                Ok(None)
            }
        }
    }

    fn get_enable_fifo_last_resort(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ENABLE_FIFO_LAST_RESORT, "true")?;
        match value.trim().to_lowercase().as_str() {
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Ok(true),
        }
    }

    fn get_quantity_epsilon(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::QUANTITY_EPSILON, "1e-9")?;
        match value.trim().parse::<f64>() {
            Ok(eps) if eps.is_finite() && eps >= 0.0 && eps <= MAX_QUANTITY_EPSILON => Ok(eps),
            Ok(eps) if eps.is_finite() && eps > MAX_QUANTITY_EPSILON => {
                tracing::warn!(
                    config_key = config_keys::QUANTITY_EPSILON,
                    raw_value = %value,
                    max = MAX_QUANTITY_EPSILON,
                    "数量容差超过上限，按上限生效"
                );
                Ok(MAX_QUANTITY_EPSILON)
            }
            _ => {
                tracing::warn!(
                    config_key = config_keys::QUANTITY_EPSILON,
                    raw_value = %value,
                    "数量容差非法，使用默认值"
                );
                Ok(DEFAULT_QUANTITY_EPSILON)
            }
        }
    }

    fn get_default_weight_per_unit(&self) -> Result<Option<f64>, Box<dyn Error>> {
        self.get_optional_f64(config_keys::DEFAULT_WEIGHT_PER_UNIT)
    }

    fn get_default_units_per_pallet(&self) -> Result<Option<f64>, Box<dyn Error>> {
        self.get_optional_f64(config_keys::DEFAULT_UNITS_PER_PALLET)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 效期判定
    pub const REFERENCE_DATE: &str = "reference_date";

    // 分配流程
    pub const ENABLE_FIFO_LAST_RESORT: &str = "enable_fifo_last_resort";
    pub const QUANTITY_EPSILON: &str = "quantity_epsilon";

    // 出库托盘规划
    pub const DEFAULT_WEIGHT_PER_UNIT: &str = "default_weight_per_unit";
    pub const DEFAULT_UNITS_PER_PALLET: &str = "default_units_per_pallet";
}
