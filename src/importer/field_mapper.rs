// ==========================================
// 托盘库存分配引擎 - 字段映射器
// ==========================================
// 职责: 原始字段 → 领域实体 + 类型转换
// 列名: 英文标准列名, 兼容中文别名
// 日期: YYYY-MM-DD / YYYYMMDD
// 时间: RFC3339 / YYYY-MM-DD HH:MM:SS / 仅日期(当天 00:00)
// ==========================================

use crate::domain::demand::DemandLine;
use crate::domain::inventory::{InventoryUnit, ItemConfig};
use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

pub struct FieldMapper;

impl FieldMapper {
    // ==========================================
    // 实体映射
    // ==========================================

    pub fn map_inventory_unit(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<InventoryUnit> {
        let on_hand_quantity = self.require_f64(row, "on_hand_quantity", row_number)?;
        // 可用量缺省时取在库量
        let available_quantity = self
            .parse_f64(row, "available_quantity", row_number)?
            .unwrap_or(on_hand_quantity);

        Ok(InventoryUnit {
            pallet_id: self.require_string(row, "pallet_id", row_number)?,
            item_id: self.require_string(row, "item_id", row_number)?,
            item_code: self.get_string(row, "item_code").unwrap_or_default(),
            batch_number: self.get_string(row, "batch_number"),
            manufacturing_date: self.parse_date(row, "manufacturing_date", row_number)?,
            expiry_date: self.parse_date(row, "expiry_date", row_number)?,
            location_id: self.require_string(row, "location_id", row_number)?,
            on_hand_quantity,
            available_quantity,
            received_at: self
                .parse_datetime(row, "received_at", row_number)?
                .ok_or_else(|| ImportError::MissingField {
                    row: row_number,
                    field: "received_at".to_string(),
                })?,
        })
    }

    pub fn map_demand_line(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<DemandLine> {
        Ok(DemandLine {
            demand_line_id: self.require_string(row, "demand_line_id", row_number)?,
            order_id: self.get_string(row, "order_id").unwrap_or_default(),
            item_id: self.require_string(row, "item_id", row_number)?,
            item_code: self.get_string(row, "item_code").unwrap_or_default(),
            item_name: self.get_string(row, "item_name").unwrap_or_default(),
            ordered_quantity: self.require_f64(row, "ordered_quantity", row_number)?,
            unit_of_measure: self.get_string(row, "unit_of_measure").unwrap_or_default(),
            requested_batch_number: self.get_string(row, "requested_batch_number"),
        })
    }

    pub fn map_item_config(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<ItemConfig> {
        Ok(ItemConfig {
            item_id: self.require_string(row, "item_id", row_number)?,
            batch_tracking: self
                .parse_bool(row, "batch_tracking", row_number)?
                .unwrap_or(false),
            weight_per_unit: self.parse_f64(row, "weight_per_unit", row_number)?,
            units_per_pallet: self.parse_f64(row, "units_per_pallet", row_number)?,
        })
    }

    // ==========================================
    // 字段读取
    // ==========================================

    /// 提取字符串字段，支持中文别名
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        let aliases: &[&str] = match key {
            "pallet_id" => &["pallet_id", "托盘号"],
            "item_id" => &["item_id", "物料ID"],
            "item_code" => &["item_code", "物料编码"],
            "item_name" => &["item_name", "物料名称"],
            "batch_number" => &["batch_number", "批次号"],
            "manufacturing_date" => &["manufacturing_date", "生产日期"],
            "expiry_date" => &["expiry_date", "失效日期", "有效期至"],
            "location_id" => &["location_id", "库位"],
            "on_hand_quantity" => &["on_hand_quantity", "在库数量"],
            "available_quantity" => &["available_quantity", "可用数量"],
            "received_at" => &["received_at", "入库时间"],
            "demand_line_id" => &["demand_line_id", "需求行号"],
            "order_id" => &["order_id", "订单号"],
            "ordered_quantity" => &["ordered_quantity", "订货数量"],
            "unit_of_measure" => &["unit_of_measure", "单位"],
            "requested_batch_number" => &["requested_batch_number", "指定批次"],
            "batch_tracking" => &["batch_tracking", "批次管理"],
            "weight_per_unit" => &["weight_per_unit", "单位重量"],
            "units_per_pallet" => &["units_per_pallet", "每托件数"],
            _ => &[],
        };

        std::iter::once(key)
            .chain(aliases.iter().copied())
            .filter_map(|alias| row.get(alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    fn require_string(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<String> {
        self.get_string(row, key).ok_or_else(|| ImportError::MissingField {
            row: row_number,
            field: key.to_string(),
        })
    }

    /// 解析浮点数
    fn parse_f64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为数值: {}", value),
                }),
        }
    }

    fn require_f64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<f64> {
        self.parse_f64(row, key, row_number)?
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: key.to_string(),
            })
    }

    /// 解析布尔 (true/false, 1/0, Y/N, 是/否)
    fn parse_bool(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<bool>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "y" | "yes" | "是" => Ok(Some(true)),
                "false" | "0" | "n" | "no" | "否" => Ok(Some(false)),
                _ => Err(ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为布尔值: {}", value),
                }),
            },
        }
    }

    /// 解析日期（YYYY-MM-DD 或 YYYYMMDD）
    fn parse_date(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDate>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(&value, "%Y%m%d"))
                .map(Some)
                .map_err(|_| ImportError::DateFormatError {
                    row: row_number,
                    field: key.to_string(),
                    value: value.clone(),
                }),
        }
    }

    /// 解析时间戳（RFC3339 统一换算为 UTC）
    fn parse_datetime(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDateTime>> {
        let value = match self.get_string(row, key) {
            None => return Ok(None),
            Some(v) => v,
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return Ok(Some(dt.with_timezone(&Utc).naive_utc()));
        }

        NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(Some)
            .ok_or_else(|| ImportError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("时间格式错误: {}", value),
            })
    }
}
