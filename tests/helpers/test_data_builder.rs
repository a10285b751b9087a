// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use pallet_allocation::domain::demand::DemandLine;
use pallet_allocation::domain::inventory::{InventoryUnit, ItemConfig};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(8, 0, 0).unwrap()
}

// ==========================================
// InventoryUnit 构建器
// ==========================================

pub struct PalletBuilder {
    pallet_id: String,
    item_id: String,
    item_code: String,
    batch_number: Option<String>,
    manufacturing_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    location_id: String,
    on_hand_quantity: f64,
    available_quantity: f64,
    received_at: NaiveDateTime,
}

impl PalletBuilder {
    pub fn new(pallet_id: &str) -> Self {
        Self {
            pallet_id: pallet_id.to_string(),
            item_id: "ITEM1".to_string(),
            item_code: "SKU-ITEM1".to_string(),
            batch_number: None,
            manufacturing_date: None,
            expiry_date: None,
            location_id: "LOC-A".to_string(),
            on_hand_quantity: 0.0,
            available_quantity: 0.0,
            received_at: datetime(2024, 1, 1),
        }
    }

    pub fn item(mut self, item_id: &str) -> Self {
        self.item_id = item_id.to_string();
        self.item_code = format!("SKU-{}", item_id);
        self
    }

    pub fn batch(mut self, batch: &str) -> Self {
        self.batch_number = Some(batch.to_string());
        self
    }

    pub fn manufactured(mut self, date: NaiveDate) -> Self {
        self.manufacturing_date = Some(date);
        self
    }

    pub fn expires(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn location(mut self, location_id: &str) -> Self {
        self.location_id = location_id.to_string();
        self
    }

    /// 在库量与可用量相同
    pub fn qty(mut self, qty: f64) -> Self {
        self.on_hand_quantity = qty;
        self.available_quantity = qty;
        self
    }

    pub fn available(mut self, qty: f64) -> Self {
        self.available_quantity = qty;
        self
    }

    pub fn received(mut self, at: NaiveDateTime) -> Self {
        self.received_at = at;
        self
    }

    pub fn build(self) -> InventoryUnit {
        InventoryUnit {
            pallet_id: self.pallet_id,
            item_id: self.item_id,
            item_code: self.item_code,
            batch_number: self.batch_number,
            manufacturing_date: self.manufacturing_date,
            expiry_date: self.expiry_date,
            location_id: self.location_id,
            on_hand_quantity: self.on_hand_quantity,
            available_quantity: self.available_quantity,
            received_at: self.received_at,
        }
    }
}

// ==========================================
// DemandLine 构建器
// ==========================================

pub struct DemandLineBuilder {
    demand_line_id: String,
    order_id: String,
    item_id: String,
    ordered_quantity: f64,
    requested_batch_number: Option<String>,
}

impl DemandLineBuilder {
    pub fn new(demand_line_id: &str) -> Self {
        Self {
            demand_line_id: demand_line_id.to_string(),
            order_id: "SO-1".to_string(),
            item_id: "ITEM1".to_string(),
            ordered_quantity: 1.0,
            requested_batch_number: None,
        }
    }

    pub fn order(mut self, order_id: &str) -> Self {
        self.order_id = order_id.to_string();
        self
    }

    pub fn item(mut self, item_id: &str) -> Self {
        self.item_id = item_id.to_string();
        self
    }

    pub fn qty(mut self, qty: f64) -> Self {
        self.ordered_quantity = qty;
        self
    }

    pub fn batch(mut self, batch: &str) -> Self {
        self.requested_batch_number = Some(batch.to_string());
        self
    }

    pub fn build(self) -> DemandLine {
        DemandLine {
            demand_line_id: self.demand_line_id,
            order_id: self.order_id,
            item_code: format!("SKU-{}", self.item_id),
            item_name: format!("物料 {}", self.item_id),
            item_id: self.item_id,
            ordered_quantity: self.ordered_quantity,
            unit_of_measure: "CS".to_string(),
            requested_batch_number: self.requested_batch_number,
        }
    }
}

// ==========================================
// ItemConfig 构建器
// ==========================================

pub fn item_config(item_id: &str, batch_tracking: bool) -> ItemConfig {
    ItemConfig::new(item_id, batch_tracking)
}

pub fn palletized_config(item_id: &str, weight_per_unit: f64, units_per_pallet: f64) -> ItemConfig {
    ItemConfig {
        weight_per_unit: Some(weight_per_unit),
        units_per_pallet: Some(units_per_pallet),
        ..ItemConfig::new(item_id, false)
    }
}
