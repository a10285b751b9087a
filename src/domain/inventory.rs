// ==========================================
// 托盘库存分配引擎 - 库存领域模型
// ==========================================
// 职责: 托盘级库存事实、合并批次、物料配置
// 红线: 分配过程不修改 InventoryUnit,只在辅助表中记录逻辑扣减
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryUnit - 托盘 (库存最小可追踪单元)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUnit {
    // ===== 标识 =====
    pub pallet_id: String,                     // 托盘号 (快照内唯一)
    pub item_id: String,                       // 物料ID
    pub item_code: String,                     // 物料编码 (冗余自然键,防错配)

    // ===== 批次信息 =====
    pub batch_number: Option<String>,          // 批次号
    pub manufacturing_date: Option<NaiveDate>, // 生产日期
    pub expiry_date: Option<NaiveDate>,        // 失效日期

    // ===== 位置与数量 =====
    pub location_id: String,                   // 库位
    pub on_hand_quantity: f64,                 // 在库数量
    pub available_quantity: f64,               // 可用数量 (在库 - 本次之外已占用)

    // ===== 入库时间 =====
    pub received_at: NaiveDateTime,            // 入库/创建时间
}

impl InventoryUnit {
    /// 合并键 (物料, 批次, 库位)
    pub fn batch_key(&self) -> BatchKey {
        BatchKey {
            item_id: self.item_id.clone(),
            batch_number: self.batch_number.clone(),
            location_id: self.location_id.clone(),
        }
    }
}

// ==========================================
// BatchKey - 合并批次键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchKey {
    pub item_id: String,
    pub batch_number: Option<String>,
    pub location_id: String,
}

impl BatchKey {
    /// 批次号(无批次时为空串)
    pub fn batch_label(&self) -> &str {
        self.batch_number.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for BatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.item_id, self.batch_label(), self.location_id)
    }
}

// ==========================================
// ConsolidatedBatch - 合并批次 (运行期聚合)
// ==========================================
// 用途: 同物料/批次/库位的多个托盘合并为一个逻辑可用池
// 日期口径: 取组内首个非空值; received_at 取组内最早
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedBatch {
    pub key: BatchKey,
    pub item_code: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub received_at: NaiveDateTime,
    pub on_hand_quantity: f64,
    pub available_quantity: f64,
    pub pallet_count: usize,
}

impl ConsolidatedBatch {
    /// 以首个托盘初始化
    pub fn from_unit(unit: &InventoryUnit) -> Self {
        Self {
            key: unit.batch_key(),
            item_code: unit.item_code.clone(),
            manufacturing_date: unit.manufacturing_date,
            expiry_date: unit.expiry_date,
            received_at: unit.received_at,
            on_hand_quantity: unit.on_hand_quantity,
            available_quantity: unit.available_quantity,
            pallet_count: 1,
        }
    }

    /// 并入同键托盘
    pub fn absorb(&mut self, unit: &InventoryUnit) {
        self.on_hand_quantity += unit.on_hand_quantity;
        self.available_quantity += unit.available_quantity;
        self.pallet_count += 1;
        if self.manufacturing_date.is_none() {
            self.manufacturing_date = unit.manufacturing_date;
        }
        if self.expiry_date.is_none() {
            self.expiry_date = unit.expiry_date;
        }
        if unit.received_at < self.received_at {
            self.received_at = unit.received_at;
        }
    }

    pub fn batch_number(&self) -> Option<&str> {
        self.key.batch_number.as_deref()
    }

    /// 效期是否有效: 存在且严格晚于参考日期 (只比较日期)
    pub fn has_valid_expiry(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry > today)
    }

    /// FIFO 排序用的有效日期: 生产日期,缺失时退化为入库日期
    pub fn fifo_date(&self) -> NaiveDate {
        self.manufacturing_date
            .unwrap_or_else(|| self.received_at.date())
    }
}

// ==========================================
// ItemConfig - 物料配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    pub item_id: String,

    /// 批次管理开关 (策略判定主依据)
    pub batch_tracking: bool,

    /// 单位重量 (出库托盘规划用)
    #[serde(default)]
    pub weight_per_unit: Option<f64>,

    /// 每托件数 (出库托盘规划用)
    #[serde(default)]
    pub units_per_pallet: Option<f64>,
}

impl ItemConfig {
    pub fn new(item_id: &str, batch_tracking: bool) -> Self {
        Self {
            item_id: item_id.to_string(),
            batch_tracking,
            weight_per_unit: None,
            units_per_pallet: None,
        }
    }
}
