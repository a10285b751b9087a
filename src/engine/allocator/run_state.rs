use crate::domain::inventory::{BatchKey, ConsolidatedBatch, InventoryUnit};
use std::collections::HashMap;

// ==========================================
// PalletKey - 托盘跟踪键
// ==========================================
// 托盘号 + 批次键: 即使快照中托盘号重复,也不会串用其他批次的扣减量
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PalletKey {
    pub pallet_id: String,
    pub batch: BatchKey,
}

impl PalletKey {
    pub fn of(unit: &InventoryUnit) -> Self {
        Self {
            pallet_id: unit.pallet_id.clone(),
            batch: unit.batch_key(),
        }
    }
}

// ==========================================
// RunState - 单次运行的扣减状态
// ==========================================
// 每次调用独占一份,运行结束即丢弃,不跨运行共享
#[derive(Debug, Clone, Default)]
pub struct RunState {
    batch_allocated: HashMap<BatchKey, f64>,
    pallet_allocated: HashMap<PalletKey, f64>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并批次本次已分配量
    pub fn batch_allocated(&self, key: &BatchKey) -> f64 {
        self.batch_allocated.get(key).copied().unwrap_or(0.0)
    }

    /// 托盘本次已分配量
    pub fn pallet_allocated(&self, unit: &InventoryUnit) -> f64 {
        self.pallet_allocated
            .get(&PalletKey::of(unit))
            .copied()
            .unwrap_or(0.0)
    }

    /// 合并批次真实可用量 = 可用 - 本次已分配
    pub fn batch_remaining(&self, batch: &ConsolidatedBatch) -> f64 {
        batch.available_quantity - self.batch_allocated(&batch.key)
    }

    /// 托盘真实可用量 = 可用 - 本次已分配
    pub fn pallet_remaining(&self, unit: &InventoryUnit) -> f64 {
        unit.available_quantity - self.pallet_allocated(unit)
    }

    /// 记录一次扣减 (批次、托盘两层同时更新)
    pub fn record_draw(&mut self, unit: &InventoryUnit, quantity: f64) {
        *self.batch_allocated.entry(unit.batch_key()).or_insert(0.0) += quantity;
        *self
            .pallet_allocated
            .entry(PalletKey::of(unit))
            .or_insert(0.0) += quantity;
    }

    pub fn touched_pallets(&self) -> usize {
        self.pallet_allocated.len()
    }
}
