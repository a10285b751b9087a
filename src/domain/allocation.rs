// ==========================================
// 托盘库存分配引擎 - 分配结果领域模型
// ==========================================
// 职责: 分配记录、需求行汇总、出库托盘规划、批次汇总
// 红线: AllocationRecord 只追加,不修改
// ==========================================

use crate::domain::inventory::BatchKey;
use crate::domain::types::{AllocationStatus, AllocationStrategy, LineOutcome};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// AllocationRecord - 分配记录 (一行 = 一次托盘扣减)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub demand_line_id: String,
    pub order_id: String,
    pub item_id: String,
    pub item_code: String,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub location_id: String,
    pub pallet_id: String,
    pub allocated_quantity: f64,
    pub strategy: AllocationStrategy,
}

impl AllocationRecord {
    pub fn batch_key(&self) -> BatchKey {
        BatchKey {
            item_id: self.item_id.clone(),
            batch_number: self.batch_number.clone(),
            location_id: self.location_id.clone(),
        }
    }
}

// ==========================================
// AllocationResult - 需求行分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub demand_line_id: String,
    pub order_id: String,
    pub item_id: String,
    pub ordered_quantity: f64,
    pub records: Vec<AllocationRecord>,
    pub total_allocated: f64,
    pub shortfall: f64,
    pub is_fully_allocated: bool,
    pub strategy: AllocationStrategy,
    /// 策略判定原因 (可解释性)
    pub strategy_reason: String,
}

impl AllocationResult {
    /// 行分配结论
    pub fn outcome(&self) -> LineOutcome {
        if self.is_fully_allocated {
            LineOutcome::FullyAllocated
        } else if self.total_allocated > 0.0 {
            LineOutcome::PartiallyAllocated
        } else {
            LineOutcome::Unallocated
        }
    }
}

// ==========================================
// PalletAllocation - 出库托盘规划
// ==========================================
// 整托: quantity = 单托容量, pallet_config = 每托件数
// 余托: quantity = 余量, pallet_config = ceil(余量 / 单位重量)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalletAllocation {
    pub pallet_tag: String,
    pub seq_no: u32,
    pub quantity: f64,
    pub pallet_config: u32,
    pub is_remainder: bool,
}

// ==========================================
// AllocationSummary - 分配汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub total_lines: usize,
    pub fully_allocated_lines: usize,
    pub partially_allocated_lines: usize,
    pub unallocated_lines: usize,
    /// 各需求行去重后的批次扣减次数之和
    pub batch_draws: usize,
    pub total_records: usize,
    pub total_ordered: f64,
    pub total_allocated: f64,
    pub total_shortfall: f64,
    pub status: AllocationStatus,
    pub status_message: String,
}

impl AllocationSummary {
    pub fn is_all_satisfied(&self) -> bool {
        self.status == AllocationStatus::AllSatisfied
    }
}
