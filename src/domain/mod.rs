// ==========================================
// 托盘库存分配引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod demand;
pub mod inventory;
pub mod types;

// 重导出核心类型
pub use allocation::{AllocationRecord, AllocationResult, AllocationSummary, PalletAllocation};
pub use demand::DemandLine;
pub use inventory::{BatchKey, ConsolidatedBatch, InventoryUnit, ItemConfig};
pub use types::{AllocationStatus, AllocationStrategy, LineOutcome, RunStatus};
