// ==========================================
// 托盘库存分配引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行 / 外部集成调用
// ==========================================

pub mod allocation_api;
pub mod error;
pub mod warehouse_gate;

// 重导出核心类型
pub use allocation_api::{AllocationApi, CommitOutcome, OutboundPalletPlan};
pub use error::{ApiError, ApiResult};
pub use warehouse_gate::WarehouseGate;
