// ==========================================
// 托盘库存分配引擎 - 引擎层
// ==========================================
// 职责: 实现分配规则引擎, 不拼 SQL, 不做 I/O
// 红线: 单次运行是 (需求行, 库存快照, 物料配置, 参考日期) 的纯函数
// ==========================================

pub mod allocator;
pub mod batch_sorter;
pub mod consolidator;
pub mod error;
pub mod events;
pub mod input_validator;
pub mod orchestrator;
pub mod remainder_pallet;
pub mod strategy;
pub mod summary;

// 重导出核心引擎
pub use allocator::{Allocator, PalletKey, RunState};
pub use batch_sorter::BatchSorter;
pub use consolidator::{PalletPool, PalletPoolConsolidator};
pub use error::{EngineError, EngineResult};
pub use events::{
    AllocationEvent, AllocationEventPublisher, AllocationEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use input_validator::InputValidator;
pub use orchestrator::{AllocationOrchestrator, AllocationPlan, AllocationRequest};
pub use remainder_pallet::RemainderPalletCalculator;
pub use strategy::{StrategyDecision, StrategySelector};
pub use summary::AllocationSummaryEngine;
