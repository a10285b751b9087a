// ==========================================
// 托盘库存分配引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 需求行 × 托盘库存 的确定性分配决策
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配规则
pub mod engine;

// 导入层 - 外部快照
pub mod importer;

// 配置层 - 分配参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationStatus, AllocationStrategy, LineOutcome, RunStatus};

// 领域实体
pub use domain::{
    AllocationRecord, AllocationResult, AllocationSummary, BatchKey, ConsolidatedBatch,
    DemandLine, InventoryUnit, ItemConfig, PalletAllocation,
};

// 引擎
pub use engine::{
    AllocationOrchestrator, AllocationPlan, AllocationRequest, AllocationSummaryEngine,
    Allocator, BatchSorter, EngineError, PalletPoolConsolidator, RemainderPalletCalculator,
    StrategySelector,
};

// 配置
pub use config::AllocationConfig;

// API
pub use api::{AllocationApi, ApiError, CommitOutcome};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "托盘库存分配引擎";
