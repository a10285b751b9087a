// ==========================================
// 托盘库存分配引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod allocation_repo;
pub mod commit_repo;
pub mod error;
pub mod inventory_repo;

// 重导出核心仓储
pub use allocation_repo::{AllocationRecordRepository, AllocationRunEntity};
pub use commit_repo::AllocationCommitRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::{InventoryRepository, PalletDrawDown, StoredInventoryUnit};
