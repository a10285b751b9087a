// ==========================================
// 托盘库存分配引擎 - 配置层
// ==========================================
// 职责: 分配参数管理
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod allocation_config;
pub mod allocation_config_trait;
pub mod config_manager;

pub use allocation_config::{AllocationConfig, DEFAULT_QUANTITY_EPSILON, MAX_QUANTITY_EPSILON};
pub use allocation_config_trait::AllocationConfigReader;
pub use config_manager::{config_keys, ConfigManager};
