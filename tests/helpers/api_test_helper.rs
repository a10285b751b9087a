// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时 SQLite 文件组装 AllocationApi
// ==========================================

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use pallet_allocation::api::AllocationApi;
use pallet_allocation::config::{config_keys, ConfigManager};
use pallet_allocation::db::open_sqlite_connection;
use pallet_allocation::engine::AllocationEventPublisher;
use pallet_allocation::repository::InventoryRepository;
use rusqlite::Connection;
use tempfile::NamedTempFile;

#[path = "../test_helpers.rs"]
mod test_helpers;

/// API测试环境
pub struct ApiTestEnv {
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub allocation_api: AllocationApi,
    pub inventory_repo: InventoryRepository,
    pub config_manager: ConfigManager,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(None)
    }

    pub fn with_publisher(
        publisher: Arc<dyn AllocationEventPublisher>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(Some(publisher))
    }

    fn build(
        publisher: Option<Arc<dyn AllocationEventPublisher>>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (temp_file, db_path) = test_helpers::create_test_db()?;
        let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));

        let mut allocation_api = AllocationApi::new(conn.clone())?;
        if let Some(publisher) = publisher {
            allocation_api = allocation_api.with_event_publisher(publisher);
        }

        let config_manager = ConfigManager::from_connection(conn.clone())?;
        // 固定参考日期, 保证效期判定可复现
        config_manager.set_global_config_value(config_keys::REFERENCE_DATE, "2024-03-01")?;

        Ok(Self {
            db_path,
            inventory_repo: InventoryRepository::new(conn.clone()),
            conn,
            allocation_api,
            config_manager,
            _temp_file: temp_file,
        })
    }

    /// 以独立连接打开同一数据库 (模拟另一个进程)
    pub fn second_inventory_repo(&self) -> Result<InventoryRepository, Box<dyn std::error::Error>> {
        let conn = open_sqlite_connection(&self.db_path)?;
        Ok(InventoryRepository::new(Arc::new(Mutex::new(conn))))
    }
}
