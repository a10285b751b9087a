// ==========================================
// 托盘库存分配引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::AllocationApi;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::engine::NoOpEventPublisher;

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 分配API
    pub allocation_api: Arc<AllocationApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并应用统一 PRAGMA
    /// 2. 建表 (幂等)
    /// 3. 创建API实例 (命令行场景无下游, 挂接空操作发布者)
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let schema_version =
            read_schema_version(&conn).map_err(|e| format!("读取 schema 版本失败: {}", e))?;
        tracing::info!(?schema_version, "数据库 schema 就绪");
        let conn = Arc::new(Mutex::new(conn));

        let api = AllocationApi::new(conn)
            .map_err(|e| e.to_string())?
            .with_event_publisher(Arc::new(NoOpEventPublisher));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            allocation_api: Arc::new(api),
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 PALLET_ALLOCATION_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PALLET_ALLOCATION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./pallet_allocation.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("pallet-allocation-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("pallet-allocation");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("pallet_allocation.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert!(state.allocation_api.load_config().is_ok());
    }

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"));
    }
}
