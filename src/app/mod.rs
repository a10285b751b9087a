// ==========================================
// 托盘库存分配引擎 - 应用层
// ==========================================
// 职责: 数据库打开 + API 装配, 供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
