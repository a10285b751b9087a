// ==========================================
// 托盘库存分配引擎 - 导入层
// ==========================================
// 职责: 外部快照导入 (CSV), 生成分配请求
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod snapshot_importer;

pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, RawRow};
pub use snapshot_importer::SnapshotImporter;
