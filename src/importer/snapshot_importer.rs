// ==========================================
// 托盘库存分配引擎 - 快照导入器
// ==========================================
// 职责: CSV (库存 / 需求行 / 物料配置) → AllocationRequest
// 流程: 文件解析 → 字段映射 (逐行, 遇错即停)
// 红线: 只做格式转换, 业务校验交给引擎 InputValidator
// ==========================================

use crate::domain::demand::DemandLine;
use crate::domain::inventory::{InventoryUnit, ItemConfig};
use crate::engine::orchestrator::AllocationRequest;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{CsvParser, RawRow};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

pub struct SnapshotImporter {
    parser: CsvParser,
    mapper: FieldMapper,
}

impl SnapshotImporter {
    pub fn new() -> Self {
        Self {
            parser: CsvParser,
            mapper: FieldMapper,
        }
    }

    // ==========================================
    // 文件入口
    // ==========================================

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn import_inventory(&self, path: &Path) -> ImportResult<Vec<InventoryUnit>> {
        let rows = self.parser.parse_file(path)?;
        let units = self.map_rows(&rows, |row, n| self.mapper.map_inventory_unit(row, n))?;
        info!(pallets = units.len(), "库存快照导入完成");
        Ok(units)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn import_demand_lines(&self, path: &Path) -> ImportResult<Vec<DemandLine>> {
        let rows = self.parser.parse_file(path)?;
        let lines = self.map_rows(&rows, |row, n| self.mapper.map_demand_line(row, n))?;
        info!(demand_lines = lines.len(), "需求行导入完成");
        Ok(lines)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn import_item_configs(&self, path: &Path) -> ImportResult<Vec<ItemConfig>> {
        let rows = self.parser.parse_file(path)?;
        let configs = self.map_rows(&rows, |row, n| self.mapper.map_item_config(row, n))?;
        info!(item_configs = configs.len(), "物料配置导入完成");
        Ok(configs)
    }

    /// 组装完整分配请求 (物料配置文件可选)
    pub fn import_request(
        &self,
        inventory_path: &Path,
        demand_path: &Path,
        item_config_path: Option<&Path>,
    ) -> ImportResult<AllocationRequest> {
        let item_configs = match item_config_path {
            Some(path) => self.import_item_configs(path)?,
            None => Vec::new(),
        };

        Ok(AllocationRequest {
            demand_lines: self.import_demand_lines(demand_path)?,
            inventory: self.import_inventory(inventory_path)?,
            item_configs,
        })
    }

    fn map_rows<T, F>(&self, rows: &[RawRow], map: F) -> ImportResult<Vec<T>>
    where
        F: Fn(&HashMap<String, String>, usize) -> ImportResult<T>,
    {
        rows.iter().map(|(row_number, row)| map(row, *row_number)).collect()
    }
}

impl Default for SnapshotImporter {
    fn default() -> Self {
        Self::new()
    }
}
