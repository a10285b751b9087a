// ==========================================
// 托盘库存分配引擎 - 输入校验
// ==========================================
// 职责: 分配前同步校验需求行与库存快照
// 规则:
// 1) 需求行ID / 物料ID 非空
// 2) 订货数量 > 0 (且为有限数)
// 3) 托盘号 / 物料ID / 库位 非空
// 4) 在库、可用数量 >= 0 (且为有限数)
// 注: 指定批次不存在不在此校验 (分配时降级处理)
// ==========================================

use crate::domain::demand::DemandLine;
use crate::domain::inventory::InventoryUnit;
use crate::engine::error::{EngineError, EngineResult};

pub struct InputValidator;

impl InputValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验整次请求 (遇到第一个错误即返回)
    pub fn validate(&self, demand_lines: &[DemandLine], inventory: &[InventoryUnit]) -> EngineResult<()> {
        for (index, line) in demand_lines.iter().enumerate() {
            self.validate_demand_line(index, line)?;
        }
        for (index, unit) in inventory.iter().enumerate() {
            self.validate_inventory_unit(index, unit)?;
        }
        Ok(())
    }

    pub fn validate_demand_line(&self, index: usize, line: &DemandLine) -> EngineResult<()> {
        require("DemandLine", "demand_line_id", &line.demand_line_id, index)?;
        require("DemandLine", "item_id", &line.item_id, index)?;

        if !line.ordered_quantity.is_finite() || line.ordered_quantity <= 0.0 {
            return Err(EngineError::NonPositiveOrderedQuantity {
                demand_line_id: line.demand_line_id.clone(),
                ordered_quantity: line.ordered_quantity,
            });
        }
        Ok(())
    }

    pub fn validate_inventory_unit(&self, index: usize, unit: &InventoryUnit) -> EngineResult<()> {
        require("InventoryUnit", "pallet_id", &unit.pallet_id, index)?;
        require("InventoryUnit", "item_id", &unit.item_id, index)?;
        require("InventoryUnit", "location_id", &unit.location_id, index)?;

        for (field, value) in [
            ("on_hand_quantity", unit.on_hand_quantity),
            ("available_quantity", unit.available_quantity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInventoryQuantity {
                    pallet_id: unit.pallet_id.clone(),
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn require(entity: &str, field: &str, value: &str, index: usize) -> EngineResult<()> {
    if value.trim().is_empty() {
        return Err(EngineError::MissingIdentifier {
            entity: entity.to_string(),
            field: field.to_string(),
            index,
        });
    }
    Ok(())
}
