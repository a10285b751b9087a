// ==========================================
// 托盘库存分配引擎 - 引擎层错误类型
// ==========================================
// 职责: 输入校验错误 (在任何分配计算之前同步抛出)
// 红线: 缺口(shortfall)是数据,不是错误
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 需求行校验 =====
    #[error("订货数量必须大于0: demand_line_id={demand_line_id}, ordered_quantity={ordered_quantity}")]
    NonPositiveOrderedQuantity {
        demand_line_id: String,
        ordered_quantity: f64,
    },

    #[error("必填字段缺失: {entity}.{field} (行 {index})")]
    MissingIdentifier {
        entity: String,
        field: String,
        index: usize,
    },

    // ===== 库存快照校验 =====
    #[error("库存数量非法 (pallet_id={pallet_id}, 字段 {field}): {value}")]
    InvalidInventoryQuantity {
        pallet_id: String,
        field: String,
        value: f64,
    },

    // ===== 出库托盘规划校验 =====
    #[error("托盘容量必须大于0: capacity={0}")]
    NonPositivePalletCapacity(f64),

    #[error("单位重量必须大于0: weight_per_unit={0}")]
    NonPositiveWeightPerUnit(f64),

    #[error("出库数量非法: quantity={0}")]
    InvalidPalletQuantity(f64),

    #[error("物料缺少托盘配置: item_id={0}")]
    MissingPalletConfig(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
