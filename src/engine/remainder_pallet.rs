// ==========================================
// 托盘库存分配引擎 - 出库余托计算
// ==========================================
// 职责: 将最终分配量拆分为整托 + 一个余托
// 输入: 分配量 + 单位重量 + 每托件数 + 基础标识
// 输出: 有序托盘列表 (整托在前,余托最后)
// 红线: 容量 <= 0 视为调用方错误,计算前拒绝
// ==========================================

use crate::domain::allocation::PalletAllocation;
use crate::engine::error::{EngineError, EngineResult};
use tracing::debug;

/// 浮点容差 (避免 250/100 之类的整除被残差打断)
const PALLET_EPSILON: f64 = 1e-9;

// ==========================================
// RemainderPalletCalculator - 余托计算器
// ==========================================
pub struct RemainderPalletCalculator {
    // 无状态引擎,纯函数
}

impl RemainderPalletCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算出库托盘拆分
    ///
    /// # 参数
    /// - `quantity`: 分配量
    /// - `weight_per_unit`: 单位重量
    /// - `units_per_pallet`: 每托件数
    /// - `base_id`: 托盘标签前缀
    ///
    /// # 返回
    /// - floor(quantity / capacity) 个整托, 每托 capacity
    /// - quantity mod capacity != 0 时追加一个余托,
    ///   pallet_config = ceil(余量 / weight_per_unit)
    pub fn calculate(
        &self,
        quantity: f64,
        weight_per_unit: f64,
        units_per_pallet: f64,
        base_id: &str,
    ) -> EngineResult<Vec<PalletAllocation>> {
        if !weight_per_unit.is_finite() || weight_per_unit <= 0.0 {
            return Err(EngineError::NonPositiveWeightPerUnit(weight_per_unit));
        }
        let capacity = weight_per_unit * units_per_pallet;
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(EngineError::NonPositivePalletCapacity(capacity));
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(EngineError::InvalidPalletQuantity(quantity));
        }

        let full_count = (quantity / capacity + PALLET_EPSILON).floor() as u32;
        let remainder = quantity - f64::from(full_count) * capacity;
        let full_config = units_per_pallet.round().max(0.0) as u32;

        let mut pallets: Vec<PalletAllocation> = (1..=full_count)
            .map(|seq_no| PalletAllocation {
                pallet_tag: Self::pallet_tag(base_id, seq_no),
                seq_no,
                quantity: capacity,
                pallet_config: full_config,
                is_remainder: false,
            })
            .collect();

        if remainder > PALLET_EPSILON {
            let seq_no = full_count + 1;
            pallets.push(PalletAllocation {
                pallet_tag: Self::pallet_tag(base_id, seq_no),
                seq_no,
                quantity: remainder,
                pallet_config: (remainder / weight_per_unit - PALLET_EPSILON).ceil() as u32,
                is_remainder: true,
            });
        }

        debug!(
            base_id,
            quantity,
            capacity,
            full_count,
            remainder,
            "出库托盘拆分完成"
        );

        Ok(pallets)
    }

    fn pallet_tag(base_id: &str, seq_no: u32) -> String {
        format!("{}-{:03}", base_id, seq_no)
    }
}

impl Default for RemainderPalletCalculator {
    fn default() -> Self {
        Self::new()
    }
}
