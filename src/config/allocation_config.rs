// ==========================================
// 托盘库存分配引擎 - 分配参数
// ==========================================
// 职责: 引擎运行参数 (内存值 + 默认值)
// 来源: config_kv 表 (ConfigManager) 或调用方直接构造
// ==========================================

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// 默认数量容差 (吸收浮点扣减残差)
pub const DEFAULT_QUANTITY_EPSILON: f64 = 1e-9;

/// 数量容差上限: 容差只吸收浮点残差, 不得吞掉真实缺口 (配置只能收紧)
pub const MAX_QUANTITY_EPSILON: f64 = DEFAULT_QUANTITY_EPSILON;

/// 分配参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// 参考日期 (效期判定用; None 表示取本地当天)
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,

    /// 是否启用 FIFO 兜底
    #[serde(default = "default_true")]
    pub enable_fifo_last_resort: bool,

    /// 数量容差
    #[serde(default = "default_epsilon")]
    pub quantity_epsilon: f64,

    /// 物料未配置时的单位重量 (出库托盘规划)
    #[serde(default)]
    pub default_weight_per_unit: Option<f64>,

    /// 物料未配置时的每托件数 (出库托盘规划)
    #[serde(default)]
    pub default_units_per_pallet: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn default_epsilon() -> f64 {
    DEFAULT_QUANTITY_EPSILON
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            reference_date: None,
            enable_fifo_last_resort: true,
            quantity_epsilon: DEFAULT_QUANTITY_EPSILON,
            default_weight_per_unit: None,
            default_units_per_pallet: None,
        }
    }
}

impl AllocationConfig {
    /// 参考日期 (未配置时取本地当天,只保留日期)
    pub fn reference_date_or_today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// 生效容差: 限制在 [0, MAX_QUANTITY_EPSILON], 非法值取默认
    pub fn effective_epsilon(&self) -> f64 {
        if !self.quantity_epsilon.is_finite() || self.quantity_epsilon < 0.0 {
            return DEFAULT_QUANTITY_EPSILON;
        }
        self.quantity_epsilon.min(MAX_QUANTITY_EPSILON)
    }
}
