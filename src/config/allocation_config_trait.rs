// ==========================================
// 托盘库存分配引擎 - 分配参数读取 Trait
// ==========================================
// 职责: 定义分配流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::allocation_config::AllocationConfig;
use chrono::NaiveDate;
use std::error::Error;

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait AllocationConfigReader: Send + Sync {
    /// 参考日期覆写
    ///
    /// # 默认值
    /// - None (取本地当天)
    fn get_reference_date(&self) -> Result<Option<NaiveDate>, Box<dyn Error>>;

    /// 是否启用 FIFO 兜底
    ///
    /// # 默认值
    /// - true
    fn get_enable_fifo_last_resort(&self) -> Result<bool, Box<dyn Error>>;

    /// 数量容差
    ///
    /// # 默认值
    /// - 1e-9
    fn get_quantity_epsilon(&self) -> Result<f64, Box<dyn Error>>;

    /// 默认单位重量 (出库托盘规划)
    fn get_default_weight_per_unit(&self) -> Result<Option<f64>, Box<dyn Error>>;

    /// 默认每托件数 (出库托盘规划)
    fn get_default_units_per_pallet(&self) -> Result<Option<f64>, Box<dyn Error>>;

    /// 组装完整分配参数
    fn load_allocation_config(&self) -> Result<AllocationConfig, Box<dyn Error>> {
        Ok(AllocationConfig {
            reference_date: self.get_reference_date()?,
            enable_fifo_last_resort: self.get_enable_fifo_last_resort()?,
            quantity_epsilon: self.get_quantity_epsilon()?,
            default_weight_per_unit: self.get_default_weight_per_unit()?,
            default_units_per_pallet: self.get_default_units_per_pallet()?,
        })
    }
}
