// ==========================================
// 托盘库存分配引擎 - 需求行领域模型
// ==========================================
// 职责: 销售订单行 (只读输入)
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DemandLine - 需求行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    pub demand_line_id: String,                 // 需求行ID
    pub order_id: String,                       // 订单ID
    pub item_id: String,                        // 物料ID
    pub item_code: String,                      // 物料编码
    pub item_name: String,                      // 物料名称
    pub ordered_quantity: f64,                  // 订货数量
    pub unit_of_measure: String,                // 计量单位
    #[serde(default)]
    pub requested_batch_number: Option<String>, // 指定批次 (可选)
}

impl DemandLine {
    /// 指定批次(去空白后非空才算)
    pub fn requested_batch(&self) -> Option<&str> {
        self.requested_batch_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
