// ==========================================
// 托盘库存分配引擎 - 仓库级写入闸门
// ==========================================
// 职责: 同一仓库的“分配 + 提交”串行执行 (单写者)
// 说明: 不同仓库互不阻塞; 闸门只在本进程内有效,
//       跨进程并发由提交时的 revision 校验兜住
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct WarehouseGate {
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WarehouseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取仓库对应的互斥锁 (不存在则创建)
    pub fn gate(&self, warehouse_id: &str) -> ApiResult<Arc<Mutex<()>>> {
        let mut gates = self
            .gates
            .lock()
            .map_err(|e| ApiError::InternalError(format!("仓库闸门锁获取失败: {}", e)))?;

        Ok(gates
            .entry(warehouse_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}
