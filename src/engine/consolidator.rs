// ==========================================
// 托盘库存分配引擎 - 托盘池合并引擎
// ==========================================
// 职责: 按 (物料, 批次, 库位) 合并托盘,保留原始托盘列表
// 输入: 托盘级库存快照
// 输出: 合并批次表 + 托盘分组表 (组内顺序 = 输入顺序 = 扣减顺序)
// ==========================================

use crate::domain::inventory::{BatchKey, ConsolidatedBatch, InventoryUnit};
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// PalletPool - 合并后的托盘池 (运行期)
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PalletPool {
    batches: HashMap<BatchKey, ConsolidatedBatch>,
    pallet_groups: HashMap<BatchKey, Vec<InventoryUnit>>,
    // 物料 → 批次键 (按首次出现顺序,作为稳定排序的兜底顺序)
    item_batches: HashMap<String, Vec<BatchKey>>,
}

impl PalletPool {
    pub fn batch(&self, key: &BatchKey) -> Option<&ConsolidatedBatch> {
        self.batches.get(key)
    }

    /// 批次下的原始托盘 (不存在时返回空切片)
    pub fn pallet_group(&self, key: &BatchKey) -> &[InventoryUnit] {
        self.pallet_groups
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 某物料的全部候选批次 (按首次出现顺序)
    pub fn batches_for_item(&self, item_id: &str) -> Vec<&ConsolidatedBatch> {
        self.item_batches
            .get(item_id)
            .map(|keys| keys.iter().filter_map(|k| self.batches.get(k)).collect())
            .unwrap_or_default()
    }

    /// 按批次号查找 (忽略大小写,可能跨多个库位)
    pub fn find_batches(&self, item_id: &str, batch_number: &str) -> Vec<&ConsolidatedBatch> {
        let wanted = batch_number.trim();
        self.batches_for_item(item_id)
            .into_iter()
            .filter(|b| {
                b.batch_number()
                    .map(|n| n.trim().eq_ignore_ascii_case(wanted))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn batches(&self) -> impl Iterator<Item = &ConsolidatedBatch> {
        self.batches.values()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn pallet_count(&self) -> usize {
        self.pallet_groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

// ==========================================
// PalletPoolConsolidator - 托盘池合并引擎
// ==========================================
pub struct PalletPoolConsolidator {
    // 无状态引擎
}

impl PalletPoolConsolidator {
    pub fn new() -> Self {
        Self {}
    }

    /// 合并托盘
    ///
    /// # 参数
    /// - `units`: 托盘级库存快照
    ///
    /// # 返回
    /// 合并后的托盘池 (空输入 → 空池)
    #[instrument(skip_all, fields(pallet_count = units.len()))]
    pub fn consolidate(&self, units: &[InventoryUnit]) -> PalletPool {
        let mut pool = PalletPool::default();

        for unit in units {
            let key = unit.batch_key();

            match pool.batches.get_mut(&key) {
                Some(batch) => batch.absorb(unit),
                None => {
                    pool.batches
                        .insert(key.clone(), ConsolidatedBatch::from_unit(unit));
                    pool.item_batches
                        .entry(unit.item_id.clone())
                        .or_default()
                        .push(key.clone());
                }
            }

            pool.pallet_groups
                .entry(key)
                .or_default()
                .push(unit.clone());
        }

        debug!(
            batch_count = pool.batch_count(),
            item_count = pool.item_batches.len(),
            "托盘池合并完成"
        );

        pool
    }
}

impl Default for PalletPoolConsolidator {
    fn default() -> Self {
        Self::new()
    }
}
