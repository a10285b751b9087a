// ==========================================
// 托盘库存分配引擎 - 批次排序引擎
// ==========================================
// 职责: 按分配策略对候选合并批次排序
// 输入: 候选批次 (首次出现顺序) + 策略 + 参考日期
// 输出: 排序后的批次 (稳定排序,同键保持输入顺序)
// ==========================================
// 排序规则:
// - FEFO: 有效效期批次按效期升序, 其后为过期/无效期批次 (按 FIFO 键)
// - FIFO: 生产日期升序, 缺失或相同时按入库时间升序
// - BATCH: 批次号字典序升序
// 红线: 批次内托盘顺序不重排
// ==========================================

use crate::domain::inventory::ConsolidatedBatch;
use crate::domain::types::AllocationStrategy;
use chrono::NaiveDate;
use std::cmp::Ordering;

// ==========================================
// BatchSorter - 批次排序引擎
// ==========================================
pub struct BatchSorter {
    // 无状态引擎
}

impl BatchSorter {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 按策略排序
    pub fn sort<'a>(
        &self,
        strategy: AllocationStrategy,
        batches: Vec<&'a ConsolidatedBatch>,
        today: NaiveDate,
    ) -> Vec<&'a ConsolidatedBatch> {
        match strategy {
            AllocationStrategy::Fefo => self.sort_fefo(batches, today),
            AllocationStrategy::Fifo => self.sort_fifo(batches),
            AllocationStrategy::Batch => self.sort_by_batch_number(batches),
        }
    }

    /// FEFO: 有效效期升序 + 无效部分 FIFO
    pub fn sort_fefo<'a>(
        &self,
        batches: Vec<&'a ConsolidatedBatch>,
        today: NaiveDate,
    ) -> Vec<&'a ConsolidatedBatch> {
        let (mut valid, invalid): (Vec<_>, Vec<_>) = batches
            .into_iter()
            .partition(|b| b.has_valid_expiry(today));

        valid.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date));

        let mut sorted = valid;
        sorted.extend(self.sort_fifo(invalid));
        sorted
    }

    /// FIFO: 生产日期升序, 回退入库时间
    pub fn sort_fifo<'a>(&self, mut batches: Vec<&'a ConsolidatedBatch>) -> Vec<&'a ConsolidatedBatch> {
        batches.sort_by(|a, b| self.compare_fifo(a, b));
        batches
    }

    /// BATCH: 批次号字典序 (无批次号视为空串)
    pub fn sort_by_batch_number<'a>(
        &self,
        mut batches: Vec<&'a ConsolidatedBatch>,
    ) -> Vec<&'a ConsolidatedBatch> {
        batches.sort_by(|a, b| a.key.batch_label().cmp(b.key.batch_label()));
        batches
    }

    // ==========================================
    // 比较方法
    // ==========================================

    /// FIFO 比较
    ///
    /// 1. 有效日期升序 (生产日期; 缺失时取入库日期)
    /// 2. 入库时间升序
    fn compare_fifo(&self, a: &ConsolidatedBatch, b: &ConsolidatedBatch) -> Ordering {
        match a.fifo_date().cmp(&b.fifo_date()) {
            Ordering::Equal => {}
            other => return other,
        }

        a.received_at.cmp(&b.received_at)
    }
}

impl Default for BatchSorter {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::InventoryUnit;
    use chrono::NaiveDateTime;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_batch(
        batch: &str,
        mfg: Option<&str>,
        expiry: Option<&str>,
        received: &str,
    ) -> ConsolidatedBatch {
        ConsolidatedBatch::from_unit(&InventoryUnit {
            pallet_id: format!("P-{}", batch),
            item_id: "ITEM1".to_string(),
            item_code: "SKU-1".to_string(),
            batch_number: Some(batch.to_string()),
            manufacturing_date: mfg.map(date),
            expiry_date: expiry.map(date),
            location_id: "L1".to_string(),
            on_hand_quantity: 5.0,
            available_quantity: 5.0,
            received_at: NaiveDateTime::parse_from_str(received, "%Y-%m-%d %H:%M:%S").unwrap(),
        })
    }

    fn labels(batches: &[&ConsolidatedBatch]) -> Vec<String> {
        batches.iter().map(|b| b.key.batch_label().to_string()).collect()
    }

    #[test]
    fn test_fefo_valid_first_then_expired_fifo() {
        let b1 = create_test_batch("B1", None, Some("2025-03-01"), "2024-01-05 00:00:00");
        let b2 = create_test_batch("B2", None, Some("2025-01-10"), "2024-01-06 00:00:00");
        let b3 = create_test_batch("B3", Some("2024-05-01"), Some("2024-12-01"), "2024-01-01 00:00:00");
        let b4 = create_test_batch("B4", Some("2024-02-01"), None, "2024-01-02 00:00:00");

        let sorted = BatchSorter::new().sort(AllocationStrategy::Fefo, vec![&b1, &b2, &b3, &b4], today());
        assert_eq!(labels(&sorted), vec!["B2", "B1", "B4", "B3"]);
    }

    #[test]
    fn test_fifo_by_manufacturing_date() {
        let b1 = create_test_batch("B1", Some("2024-06-01"), None, "2024-01-01 00:00:00");
        let b2 = create_test_batch("B2", Some("2024-01-01"), None, "2024-07-01 00:00:00");

        let sorted = BatchSorter::new().sort(AllocationStrategy::Fifo, vec![&b1, &b2], today());
        assert_eq!(labels(&sorted), vec!["B2", "B1"]);
    }

    #[test]
    fn test_fifo_equal_manufacturing_falls_back_to_received() {
        let b1 = create_test_batch("B1", Some("2024-01-01"), None, "2024-02-02 10:00:00");
        let b2 = create_test_batch("B2", Some("2024-01-01"), None, "2024-02-02 09:00:00");
        let b3 = create_test_batch("B3", None, None, "2023-12-01 00:00:00");

        let sorted = BatchSorter::new().sort(AllocationStrategy::Fifo, vec![&b1, &b2, &b3], today());
        assert_eq!(labels(&sorted), vec!["B3", "B2", "B1"]);
    }

    #[test]
    fn test_fifo_ties_keep_input_order() {
        let b1 = create_test_batch("B1", Some("2024-01-01"), None, "2024-02-02 10:00:00");
        let b2 = create_test_batch("B2", Some("2024-01-01"), None, "2024-02-02 10:00:00");

        let sorted = BatchSorter::new().sort(AllocationStrategy::Fifo, vec![&b2, &b1], today());
        assert_eq!(labels(&sorted), vec!["B2", "B1"]);
    }

    #[test]
    fn test_batch_strategy_sorts_lexicographically() {
        let b1 = create_test_batch("B10", None, None, "2024-01-01 00:00:00");
        let b2 = create_test_batch("B2", None, None, "2024-01-01 00:00:00");
        let b3 = create_test_batch("A7", None, None, "2024-01-01 00:00:00");

        let sorted = BatchSorter::new().sort(AllocationStrategy::Batch, vec![&b1, &b2, &b3], today());
        assert_eq!(labels(&sorted), vec!["A7", "B10", "B2"]);
    }
}
