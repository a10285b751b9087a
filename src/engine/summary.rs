// ==========================================
// 托盘库存分配引擎 - 分配汇总引擎
// ==========================================
// 职责: 汇总各需求行结果,输出状态分类与可读提示
// 红线: 无状态引擎,纯函数,无副作用
// ==========================================

use crate::domain::allocation::{AllocationResult, AllocationSummary};
use crate::domain::types::{AllocationStatus, LineOutcome};
use std::collections::HashSet;

// ==========================================
// AllocationSummaryEngine - 分配汇总引擎
// ==========================================
pub struct AllocationSummaryEngine;

impl AllocationSummaryEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 汇总分配结果
    ///
    /// # 统计口径
    /// - 全部满足: is_fully_allocated
    /// - 部分满足: 0 < 已分配 < 订货
    /// - 未分配: 已分配 = 0
    /// - 批次扣减数: 每行去重后的 (物料, 批次, 库位) 个数之和
    pub fn summarize(&self, results: &[AllocationResult]) -> AllocationSummary {
        let mut fully = 0;
        let mut partial = 0;
        let mut unallocated = 0;
        let mut batch_draws = 0;
        let mut total_records = 0;
        let mut total_ordered = 0.0;
        let mut total_allocated = 0.0;
        let mut total_shortfall = 0.0;

        for result in results {
            match result.outcome() {
                LineOutcome::FullyAllocated => fully += 1,
                LineOutcome::PartiallyAllocated => partial += 1,
                LineOutcome::Unallocated => unallocated += 1,
            }

            let distinct: HashSet<_> = result.records.iter().map(|r| r.batch_key()).collect();
            batch_draws += distinct.len();
            total_records += result.records.len();
            total_ordered += result.ordered_quantity;
            total_allocated += result.total_allocated;
            total_shortfall += result.shortfall;
        }

        let status = if fully == results.len() {
            AllocationStatus::AllSatisfied
        } else if fully + partial == 0 {
            AllocationStatus::NoneAllocated
        } else {
            AllocationStatus::Partial
        };

        let status_message = match status {
            AllocationStatus::AllSatisfied => format!(
                "全部满足: {} 个需求行已完全分配, 共 {} 条托盘记录",
                results.len(),
                total_records
            ),
            AllocationStatus::Partial => format!(
                "部分满足: 完全分配 {} 行, 部分分配 {} 行, 未分配 {} 行, 总缺口 {}",
                fully,
                partial,
                unallocated,
                format_quantity(total_shortfall)
            ),
            AllocationStatus::NoneAllocated => format!(
                "未分配: {} 个需求行均无可用库存, 需补货或人工处理",
                results.len()
            ),
        };

        AllocationSummary {
            total_lines: results.len(),
            fully_allocated_lines: fully,
            partially_allocated_lines: partial,
            unallocated_lines: unallocated,
            batch_draws,
            total_records,
            total_ordered,
            total_allocated,
            total_shortfall,
            status,
            status_message,
        }
    }

    /// 单行提示 (成功 / 警告带缺口 / 失败需人工)
    pub fn describe_line(&self, result: &AllocationResult) -> String {
        match result.outcome() {
            LineOutcome::FullyAllocated => format!(
                "[OK] {} 已完全分配 {} ({} {})",
                result.demand_line_id,
                format_quantity(result.total_allocated),
                result.strategy,
                result.strategy.title_cn()
            ),
            LineOutcome::PartiallyAllocated => format!(
                "[WARN] {} 部分分配 {}/{}, 缺口 {} ({} {})",
                result.demand_line_id,
                format_quantity(result.total_allocated),
                format_quantity(result.ordered_quantity),
                format_quantity(result.shortfall),
                result.strategy,
                result.strategy.title_cn()
            ),
            LineOutcome::Unallocated => format!(
                "[FAIL] {} 未分配, 缺口 {}, 需补货后重新分配",
                result.demand_line_id,
                format_quantity(result.shortfall)
            ),
        }
    }
}

impl Default for AllocationSummaryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 数量展示: 整数不带小数,其余保留三位
fn format_quantity(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.3}", value)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::allocation::AllocationRecord;
    use crate::domain::types::AllocationStrategy;

    fn create_test_record(line_id: &str, batch: &str, pallet: &str, qty: f64) -> AllocationRecord {
        AllocationRecord {
            demand_line_id: line_id.to_string(),
            order_id: "SO1".to_string(),
            item_id: "ITEM1".to_string(),
            item_code: "SKU-1".to_string(),
            batch_number: Some(batch.to_string()),
            expiry_date: None,
            manufacturing_date: None,
            location_id: "L1".to_string(),
            pallet_id: pallet.to_string(),
            allocated_quantity: qty,
            strategy: AllocationStrategy::Fifo,
        }
    }

    fn create_test_result(line_id: &str, ordered: f64, records: Vec<AllocationRecord>) -> AllocationResult {
        let total: f64 = records.iter().map(|r| r.allocated_quantity).sum();
        let shortfall = (ordered - total).max(0.0);
        AllocationResult {
            demand_line_id: line_id.to_string(),
            order_id: "SO1".to_string(),
            item_id: "ITEM1".to_string(),
            ordered_quantity: ordered,
            records,
            total_allocated: total,
            shortfall,
            is_fully_allocated: shortfall <= 0.0,
            strategy: AllocationStrategy::Fifo,
            strategy_reason: "NO_VALID_EXPIRY".to_string(),
        }
    }

    #[test]
    fn test_all_satisfied() {
        let results = vec![create_test_result(
            "DL1",
            4.0,
            vec![
                create_test_record("DL1", "B1", "P1", 2.0),
                create_test_record("DL1", "B1", "P2", 2.0),
            ],
        )];

        let summary = AllocationSummaryEngine::new().summarize(&results);

        assert_eq!(summary.status, AllocationStatus::AllSatisfied);
        assert_eq!(summary.fully_allocated_lines, 1);
        assert_eq!(summary.batch_draws, 1); // 同批次两个托盘只算一次
        assert_eq!(summary.total_records, 2);
        assert!(summary.is_all_satisfied());
    }

    #[test]
    fn test_partial_and_unallocated_counts() {
        let results = vec![
            create_test_result("DL1", 4.0, vec![create_test_record("DL1", "B1", "P1", 4.0)]),
            create_test_result(
                "DL2",
                5.0,
                vec![
                    create_test_record("DL2", "B1", "P2", 1.0),
                    create_test_record("DL2", "B2", "P3", 1.0),
                ],
            ),
            create_test_result("DL3", 2.0, vec![]),
        ];

        let engine = AllocationSummaryEngine::new();
        let summary = engine.summarize(&results);

        assert_eq!(summary.status, AllocationStatus::Partial);
        assert_eq!(summary.fully_allocated_lines, 1);
        assert_eq!(summary.partially_allocated_lines, 1);
        assert_eq!(summary.unallocated_lines, 1);
        assert_eq!(summary.batch_draws, 3);
        assert_eq!(summary.total_shortfall, 5.0);
        assert!(summary.status_message.contains("总缺口 5"));

        assert!(engine.describe_line(&results[1]).contains("缺口 3"));
        assert!(engine.describe_line(&results[2]).starts_with("[FAIL]"));
    }

    #[test]
    fn test_none_allocated() {
        let results = vec![create_test_result("DL1", 2.0, vec![])];
        let summary = AllocationSummaryEngine::new().summarize(&results);
        assert_eq!(summary.status, AllocationStatus::NoneAllocated);
    }

    #[test]
    fn test_empty_results_are_satisfied() {
        let summary = AllocationSummaryEngine::new().summarize(&[]);
        assert_eq!(summary.status, AllocationStatus::AllSatisfied);
        assert_eq!(summary.total_lines, 0);
    }
}
