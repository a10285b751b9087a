// ==========================================
// 托盘库存分配引擎 - 分配策略判定
// ==========================================
// 判定顺序:
// 1) batch_tracking = true → BATCH
// 2) 候选批次中存在效期严格晚于参考日期的 → FEFO
// 3) 否则 → FIFO
// 4) 缺少物料配置时按 2)~3) 推断 (告警,不报错)
// 红线: 每个需求行只判定一次,分配过程中不交替
// ==========================================

use crate::domain::demand::DemandLine;
use crate::domain::inventory::{ConsolidatedBatch, ItemConfig};
use crate::domain::types::AllocationStrategy;
use chrono::NaiveDate;
use tracing::warn;

/// 策略判定结果 (带原因,便于解释)
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDecision {
    pub strategy: AllocationStrategy,
    pub reason: String,
    /// 是否因缺少物料配置而推断
    pub inferred: bool,
}

// ==========================================
// StrategySelector - 策略判定器
// ==========================================
pub struct StrategySelector {
    // 无状态引擎
}

impl StrategySelector {
    pub fn new() -> Self {
        Self {}
    }

    /// 为需求行判定分配策略
    ///
    /// # 参数
    /// - `line`: 需求行
    /// - `config`: 物料配置 (可能缺失)
    /// - `candidates`: 该物料的候选合并批次
    /// - `today`: 参考日期
    pub fn select(
        &self,
        line: &DemandLine,
        config: Option<&ItemConfig>,
        candidates: &[&ConsolidatedBatch],
        today: NaiveDate,
    ) -> StrategyDecision {
        match config {
            Some(config) if config.batch_tracking => StrategyDecision {
                strategy: AllocationStrategy::Batch,
                reason: "BATCH_TRACKING_ENABLED".to_string(),
                inferred: false,
            },
            Some(_) => {
                let (strategy, reason) = self.infer_from_expiry(candidates, today);
                StrategyDecision {
                    strategy,
                    reason,
                    inferred: false,
                }
            }
            None => {
                warn!(
                    demand_line_id = %line.demand_line_id,
                    item_id = %line.item_id,
                    "物料配置缺失,按效期数据推断分配策略"
                );
                let (strategy, reason) = self.infer_from_expiry(candidates, today);
                StrategyDecision {
                    strategy,
                    reason: format!("CONFIG_MISSING; {}", reason),
                    inferred: true,
                }
            }
        }
    }

    /// 按效期有效性推断 FEFO / FIFO
    pub fn infer_from_expiry(
        &self,
        candidates: &[&ConsolidatedBatch],
        today: NaiveDate,
    ) -> (AllocationStrategy, String) {
        let valid_count = candidates
            .iter()
            .filter(|b| b.has_valid_expiry(today))
            .count();

        if valid_count > 0 {
            (
                AllocationStrategy::Fefo,
                format!("VALID_EXPIRY_FOUND: valid_batches={}, today={}", valid_count, today),
            )
        } else {
            (
                AllocationStrategy::Fifo,
                format!("NO_VALID_EXPIRY: candidate_batches={}, today={}", candidates.len(), today),
            )
        }
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new()
    }
}
