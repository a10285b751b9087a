// ==========================================
// 托盘库存分配引擎 - 分配核心引擎
// ==========================================
// 职责: 单需求行三段式分配 + 多需求行顺序分配
// 红线: 需求行按输入顺序处理,后行可见前行的扣减 (行序即优先级)
// 红线: 不生成数量 <= 0 的分配记录
// ==========================================

use crate::config::AllocationConfig;
use crate::domain::allocation::{AllocationRecord, AllocationResult};
use crate::domain::demand::DemandLine;
use crate::domain::inventory::{ConsolidatedBatch, InventoryUnit, ItemConfig};
use crate::domain::types::AllocationStrategy;
use crate::engine::batch_sorter::BatchSorter;
use crate::engine::consolidator::PalletPool;
use crate::engine::strategy::StrategySelector;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

use super::run_state::{PalletKey, RunState};

// ==========================================
// LineDraw - 单需求行的扣减过程
// ==========================================
struct LineDraw<'a> {
    line: &'a DemandLine,
    records: Vec<AllocationRecord>,
    used_pallets: HashSet<PalletKey>,
    remaining: f64,
}

impl<'a> LineDraw<'a> {
    fn new(line: &'a DemandLine) -> Self {
        Self {
            line,
            records: Vec::new(),
            used_pallets: HashSet::new(),
            remaining: line.ordered_quantity,
        }
    }

    fn push(&mut self, unit: &InventoryUnit, quantity: f64, strategy: AllocationStrategy) {
        self.records.push(AllocationRecord {
            demand_line_id: self.line.demand_line_id.clone(),
            order_id: self.line.order_id.clone(),
            item_id: unit.item_id.clone(),
            item_code: unit.item_code.clone(),
            batch_number: unit.batch_number.clone(),
            expiry_date: unit.expiry_date,
            manufacturing_date: unit.manufacturing_date,
            location_id: unit.location_id.clone(),
            pallet_id: unit.pallet_id.clone(),
            allocated_quantity: quantity,
            strategy,
        });
        self.used_pallets.insert(PalletKey::of(unit));
        self.remaining -= quantity;
    }
}

// ==========================================
// Allocator - 分配核心引擎
// ==========================================
pub struct Allocator {
    selector: StrategySelector,
    sorter: BatchSorter,
    enable_fifo_last_resort: bool,
    epsilon: f64,
}

impl Allocator {
    /// 默认参数构造
    pub fn new() -> Self {
        Self::with_config(&AllocationConfig::default())
    }

    /// 按分配参数构造
    pub fn with_config(config: &AllocationConfig) -> Self {
        Self {
            selector: StrategySelector::new(),
            sorter: BatchSorter::new(),
            enable_fifo_last_resort: config.enable_fifo_last_resort,
            epsilon: config.effective_epsilon(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 按输入顺序分配全部需求行
    ///
    /// # 参数
    /// - `demand_lines`: 需求行 (顺序即优先级)
    /// - `pool`: 合并后的托盘池
    /// - `item_configs`: 物料配置 (item_id → ItemConfig)
    /// - `today`: 参考日期
    ///
    /// # 返回
    /// 与输入等长、同序的分配结果
    #[instrument(skip_all, fields(
        demand_lines = demand_lines.len(),
        batch_count = pool.batch_count(),
        today = %today
    ))]
    pub fn allocate_all(
        &self,
        demand_lines: &[DemandLine],
        pool: &PalletPool,
        item_configs: &HashMap<String, ItemConfig>,
        today: NaiveDate,
    ) -> Vec<AllocationResult> {
        let mut state = RunState::new();

        let results: Vec<AllocationResult> = demand_lines
            .iter()
            .map(|line| {
                self.allocate_line(line, pool, item_configs.get(&line.item_id), today, &mut state)
            })
            .collect();

        debug!(touched_pallets = state.touched_pallets(), "需求行分配完成");
        results
    }

    /// 分配单个需求行
    ///
    /// 规则:
    /// 1) 指定批次: 忽略大小写匹配,按托盘组顺序扣减; 有扣减则行策略记为 BATCH
    /// 2) 主策略: 候选批次按判定策略排序,跳过真实可用 <= 0 的批次
    /// 3) FIFO 兜底: 主策略非 FIFO 且仍有缺口时,按 FIFO 重扫,跳过本行已用托盘
    pub fn allocate_line(
        &self,
        line: &DemandLine,
        pool: &PalletPool,
        config: Option<&ItemConfig>,
        today: NaiveDate,
        state: &mut RunState,
    ) -> AllocationResult {
        let candidates = self.candidate_batches(line, pool);
        let decision = self.selector.select(line, config, &candidates, today);
        let mut draw = LineDraw::new(line);
        let mut line_strategy = decision.strategy;

        // 1. 指定批次
        if let Some(requested) = line.requested_batch() {
            let targets: Vec<&ConsolidatedBatch> = pool
                .find_batches(&line.item_id, requested)
                .into_iter()
                .filter(|batch| item_code_matches(line, batch))
                .collect();

            if targets.is_empty() {
                warn!(
                    demand_line_id = %line.demand_line_id,
                    requested_batch = requested,
                    "指定批次不存在,回退到策略分配"
                );
            }

            let before = draw.records.len();
            for batch in targets {
                if draw.remaining <= self.epsilon {
                    break;
                }
                self.draw_from_batch(batch, pool, state, &mut draw, AllocationStrategy::Batch, false);
            }
            if draw.records.len() > before {
                line_strategy = AllocationStrategy::Batch;
            }
        }

        // 2. 主策略
        if draw.remaining > self.epsilon {
            let ordered = self.sorter.sort(decision.strategy, candidates.clone(), today);
            for batch in ordered {
                if draw.remaining <= self.epsilon {
                    break;
                }
                self.draw_from_batch(batch, pool, state, &mut draw, decision.strategy, false);
            }
        }

        // 3. FIFO 兜底
        if draw.remaining > self.epsilon
            && decision.strategy != AllocationStrategy::Fifo
            && self.enable_fifo_last_resort
        {
            debug!(
                demand_line_id = %line.demand_line_id,
                remaining = draw.remaining,
                "主策略未满足,执行 FIFO 兜底"
            );
            let ordered = self.sorter.sort(AllocationStrategy::Fifo, candidates, today);
            for batch in ordered {
                if draw.remaining <= self.epsilon {
                    break;
                }
                self.draw_from_batch(batch, pool, state, &mut draw, AllocationStrategy::Fifo, true);
            }
        }

        self.finalize(line, draw, line_strategy, decision.reason)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 候选批次: 同物料, 且物料编码一致 (防错配)
    fn candidate_batches<'p>(&self, line: &DemandLine, pool: &'p PalletPool) -> Vec<&'p ConsolidatedBatch> {
        pool.batches_for_item(&line.item_id)
            .into_iter()
            .filter(|batch| {
                let matches = item_code_matches(line, batch);
                if !matches {
                    warn!(
                        demand_line_id = %line.demand_line_id,
                        line_item_code = %line.item_code,
                        batch_item_code = %batch.item_code,
                        batch = %batch.key,
                        "物料编码不一致,跳过批次"
                    );
                }
                matches
            })
            .collect()
    }

    /// 从合并批次按托盘组顺序扣减
    fn draw_from_batch(
        &self,
        batch: &ConsolidatedBatch,
        pool: &PalletPool,
        state: &mut RunState,
        draw: &mut LineDraw<'_>,
        strategy: AllocationStrategy,
        skip_used: bool,
    ) {
        if state.batch_remaining(batch) <= self.epsilon {
            return;
        }

        for unit in pool.pallet_group(&batch.key) {
            if draw.remaining <= self.epsilon {
                break;
            }
            if skip_used && draw.used_pallets.contains(&PalletKey::of(unit)) {
                continue;
            }

            let pallet_available = state.pallet_remaining(unit);
            if pallet_available <= self.epsilon {
                continue;
            }

            let quantity = draw
                .remaining
                .min(pallet_available)
                .min(state.batch_remaining(batch));
            if quantity <= self.epsilon {
                break;
            }

            state.record_draw(unit, quantity);
            draw.push(unit, quantity, strategy);
        }
    }

    /// 汇总单行结果
    fn finalize(
        &self,
        line: &DemandLine,
        draw: LineDraw<'_>,
        strategy: AllocationStrategy,
        strategy_reason: String,
    ) -> AllocationResult {
        let total_allocated: f64 = draw.records.iter().map(|r| r.allocated_quantity).sum();
        // epsilon 已限制在浮点残差量级, 只抹平残差
        let mut shortfall = (line.ordered_quantity - total_allocated).max(0.0);
        if shortfall <= self.epsilon {
            shortfall = 0.0;
        }

        if shortfall > 0.0 {
            debug!(
                demand_line_id = %line.demand_line_id,
                ordered = line.ordered_quantity,
                allocated = total_allocated,
                shortfall,
                "需求行存在缺口"
            );
        }

        AllocationResult {
            demand_line_id: line.demand_line_id.clone(),
            order_id: line.order_id.clone(),
            item_id: line.item_id.clone(),
            ordered_quantity: line.ordered_quantity,
            records: draw.records,
            total_allocated,
            shortfall,
            is_fully_allocated: shortfall == 0.0,
            strategy,
            strategy_reason,
        }
    }
}

/// 物料编码一致 (任一侧为空视为一致)
fn item_code_matches(line: &DemandLine, batch: &ConsolidatedBatch) -> bool {
    line.item_code.trim().is_empty()
        || batch.item_code.trim().is_empty()
        || batch.item_code.trim().eq_ignore_ascii_case(line.item_code.trim())
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}
