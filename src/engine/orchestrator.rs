// ==========================================
// 托盘库存分配引擎 - 引擎编排器
// ==========================================
// 用途: 协调分配流程各引擎的执行顺序
// 流程: 输入校验 → 托盘池合并 → 逐行分配 → 汇总校验
// 红线: 同步执行, 无 I/O, 无锁; 运行状态仅属于单次调用
// ==========================================

use crate::config::AllocationConfig;
use crate::domain::allocation::{AllocationResult, AllocationSummary};
use crate::domain::demand::DemandLine;
use crate::domain::inventory::{InventoryUnit, ItemConfig};
use crate::engine::error::EngineResult;
use crate::engine::{
    AllocationSummaryEngine, Allocator, InputValidator, PalletPoolConsolidator,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

// ==========================================
// AllocationRequest - 分配请求
// ==========================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// 需求行 (顺序即优先级)
    pub demand_lines: Vec<DemandLine>,
    /// 库存快照 (托盘级)
    pub inventory: Vec<InventoryUnit>,
    /// 物料配置 (按 item_id, 重复时后者覆盖)
    #[serde(default)]
    pub item_configs: Vec<ItemConfig>,
}

impl AllocationRequest {
    pub fn item_config_map(&self) -> HashMap<String, ItemConfig> {
        self.item_configs
            .iter()
            .map(|config| (config.item_id.clone(), config.clone()))
            .collect()
    }
}

// ==========================================
// AllocationPlan - 分配方案
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub reference_date: NaiveDate,
    /// 与需求行等长、同序
    pub results: Vec<AllocationResult>,
    pub summary: AllocationSummary,
}

// ==========================================
// AllocationOrchestrator - 引擎编排器
// ==========================================

pub struct AllocationOrchestrator {
    config: AllocationConfig,
    validator: InputValidator,
    consolidator: PalletPoolConsolidator,
    allocator: Allocator,
    summary: AllocationSummaryEngine,
}

impl AllocationOrchestrator {
    pub fn new(config: AllocationConfig) -> Self {
        Self {
            validator: InputValidator::new(),
            consolidator: PalletPoolConsolidator::new(),
            allocator: Allocator::with_config(&config),
            summary: AllocationSummaryEngine::new(),
            config,
        }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// 执行一次完整分配
    ///
    /// # 返回
    /// - `Ok(plan)`: 分配方案 (缺口体现在结果中,不是错误)
    /// - `Err(EngineError)`: 输入校验失败,未做任何分配
    #[instrument(skip_all, fields(
        demand_lines = request.demand_lines.len(),
        pallets = request.inventory.len()
    ))]
    pub fn execute(&self, request: &AllocationRequest) -> EngineResult<AllocationPlan> {
        let today = self.config.reference_date_or_today();
        info!(
            demand_lines = request.demand_lines.len(),
            pallets = request.inventory.len(),
            item_configs = request.item_configs.len(),
            reference_date = %today,
            "开始执行分配流程"
        );

        // ==========================================
        // 步骤1: 输入校验
        // ==========================================
        debug!("步骤1: 输入校验");
        self.validator
            .validate(&request.demand_lines, &request.inventory)?;

        // ==========================================
        // 步骤2: 托盘池合并
        // ==========================================
        debug!("步骤2: 托盘池合并");
        let pool = self.consolidator.consolidate(&request.inventory);

        // ==========================================
        // 步骤3: 逐行分配
        // ==========================================
        debug!("步骤3: 逐行分配");
        let item_configs = request.item_config_map();
        let results = self
            .allocator
            .allocate_all(&request.demand_lines, &pool, &item_configs, today);

        // ==========================================
        // 步骤4: 汇总校验
        // ==========================================
        let summary = self.summary.summarize(&results);

        info!(
            status = %summary.status,
            fully_allocated = summary.fully_allocated_lines,
            partially_allocated = summary.partially_allocated_lines,
            unallocated = summary.unallocated_lines,
            total_shortfall = summary.total_shortfall,
            "分配流程完成"
        );

        Ok(AllocationPlan {
            reference_date: today,
            results,
            summary,
        })
    }
}

impl Default for AllocationOrchestrator {
    fn default() -> Self {
        Self::new(AllocationConfig::default())
    }
}
