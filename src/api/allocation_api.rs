// ==========================================
// 托盘库存分配引擎 - 分配 API
// ==========================================
// 职责:
// 1. 纯分配运行 (不落库)
// 2. 分配并提交 (仓库闸门 + 单事务: revision 复核 / 记录写入 / 库存扣减)
// 3. 出库托盘规划 (整托 + 余托)
// 红线: 提交失败 = 什么都没提交, 结果以 CommitOutcome 返回
// ==========================================

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Local;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::warehouse_gate::WarehouseGate;
use crate::config::{AllocationConfig, AllocationConfigReader, ConfigManager};
use crate::domain::allocation::{AllocationRecord, AllocationResult, PalletAllocation};
use crate::domain::inventory::{InventoryUnit, ItemConfig};
use crate::domain::types::RunStatus;
use crate::engine::error::EngineError;
use crate::engine::events::{AllocationEvent, AllocationEventPublisher, OptionalEventPublisher};
use crate::engine::orchestrator::{AllocationOrchestrator, AllocationPlan, AllocationRequest};
use crate::engine::remainder_pallet::RemainderPalletCalculator;
use crate::repository::allocation_repo::{AllocationRecordRepository, AllocationRunEntity};
use crate::repository::commit_repo::AllocationCommitRepository;
use crate::repository::inventory_repo::{InventoryRepository, PalletDrawDown};

// ==========================================
// DTO
// ==========================================

/// 提交结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub run_id: String,
    pub warehouse_id: String,
    pub status: RunStatus,
    /// 已落库记录数 (拒绝时为 0)
    pub committed_records: usize,
    /// 拒绝原因
    pub reason: Option<String>,
    pub plan: AllocationPlan,
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        self.status == RunStatus::Committed
    }
}

/// 单条分配记录的出库托盘规划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundPalletPlan {
    pub demand_line_id: String,
    pub source_pallet_id: String,
    pub batch_number: Option<String>,
    pub allocated_quantity: f64,
    pub pallets: Vec<PalletAllocation>,
}

/// 托盘行主键 (与 inventory_unit 主键一致, 不含仓库)
type PalletRowKey = (String, String, Option<String>, String);

fn row_key(pallet_id: &str, item_id: &str, batch: &Option<String>, location_id: &str) -> PalletRowKey {
    (
        pallet_id.to_string(),
        item_id.to_string(),
        batch.clone(),
        location_id.to_string(),
    )
}

// ==========================================
// AllocationApi - 分配 API
// ==========================================
pub struct AllocationApi {
    inventory_repo: Arc<InventoryRepository>,
    record_repo: Arc<AllocationRecordRepository>,
    commit_repo: Arc<AllocationCommitRepository>,
    config_manager: Arc<ConfigManager>,
    gate: WarehouseGate,
    event_publisher: OptionalEventPublisher,
    pallet_calculator: RemainderPalletCalculator,
}

impl AllocationApi {
    /// 基于共享连接创建 API (各仓储共用同一连接)
    pub fn new(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            inventory_repo: Arc::new(InventoryRepository::new(conn.clone())),
            record_repo: Arc::new(AllocationRecordRepository::new(conn.clone())),
            commit_repo: Arc::new(AllocationCommitRepository::new(conn)),
            config_manager: Arc::new(config_manager),
            gate: WarehouseGate::new(),
            event_publisher: OptionalEventPublisher::none(),
            pallet_calculator: RemainderPalletCalculator::new(),
        })
    }

    /// 挂接事件发布者
    pub fn with_event_publisher(mut self, publisher: Arc<dyn AllocationEventPublisher>) -> Self {
        self.event_publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    /// 读取分配参数 (config_kv)
    pub fn load_config(&self) -> ApiResult<AllocationConfig> {
        self.config_manager
            .load_allocation_config()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    // ==========================================
    // 纯分配运行
    // ==========================================

    /// 执行分配 (不落库, 不扣减库存)
    pub fn run_allocation(&self, request: &AllocationRequest) -> ApiResult<AllocationPlan> {
        let config = self.load_config()?;
        Ok(AllocationOrchestrator::new(config).execute(request)?)
    }

    // ==========================================
    // 库存维护
    // ==========================================

    /// 写入仓库库存快照
    pub fn import_inventory(&self, warehouse_id: &str, units: &[InventoryUnit]) -> ApiResult<usize> {
        if warehouse_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("仓库ID不能为空".to_string()));
        }
        Ok(self.inventory_repo.upsert_units(warehouse_id, units)?)
    }

    // ==========================================
    // 分配并提交
    // ==========================================

    /// 分配并提交
    ///
    /// # 流程
    /// 1. 获取仓库闸门 (同仓库串行)
    /// 2. 读取库存快照 (带 revision), 忽略 request.inventory
    /// 3. 执行分配
    /// 4. 单事务: revision 复核 + 库存扣减 + 运行头 + 分配记录
    ///
    /// # 返回
    /// - Ok(CommitOutcome): 已提交或已回滚 (status 区分)
    /// - Err(ApiError): 输入校验失败, 未执行分配
    #[instrument(skip(self, request), fields(demand_lines = request.demand_lines.len()))]
    pub fn allocate_and_commit(
        &self,
        warehouse_id: &str,
        request: &AllocationRequest,
    ) -> ApiResult<CommitOutcome> {
        if warehouse_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("仓库ID不能为空".to_string()));
        }
        if !request.inventory.is_empty() {
            warn!(
                warehouse_id,
                ignored = request.inventory.len(),
                "提交模式以库存表快照为准, 忽略请求中的库存"
            );
        }

        let gate = self.gate.gate(warehouse_id)?;
        let _guard = gate
            .lock()
            .map_err(|e| ApiError::InternalError(format!("仓库闸门锁获取失败: {}", e)))?;

        let config = self.load_config()?;

        // 只加载本次需求涉及的物料
        let mut item_ids: Vec<String> = request
            .demand_lines
            .iter()
            .map(|line| line.item_id.clone())
            .collect();
        item_ids.sort();
        item_ids.dedup();

        let snapshot = self.inventory_repo.load_snapshot(warehouse_id, Some(&item_ids))?;
        let revisions: HashMap<PalletRowKey, i64> = snapshot
            .iter()
            .map(|row| {
                (
                    row_key(
                        &row.unit.pallet_id,
                        &row.unit.item_id,
                        &row.unit.batch_number,
                        &row.unit.location_id,
                    ),
                    row.revision,
                )
            })
            .collect();

        let engine_request = AllocationRequest {
            demand_lines: request.demand_lines.clone(),
            inventory: snapshot.into_iter().map(|row| row.unit).collect(),
            item_configs: request.item_configs.clone(),
        };
        let plan = AllocationOrchestrator::new(config).execute(&engine_request)?;

        let run_id = Uuid::new_v4().to_string();
        let records: Vec<AllocationRecord> = plan
            .results
            .iter()
            .flat_map(|result| result.records.iter().cloned())
            .collect();
        let draws = build_draw_downs(&records, &revisions)?;
        let demand_line_ids: Vec<String> = plan
            .results
            .iter()
            .map(|r| r.demand_line_id.clone())
            .collect();

        let run = AllocationRunEntity {
            run_id: run_id.clone(),
            warehouse_id: warehouse_id.to_string(),
            reference_date: plan.reference_date,
            created_at: Local::now().naive_local(),
            status: RunStatus::Committed,
            summary_json: serde_json::to_string(&plan.summary)
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
            config_snapshot_json: self.config_snapshot(&run_id),
        };

        match self.commit_repo.commit(&run, &records, &draws) {
            Ok(committed_records) => {
                info!(
                    run_id = %run_id,
                    warehouse_id,
                    committed_records,
                    pallets = draws.len(),
                    status = %plan.summary.status,
                    "分配已提交"
                );

                let pallet_ids = draws.iter().map(|d| d.pallet_id.clone()).collect();
                self.publish(AllocationEvent::committed(
                    run_id.clone(),
                    warehouse_id.to_string(),
                    plan.reference_date,
                    demand_line_ids,
                    pallet_ids,
                ));

                Ok(CommitOutcome {
                    run_id,
                    warehouse_id: warehouse_id.to_string(),
                    status: RunStatus::Committed,
                    committed_records,
                    reason: None,
                    plan,
                })
            }
            Err(err) => {
                let conflict = err.is_conflict();
                let reason = ApiError::from(err).to_string();
                warn!(
                    run_id = %run_id,
                    warehouse_id,
                    conflict,
                    reason = %reason,
                    "分配提交失败, 已回滚"
                );

                self.publish(AllocationEvent::rejected(
                    run_id.clone(),
                    warehouse_id.to_string(),
                    plan.reference_date,
                    demand_line_ids,
                    reason.clone(),
                ));

                Ok(CommitOutcome {
                    run_id,
                    warehouse_id: warehouse_id.to_string(),
                    status: RunStatus::Rejected,
                    committed_records: 0,
                    reason: Some(reason),
                    plan,
                })
            }
        }
    }

    /// 查询已提交运行的分配记录
    pub fn get_run_records(&self, run_id: &str) -> ApiResult<Vec<AllocationRecord>> {
        if self.record_repo.find_run(run_id)?.is_none() {
            return Err(ApiError::NotFound(format!("分配运行(id={})不存在", run_id)));
        }
        Ok(self.record_repo.find_records_by_run(run_id)?)
    }

    // ==========================================
    // 出库托盘规划
    // ==========================================

    /// 按分配记录逐条规划出库托盘
    ///
    /// 单位重量 / 每托件数 优先取物料配置, 缺省取 config_kv 默认值
    pub fn plan_outbound_pallets(
        &self,
        result: &AllocationResult,
        item_config: Option<&ItemConfig>,
    ) -> ApiResult<Vec<OutboundPalletPlan>> {
        let config = self.load_config()?;
        self.plan_outbound_pallets_with(result, item_config, &config)
    }

    /// 出库托盘规划 (显式参数, 不读配置表)
    pub fn plan_outbound_pallets_with(
        &self,
        result: &AllocationResult,
        item_config: Option<&ItemConfig>,
        config: &AllocationConfig,
    ) -> ApiResult<Vec<OutboundPalletPlan>> {
        let weight_per_unit = item_config
            .and_then(|c| c.weight_per_unit)
            .or(config.default_weight_per_unit);
        let units_per_pallet = item_config
            .and_then(|c| c.units_per_pallet)
            .or(config.default_units_per_pallet);

        let (weight_per_unit, units_per_pallet) = match (weight_per_unit, units_per_pallet) {
            (Some(w), Some(u)) => (w, u),
            _ => return Err(EngineError::MissingPalletConfig(result.item_id.clone()).into()),
        };

        result
            .records
            .iter()
            .map(|record| -> ApiResult<OutboundPalletPlan> {
                let base_id = format!("{}-{}", record.demand_line_id, record.pallet_id);
                let pallets = self.pallet_calculator.calculate(
                    record.allocated_quantity,
                    weight_per_unit,
                    units_per_pallet,
                    &base_id,
                )?;
                Ok(OutboundPalletPlan {
                    demand_line_id: record.demand_line_id.clone(),
                    source_pallet_id: record.pallet_id.clone(),
                    batch_number: record.batch_number.clone(),
                    allocated_quantity: record.allocated_quantity,
                    pallets,
                })
            })
            .collect()
    }

    fn publish(&self, event: AllocationEvent) {
        if let Err(e) = self.event_publisher.publish(event) {
            warn!(error = %e, "分配事件发布失败");
        }
    }

    /// 配置快照 (审计用, 读取失败不阻断提交)
    fn config_snapshot(&self, run_id: &str) -> Option<String> {
        match self.config_manager.get_config_snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(run_id, error = %e, "配置快照读取失败, 运行头不记录快照");
                None
            }
        }
    }
}

/// 分配记录按托盘行合并为扣减指令 (同托盘多次扣减合并为一次)
fn build_draw_downs(
    records: &[AllocationRecord],
    revisions: &HashMap<PalletRowKey, i64>,
) -> ApiResult<Vec<PalletDrawDown>> {
    let mut merged: BTreeMap<PalletRowKey, f64> = BTreeMap::new();
    for record in records {
        let key = row_key(
            &record.pallet_id,
            &record.item_id,
            &record.batch_number,
            &record.location_id,
        );
        *merged.entry(key).or_insert(0.0) += record.allocated_quantity;
    }

    merged
        .into_iter()
        .map(|(key, quantity)| -> ApiResult<PalletDrawDown> {
            let expected_revision = revisions.get(&key).copied().ok_or_else(|| {
                ApiError::InternalError(format!("分配记录引用了快照外的托盘: {}", key.0))
            })?;
            let (pallet_id, item_id, batch_number, location_id) = key;
            Ok(PalletDrawDown {
                pallet_id,
                item_id,
                batch_number,
                location_id,
                quantity,
                expected_revision,
            })
        })
        .collect()
}
