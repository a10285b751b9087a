use super::*;
use crate::domain::allocation::AllocationResult;
use crate::domain::demand::DemandLine;
use crate::domain::inventory::{InventoryUnit, ItemConfig};
use crate::domain::types::AllocationStrategy;
use crate::engine::consolidator::PalletPoolConsolidator;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

// ==========================================
// 测试辅助函数
// ==========================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn received(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// 创建测试用托盘
fn create_test_pallet(
    pallet_id: &str,
    item_id: &str,
    batch: Option<&str>,
    mfg: Option<&str>,
    expiry: Option<&str>,
    qty: f64,
) -> InventoryUnit {
    InventoryUnit {
        pallet_id: pallet_id.to_string(),
        item_id: item_id.to_string(),
        item_code: format!("SKU-{}", item_id),
        batch_number: batch.map(str::to_string),
        manufacturing_date: mfg.map(date),
        expiry_date: expiry.map(date),
        location_id: "L1".to_string(),
        on_hand_quantity: qty,
        available_quantity: qty,
        received_at: received("2024-01-01 08:00:00"),
    }
}

/// 创建测试用需求行
fn create_test_line(line_id: &str, item_id: &str, qty: f64, requested: Option<&str>) -> DemandLine {
    DemandLine {
        demand_line_id: line_id.to_string(),
        order_id: "SO-001".to_string(),
        item_id: item_id.to_string(),
        item_code: format!("SKU-{}", item_id),
        item_name: format!("物料{}", item_id),
        ordered_quantity: qty,
        unit_of_measure: "CS".to_string(),
        requested_batch_number: requested.map(str::to_string),
    }
}

fn configs(entries: &[(&str, bool)]) -> HashMap<String, ItemConfig> {
    entries
        .iter()
        .map(|(id, tracking)| (id.to_string(), ItemConfig::new(id, *tracking)))
        .collect()
}

fn run(
    lines: &[DemandLine],
    units: &[InventoryUnit],
    item_configs: &HashMap<String, ItemConfig>,
) -> Vec<AllocationResult> {
    let pool = PalletPoolConsolidator::new().consolidate(units);
    Allocator::new().allocate_all(lines, &pool, item_configs, today())
}

fn draws(result: &AllocationResult) -> Vec<(String, f64)> {
    result
        .records
        .iter()
        .map(|r| (r.batch_number.clone().unwrap_or_default(), r.allocated_quantity))
        .collect()
}

// ==========================================
// 策略顺序
// ==========================================

#[test]
fn test_fefo_draws_soonest_valid_expiry_first() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("MAR"), None, Some("2025-03-01"), 5.0),
        create_test_pallet("P2", "ITEM1", Some("JAN"), None, Some("2025-01-10"), 5.0),
        create_test_pallet("P3", "ITEM1", Some("OLD"), None, Some("2024-06-01"), 5.0),
    ];
    let lines = vec![create_test_line("DL1", "ITEM1", 8.0, None)];

    let results = run(&lines, &units, &configs(&[("ITEM1", false)]));

    assert_eq!(results[0].strategy, AllocationStrategy::Fefo);
    assert_eq!(draws(&results[0]), vec![("JAN".to_string(), 5.0), ("MAR".to_string(), 3.0)]);
    assert!(results[0].is_fully_allocated);
    assert!(results[0].records.iter().all(|r| r.pallet_id != "P3"));
}

#[test]
fn test_fifo_draws_oldest_manufacturing_first() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("JUN"), Some("2024-06-01"), None, 5.0),
        create_test_pallet("P2", "ITEM1", Some("JAN"), Some("2024-01-01"), None, 2.0),
    ];
    let lines = vec![create_test_line("DL1", "ITEM1", 3.0, None)];

    let results = run(&lines, &units, &configs(&[("ITEM1", false)]));

    assert_eq!(results[0].strategy, AllocationStrategy::Fifo);
    assert_eq!(draws(&results[0]), vec![("JAN".to_string(), 2.0), ("JUN".to_string(), 1.0)]);
    assert_eq!(results[0].shortfall, 0.0);
}

#[test]
fn test_specific_batch_then_strategy_fallback() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("B1"), Some("2024-01-01"), None, 10.0),
        create_test_pallet("P2", "ITEM1", Some("B2"), Some("2024-06-01"), None, 2.0),
    ];
    let lines = vec![create_test_line("DL1", "ITEM1", 4.0, Some("b2"))];

    let results = run(&lines, &units, &configs(&[("ITEM1", false)]));

    assert_eq!(results[0].strategy, AllocationStrategy::Batch);
    assert_eq!(draws(&results[0]), vec![("B2".to_string(), 2.0), ("B1".to_string(), 2.0)]);
    assert_eq!(results[0].records[0].strategy, AllocationStrategy::Batch);
    assert_eq!(results[0].records[1].strategy, AllocationStrategy::Fifo);
}

#[test]
fn test_unknown_requested_batch_degrades_to_strategy() {
    let units = vec![create_test_pallet("P1", "ITEM1", Some("B1"), Some("2024-01-01"), None, 10.0)];
    let lines = vec![create_test_line("DL1", "ITEM1", 4.0, Some("NOPE"))];

    let results = run(&lines, &units, &configs(&[("ITEM1", false)]));

    assert_eq!(results[0].strategy, AllocationStrategy::Fifo);
    assert_eq!(results[0].total_allocated, 4.0);
}

#[test]
fn test_batch_tracking_uses_lexicographic_order() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("B2"), Some("2024-01-01"), None, 3.0),
        create_test_pallet("P2", "ITEM1", Some("B1"), Some("2024-06-01"), None, 3.0),
    ];
    let lines = vec![create_test_line("DL1", "ITEM1", 4.0, None)];

    let results = run(&lines, &units, &configs(&[("ITEM1", true)]));

    assert_eq!(results[0].strategy, AllocationStrategy::Batch);
    assert_eq!(draws(&results[0]), vec![("B1".to_string(), 3.0), ("B2".to_string(), 1.0)]);
}

#[test]
fn test_missing_config_infers_strategy() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("LATE"), None, Some("2025-09-01"), 5.0),
        create_test_pallet("P2", "ITEM1", Some("SOON"), None, Some("2025-02-01"), 5.0),
    ];
    let lines = vec![create_test_line("DL1", "ITEM1", 2.0, None)];

    let results = run(&lines, &units, &HashMap::new());

    assert_eq!(results[0].strategy, AllocationStrategy::Fefo);
    assert!(results[0].strategy_reason.starts_with("CONFIG_MISSING"));
    assert_eq!(draws(&results[0]), vec![("SOON".to_string(), 2.0)]);
}

// ==========================================
// 托盘级扣减
// ==========================================

#[test]
fn test_pallets_drawn_in_group_order() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("B1"), None, None, 2.0),
        create_test_pallet("P2", "ITEM1", Some("B1"), None, None, 2.0),
        create_test_pallet("P3", "ITEM1", Some("B1"), None, None, 2.0),
    ];
    let lines = vec![create_test_line("DL1", "ITEM1", 5.0, None)];

    let results = run(&lines, &units, &configs(&[("ITEM1", false)]));

    let pallets: Vec<(&str, f64)> = results[0]
        .records
        .iter()
        .map(|r| (r.pallet_id.as_str(), r.allocated_quantity))
        .collect();
    assert_eq!(pallets, vec![("P1", 2.0), ("P2", 2.0), ("P3", 1.0)]);
}

#[test]
fn test_later_lines_see_earlier_draw_down() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("B1"), Some("2024-01-01"), None, 4.0),
        create_test_pallet("P2", "ITEM1", Some("B2"), Some("2024-02-01"), None, 4.0),
    ];
    let lines = vec![
        create_test_line("DL1", "ITEM1", 3.0, None),
        create_test_line("DL2", "ITEM1", 3.0, None),
        create_test_line("DL3", "ITEM1", 3.0, None),
    ];

    let results = run(&lines, &units, &configs(&[("ITEM1", false)]));

    assert_eq!(draws(&results[0]), vec![("B1".to_string(), 3.0)]);
    assert_eq!(draws(&results[1]), vec![("B1".to_string(), 1.0), ("B2".to_string(), 2.0)]);
    assert_eq!(draws(&results[2]), vec![("B2".to_string(), 2.0)]);
    assert_eq!(results[2].shortfall, 1.0);
    assert!(!results[2].is_fully_allocated);
}

#[test]
fn test_partially_available_pallet_is_respected() {
    let mut pallet = create_test_pallet("P1", "ITEM1", Some("B1"), None, None, 10.0);
    pallet.available_quantity = 3.0;
    let lines = vec![create_test_line("DL1", "ITEM1", 5.0, None)];

    let results = run(&lines, &[pallet], &configs(&[("ITEM1", false)]));

    assert_eq!(results[0].total_allocated, 3.0);
    assert_eq!(results[0].shortfall, 2.0);
}

#[test]
fn test_duplicate_pallet_id_across_batches_tracked_separately() {
    let units = vec![
        create_test_pallet("DUP", "ITEM1", Some("B1"), Some("2024-01-01"), None, 2.0),
        create_test_pallet("DUP", "ITEM1", Some("B2"), Some("2024-02-01"), None, 2.0),
    ];
    let lines = vec![create_test_line("DL1", "ITEM1", 4.0, None)];

    let results = run(&lines, &units, &configs(&[("ITEM1", false)]));

    assert_eq!(results[0].total_allocated, 4.0);
}

#[test]
fn test_item_code_mismatch_is_skipped() {
    let mut pallet = create_test_pallet("P1", "ITEM1", Some("B1"), None, None, 10.0);
    pallet.item_code = "OTHER".to_string();
    let lines = vec![create_test_line("DL1", "ITEM1", 5.0, None)];

    let results = run(&lines, &[pallet], &configs(&[("ITEM1", false)]));

    assert_eq!(results[0].total_allocated, 0.0);
}

// ==========================================
// 边界与不变量
// ==========================================

#[test]
fn test_zero_availability_is_not_an_error() {
    let lines = vec![create_test_line("DL1", "ITEM9", 7.0, None)];

    let results = run(&lines, &[], &configs(&[("ITEM9", false)]));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].total_allocated, 0.0);
    assert_eq!(results[0].shortfall, 7.0);
    assert!(!results[0].is_fully_allocated);
    assert!(results[0].records.is_empty());
}

#[test]
fn test_fifo_last_resort_can_be_disabled() {
    let units = vec![create_test_pallet("P1", "ITEM1", Some("B1"), None, Some("2025-06-01"), 5.0)];
    let lines = vec![create_test_line("DL1", "ITEM1", 3.0, None)];
    let pool = PalletPoolConsolidator::new().consolidate(&units);
    let config = crate::config::AllocationConfig {
        enable_fifo_last_resort: false,
        ..Default::default()
    };

    let results =
        Allocator::with_config(&config).allocate_all(&lines, &pool, &configs(&[("ITEM1", false)]), today());

    assert_eq!(results[0].strategy, AllocationStrategy::Fefo);
    assert_eq!(results[0].total_allocated, 3.0);
}

#[test]
fn test_conservation_and_shortfall_arithmetic() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("A"), Some("2024-01-01"), Some("2025-05-01"), 3.5),
        create_test_pallet("P2", "ITEM1", Some("A"), Some("2024-01-01"), Some("2025-05-01"), 1.5),
        create_test_pallet("P3", "ITEM1", Some("B"), Some("2024-03-01"), None, 6.0),
        create_test_pallet("P4", "ITEM2", Some("C"), Some("2024-02-01"), None, 2.0),
        create_test_pallet("P5", "ITEM2", None, None, None, 1.0),
    ];
    let lines = vec![
        create_test_line("DL1", "ITEM1", 4.0, Some("B")),
        create_test_line("DL2", "ITEM2", 1.5, None),
        create_test_line("DL3", "ITEM1", 6.0, None),
        create_test_line("DL4", "ITEM2", 9.0, Some("C")),
        create_test_line("DL5", "ITEM1", 2.0, None),
    ];

    let results = run(&lines, &units, &configs(&[("ITEM1", false), ("ITEM2", true)]));

    // 结果完整且同序
    assert_eq!(results.len(), lines.len());
    for (line, result) in lines.iter().zip(results.iter()) {
        assert_eq!(line.demand_line_id, result.demand_line_id);
        let sum: f64 = result.records.iter().map(|r| r.allocated_quantity).sum();
        assert!((result.total_allocated - sum).abs() < 1e-9);
        assert!(result.shortfall >= 0.0);
        assert!((result.total_allocated + result.shortfall - result.ordered_quantity).abs() < 1e-9);
        assert!(result.records.iter().all(|r| r.allocated_quantity > 0.0));
    }

    // 托盘级守恒
    let mut per_pallet: HashMap<String, f64> = HashMap::new();
    let mut per_batch: HashMap<String, f64> = HashMap::new();
    for record in results.iter().flat_map(|r| r.records.iter()) {
        *per_pallet.entry(record.pallet_id.clone()).or_insert(0.0) += record.allocated_quantity;
        *per_batch.entry(record.batch_key().to_string()).or_insert(0.0) += record.allocated_quantity;
    }
    for unit in &units {
        let used = per_pallet.get(&unit.pallet_id).copied().unwrap_or(0.0);
        assert!(used <= unit.available_quantity + 1e-9, "托盘 {} 超额分配", unit.pallet_id);
    }

    // 批次级守恒
    let pool = PalletPoolConsolidator::new().consolidate(&units);
    for batch in pool.batches() {
        let used = per_batch.get(&batch.key.to_string()).copied().unwrap_or(0.0);
        assert!(used <= batch.available_quantity + 1e-9, "批次 {} 超额分配", batch.key);
    }

    // 总量: 库存 14 全部被吃掉,缺口落在后面的行
    let total: f64 = results.iter().map(|r| r.total_allocated).sum();
    assert!((total - 14.0).abs() < 1e-9);
}

#[test]
fn test_rerun_on_same_snapshot_is_identical() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("A"), None, Some("2025-05-01"), 3.0),
        create_test_pallet("P2", "ITEM1", Some("B"), Some("2024-03-01"), None, 6.0),
    ];
    let lines = vec![
        create_test_line("DL1", "ITEM1", 4.0, None),
        create_test_line("DL2", "ITEM1", 4.0, Some("A")),
    ];
    let item_configs = configs(&[("ITEM1", false)]);

    let first = run(&lines, &units, &item_configs);
    let second = run(&lines, &units, &item_configs);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_run_state_tracks_both_levels() {
    let unit = create_test_pallet("P1", "ITEM1", Some("B1"), None, None, 5.0);
    let pool = PalletPoolConsolidator::new().consolidate(std::slice::from_ref(&unit));
    let batch = pool.batch(&unit.batch_key()).unwrap();
    let mut state = RunState::new();

    state.record_draw(&unit, 2.0);
    state.record_draw(&unit, 1.0);

    assert_eq!(state.pallet_allocated(&unit), 3.0);
    assert_eq!(state.batch_allocated(&unit.batch_key()), 3.0);
    assert_eq!(state.batch_remaining(batch), 2.0);
    assert_eq!(state.pallet_remaining(&unit), 2.0);
}

// ==========================================
// 数量容差
// ==========================================

fn run_with_epsilon(
    lines: &[DemandLine],
    units: &[InventoryUnit],
    quantity_epsilon: f64,
) -> Vec<AllocationResult> {
    let pool = PalletPoolConsolidator::new().consolidate(units);
    let config = crate::config::AllocationConfig {
        quantity_epsilon,
        ..Default::default()
    };
    Allocator::with_config(&config).allocate_all(lines, &pool, &configs(&[("ITEM1", false)]), today())
}

#[test]
fn test_large_epsilon_does_not_hide_shortfall() {
    let units = vec![create_test_pallet("P1", "ITEM1", Some("B1"), None, None, 1.0)];
    let lines = vec![create_test_line("DL1", "ITEM1", 1.005, None)];

    let results = run_with_epsilon(&lines, &units, 0.01);
    let result = &results[0];

    assert_eq!(result.total_allocated, 1.0);
    assert!(result.shortfall > 0.004);
    assert!(!result.is_fully_allocated);
    assert!((result.total_allocated + result.shortfall - result.ordered_quantity).abs() < 1e-12);
}

#[test]
fn test_fractional_quantities_near_tolerance() {
    let units = vec![
        create_test_pallet("P1", "ITEM1", Some("B1"), Some("2024-01-01"), None, 0.1),
        create_test_pallet("P2", "ITEM1", Some("B2"), Some("2024-02-01"), None, 0.2),
        create_test_pallet("P3", "ITEM1", Some("B3"), Some("2024-03-01"), None, 0.0000005),
    ];
    let lines = vec![
        create_test_line("DL1", "ITEM1", 0.3, None),
        create_test_line("DL2", "ITEM1", 0.000001, None),
    ];

    for epsilon in [0.0, 1e-9, 0.5] {
        let results = run_with_epsilon(&lines, &units, epsilon);

        // 0.1 + 0.2 的浮点残差被吸收
        assert!(results[0].is_fully_allocated, "epsilon={}", epsilon);
        assert_eq!(results[0].shortfall, 0.0);

        // 微量缺口仍是缺口
        let second = &results[1];
        assert!((second.total_allocated - 0.0000005).abs() < 1e-12);
        assert!(!second.is_fully_allocated, "epsilon={}", epsilon);
        assert!((second.total_allocated + second.shortfall - second.ordered_quantity).abs() < 1e-15);
    }
}
