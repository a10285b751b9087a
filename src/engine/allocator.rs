// ==========================================
// 托盘库存分配引擎 - 分配核心引擎
// ==========================================
// 职责: 逐需求行从托盘池扣减,生成分配记录
// 输入: 需求行 (按输入顺序) + 托盘池 + 物料配置 + 参考日期
// 输出: 每个需求行一条 AllocationResult (顺序与输入一致)
// ==========================================
// 回退链:
// 1) 指定批次 → 2) 主策略排序 → 3) FIFO 兜底
// 红线: 同一运行内任何托盘不得重复分配 (RunState 双层跟踪)
// 红线: 缺口是数据,不抛错
// ==========================================

mod core;
mod run_state;

#[cfg(test)]
mod tests;

pub use self::core::Allocator;
pub use self::run_state::{PalletKey, RunState};
