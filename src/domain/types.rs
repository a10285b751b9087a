// ==========================================
// 托盘库存分配引擎 - 领域类型定义
// ==========================================
// 职责: 分配策略、行分配结果、汇总状态等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库/导出一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 分配策略 (Allocation Strategy)
// ==========================================
// 红线: 每个需求行只选择一次,行内不交替
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStrategy {
    Batch, // 批次管理 / 指定批次
    Fefo,  // 先到期先出
    Fifo,  // 先进先出
}

impl AllocationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStrategy::Batch => "BATCH",
            AllocationStrategy::Fefo => "FEFO",
            AllocationStrategy::Fifo => "FIFO",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            AllocationStrategy::Batch => "按批次",
            AllocationStrategy::Fefo => "先到期先出",
            AllocationStrategy::Fifo => "先进先出",
        }
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AllocationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BATCH" => Ok(AllocationStrategy::Batch),
            "FEFO" => Ok(AllocationStrategy::Fefo),
            "FIFO" => Ok(AllocationStrategy::Fifo),
            other => Err(format!("未知分配策略: {}", other)),
        }
    }
}

// ==========================================
// 需求行分配结果 (Line Outcome)
// ==========================================
// 展示口径: 全部满足=成功, 部分满足=警告, 未分配=需人工介入(补货)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineOutcome {
    FullyAllocated,     // 全部满足
    PartiallyAllocated, // 部分满足
    Unallocated,        // 未分配
}

impl fmt::Display for LineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineOutcome::FullyAllocated => write!(f, "FULLY_ALLOCATED"),
            LineOutcome::PartiallyAllocated => write!(f, "PARTIALLY_ALLOCATED"),
            LineOutcome::Unallocated => write!(f, "UNALLOCATED"),
        }
    }
}

// ==========================================
// 分配汇总状态 (Allocation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    AllSatisfied,  // 全部需求行满足
    Partial,       // 存在缺口
    NoneAllocated, // 一行都未分配
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationStatus::AllSatisfied => write!(f, "ALL_SATISFIED"),
            AllocationStatus::Partial => write!(f, "PARTIAL"),
            AllocationStatus::NoneAllocated => write!(f, "NONE_ALLOCATED"),
        }
    }
}

// ==========================================
// 分配批次状态 (Run Status)
// ==========================================
// 用途: allocation_run 表落库状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Committed, // 已提交(记录落库 + 库存扣减)
    Rejected,  // 提交失败(已回滚)
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Committed => write!(f, "COMMITTED"),
            RunStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str_is_case_insensitive() {
        assert_eq!("fefo".parse::<AllocationStrategy>().unwrap(), AllocationStrategy::Fefo);
        assert_eq!(" Batch ".parse::<AllocationStrategy>().unwrap(), AllocationStrategy::Batch);
        assert!("lifo".parse::<AllocationStrategy>().is_err());
    }

    #[test]
    fn test_strategy_serde_format() {
        let json = serde_json::to_string(&AllocationStrategy::Fifo).unwrap();
        assert_eq!(json, "\"FIFO\"");
        assert_eq!(AllocationStrategy::Fefo.to_string(), "FEFO");
    }
}
