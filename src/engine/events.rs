// ==========================================
// 托盘库存分配引擎 - 引擎层事件发布
// ==========================================
// 职责: 定义分配事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，下游 (WMS 任务下发/通知) 实现适配器
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 分配事件类型
// ==========================================

/// 分配事件触发类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationEventType {
    /// 分配结果已提交 (记录落库 + 库存扣减)
    AllocationCommitted,
    /// 提交被拒绝 (事务回滚,未提交任何内容)
    AllocationRejected,
}

impl AllocationEventType {
    pub fn as_str(&self) -> &str {
        match self {
            AllocationEventType::AllocationCommitted => "AllocationCommitted",
            AllocationEventType::AllocationRejected => "AllocationRejected",
        }
    }
}

/// 分配事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationEvent {
    /// 分配运行 ID
    pub run_id: String,
    pub event_type: AllocationEventType,
    pub warehouse_id: String,
    /// 分配基准日期
    pub reference_date: NaiveDate,
    /// 受影响的需求行
    pub demand_line_ids: Vec<String>,
    /// 受影响的托盘 (仅提交事件)
    pub pallet_ids: Vec<String>,
    /// 拒绝原因 (仅拒绝事件)
    pub reason: Option<String>,
}

impl AllocationEvent {
    /// 创建提交事件
    pub fn committed(
        run_id: String,
        warehouse_id: String,
        reference_date: NaiveDate,
        demand_line_ids: Vec<String>,
        pallet_ids: Vec<String>,
    ) -> Self {
        Self {
            run_id,
            event_type: AllocationEventType::AllocationCommitted,
            warehouse_id,
            reference_date,
            demand_line_ids,
            pallet_ids,
            reason: None,
        }
    }

    /// 创建拒绝事件
    pub fn rejected(
        run_id: String,
        warehouse_id: String,
        reference_date: NaiveDate,
        demand_line_ids: Vec<String>,
        reason: String,
    ) -> Self {
        Self {
            run_id,
            event_type: AllocationEventType::AllocationRejected,
            warehouse_id,
            reference_date,
            demand_line_ids,
            pallet_ids: Vec::new(),
            reason: Some(reason),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 分配事件发布者 Trait
///
/// Engine 层定义，外部集成实现
///
/// # 返回
/// - `Ok(task_id)`: 任务 ID（如果支持）或空字符串
/// - `Err`: 发布失败 (不影响已提交的事务)
pub trait AllocationEventPublisher: Send + Sync {
    fn publish(&self, event: AllocationEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl AllocationEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: AllocationEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - run_id={}, event_type={}",
            event.run_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn AllocationEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn AllocationEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: AllocationEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - run_id={}, event_type={}",
                    event.run_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
