//! 超时订单处理 Worker
//!
//! 定期取消超过支付时限仍未付款的订单，状态变更走订单状态机并写入历史

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use grosir_shared::observability::metrics;
use tracing::{error, info};

use crate::state::OrderSvc;

/// 超时未支付订单 Worker
pub struct OrderTimeoutWorker {
    orders: Arc<OrderSvc>,
    poll_interval: Duration,
    batch_size: i64,
}

impl OrderTimeoutWorker {
    pub fn new(orders: Arc<OrderSvc>, poll_interval_secs: u64, batch_size: i64) -> Self {
        Self {
            orders,
            poll_interval: Duration::from_secs(poll_interval_secs),
            batch_size,
        }
    }

    pub async fn run(&self) {
        info!(
            poll_interval = ?self.poll_interval,
            batch_size = self.batch_size,
            "OrderTimeoutWorker 已启动"
        );
        loop {
            self.run_once().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 执行一轮扫描，返回本轮取消的订单数
    pub async fn run_once(&self) -> u64 {
        let cancelled = match self
            .orders
            .cancel_expired_unpaid(Utc::now(), self.batch_size)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "超时订单处理出错");
                0
            }
        };

        metrics::set_worker_last_run("order_timeout_worker");
        cancelled
    }
}
