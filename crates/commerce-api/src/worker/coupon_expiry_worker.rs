//! 优惠券过期处理 Worker
//!
//! 定期把已过有效期但仍处于启用状态的优惠券停用。
//! 停用语句带批量上限，多实例部署时重复执行也只会影响尚未停用的行

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use grosir_shared::observability::metrics;
use tracing::{error, info};

use crate::state::CouponSvc;

/// 优惠券过期 Worker
pub struct CouponExpiryWorker {
    coupons: Arc<CouponSvc>,
    /// 轮询间隔（建议 300 秒）
    poll_interval: Duration,
    /// 每批停用的最大数量
    batch_size: i64,
}

impl CouponExpiryWorker {
    pub fn new(coupons: Arc<CouponSvc>, poll_interval_secs: u64, batch_size: i64) -> Self {
        Self {
            coupons,
            poll_interval: Duration::from_secs(poll_interval_secs),
            batch_size,
        }
    }

    /// 主循环：持续处理直到进程退出
    pub async fn run(&self) {
        info!(
            poll_interval = ?self.poll_interval,
            batch_size = self.batch_size,
            "CouponExpiryWorker 已启动"
        );
        loop {
            self.run_once().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 执行一轮扫描，返回本轮停用的数量
    pub async fn run_once(&self) -> u64 {
        let expired = match self.coupons.expire_due(Utc::now(), self.batch_size).await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "优惠券过期处理出错");
                0
            }
        };

        metrics::set_worker_last_run("coupon_expiry_worker");
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::lazy_state;

    #[tokio::test]
    async fn test_new_uses_given_interval() {
        let state = lazy_state();
        let worker = CouponExpiryWorker::new(state.coupons, 120, 50);
        assert_eq!(worker.poll_interval, Duration::from_secs(120));
        assert_eq!(worker.batch_size, 50);
    }
}
