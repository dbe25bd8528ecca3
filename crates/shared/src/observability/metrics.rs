//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册指标描述（出现在 /metrics 的 HELP 注释中）
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    metrics::describe_counter!("orders_placed_total", "Total number of placed orders");
    metrics::describe_counter!("order_value_idr_total", "Sum of placed order totals in IDR");
    metrics::describe_counter!(
        "order_status_transitions_total",
        "Total number of order status transitions"
    );
    metrics::describe_counter!("coupon_redemptions_total", "Total number of coupon usages");
    metrics::describe_counter!("coupons_expired_total", "Coupons deactivated by the expiry worker");
    metrics::describe_counter!("auth_logins_total", "Login attempts by principal kind and result");
    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last background worker iteration"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// 记录下单
pub fn record_order_placed(total_idr: i64, with_coupon: bool) {
    metrics::counter!(
        "orders_placed_total",
        "coupon" => if with_coupon { "yes" } else { "no" }
    )
    .increment(1);
    metrics::counter!("order_value_idr_total").increment(total_idr.max(0) as u64);
}

/// 记录订单状态流转
pub fn record_order_transition(from: &str, to: &str) {
    metrics::counter!(
        "order_status_transitions_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

/// 记录优惠券核销
pub fn record_coupon_redemption(code: &str) {
    metrics::counter!("coupon_redemptions_total", "code" => code.to_string()).increment(1);
}

/// 记录过期优惠券数量
pub fn record_coupons_expired(count: u64) {
    metrics::counter!("coupons_expired_total").increment(count);
}

/// 记录登录结果
pub fn record_login(kind: &str, success: bool) {
    metrics::counter!(
        "auth_logins_total",
        "kind" => kind.to_string(),
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

/// 记录 Worker 最近一次运行时间
pub fn set_worker_last_run(worker: &str) {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    metrics::gauge!("worker_last_run_timestamp", "worker" => worker.to_string()).set(now);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 未安装 recorder 时记录指标应为 no-op
    #[test]
    fn test_record_functions_do_not_panic() {
        record_http_request("GET", "/api/public/products", 200, 0.012);
        record_order_placed(1_250_000, true);
        record_order_transition("pending_payment", "paid");
        record_coupon_redemption("GROSIR10");
        record_coupons_expired(3);
        record_login("buyer", false);
        set_worker_last_run("coupon_expiry_worker");
    }
}
