//! Grosir 批发电商后端服务
//!
//! 提供前台目录、买家下单与后台管理 REST API，并运行优惠券过期与超时订单两个后台 Worker。

use std::sync::Arc;

use axum::{Json, routing::get};
use commerce_api::{
    middleware::build_cors,
    routes,
    state::AppState,
    worker::{CouponExpiryWorker, OrderTimeoutWorker},
};
use grosir_shared::{cache::Cache, config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tracing::{error, info};

const SERVICE_NAME: &str = "grosir-api";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 配置加载失败直接退出：生产环境缺少 JWT 密钥时不能带默认值启动
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());

    // 初始化基础设施
    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }
    let cache = Arc::new(Cache::new(&config.redis)?);

    let state = AppState::new(db.pool().clone(), Some(cache.clone()), &config);

    // GROSIR_CORS_ORIGINS 优先于配置文件 server.cors_origins
    let allowed_origins = std::env::var("GROSIR_CORS_ORIGINS")
        .unwrap_or_else(|_| config.server.cors_origins.clone());
    let cors = build_cors(&allowed_origins, config.is_production());

    if config.worker.enabled {
        spawn_workers(&state, &config);
    } else {
        info!("后台 Worker 已禁用");
    }

    let router = routes::api_routes()
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db.clone();
                let cache_for_ready = cache;
                move || readiness_check(db_for_ready.clone(), cache_for_ready.clone())
            }),
        );
    let app = routes::with_layers(router, state, cors);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

fn spawn_workers(state: &AppState, config: &AppConfig) {
    let coupon_worker = CouponExpiryWorker::new(
        state.coupons.clone(),
        config.worker.coupon_expiry_interval_secs,
        config.worker.batch_size,
    );
    tokio::spawn(async move {
        coupon_worker.run().await;
    });

    let order_worker = OrderTimeoutWorker::new(
        state.orders.clone(),
        config.worker.order_timeout_interval_secs,
        config.worker.batch_size,
    );
    tokio::spawn(async move {
        order_worker.run().await;
    });
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
/// 信号处理器注册失败时该分支永不返回，只依赖另一种信号。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查数据库和 Redis 连接是否可用
async fn readiness_check(db: Database, cache: Arc<Cache>) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();
    let cache_ok = cache.health_check().await.is_ok();
    let all_ok = db_ok && cache_ok;

    Json(serde_json::json!({
        "status": if all_ok { "ok" } else { "degraded" },
        "service": SERVICE_NAME,
        "checks": {
            "database": if db_ok { "ok" } else { "fail" },
            "redis": if cache_ok { "ok" } else { "fail" }
        }
    }))
}
