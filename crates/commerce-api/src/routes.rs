//! 路由配置模块
//!
//! 按访问级别分组：访问控制由认证中间件根据路径前缀完成

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use grosir_shared::observability::middleware as obs_middleware;
use tower_http::cors::CorsLayer;

use crate::middleware::{auth_middleware, security_headers};
use crate::{handlers, state::AppState};

/// 公开路由（无需认证）
///
/// 挂载在 /api/public 下
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // 行政区划
        .route(
            "/regions/provinces",
            get(handlers::region::list_provinces),
        )
        .route(
            "/regions/provinces/{id}/cities",
            get(handlers::region::list_cities),
        )
        .route(
            "/regions/cities/{id}/districts",
            get(handlers::region::list_districts),
        )
        .route(
            "/regions/districts/{id}/sub-districts",
            get(handlers::region::list_sub_districts),
        )
        .route(
            "/regions/sub-districts/{id}/path",
            get(handlers::region::resolve_path),
        )
        // 商品目录
        .route(
            "/categories",
            get(handlers::catalog::public_category_tree),
        )
        .route(
            "/categories/{slug}",
            get(handlers::catalog::public_category),
        )
        .route(
            "/master-data/{kind}",
            get(handlers::catalog::public_master_data),
        )
        .route("/products", get(handlers::product::search_public))
        .route("/products/{key}", get(handlers::product::public_product))
        .route(
            "/products/{key}/reviews",
            get(handlers::review::product_reviews),
        )
        // 内容
        .route("/banners", get(handlers::content::visible_banners))
        .route("/faqs", get(handlers::content::public_faqs))
        .route("/videos", get(handlers::content::public_videos))
        .route("/blog-posts", get(handlers::content::published_posts))
        .route("/blog-posts/{slug}", get(handlers::content::published_post))
}

/// 认证路由
///
/// 挂载在 /api/auth 下；登出、当前主体与修改密码需要登录
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(handlers::auth::admin_login))
        .route("/admin/refresh", post(handlers::auth::admin_refresh))
        .route("/buyer/register", post(handlers::auth::register_buyer))
        .route("/buyer/login", post(handlers::auth::buyer_login))
        .route("/buyer/refresh", post(handlers::auth::buyer_refresh))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .route("/change-password", post(handlers::auth::change_password))
}

/// 买家路由
///
/// 挂载在 /api/buyer 下
pub fn buyer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(handlers::account::get_profile).put(handlers::account::update_profile),
        )
        // 收货地址
        .route(
            "/addresses",
            get(handlers::address::list_addresses).post(handlers::address::create_address),
        )
        .route(
            "/addresses/{id}",
            get(handlers::address::get_address)
                .put(handlers::address::update_address)
                .delete(handlers::address::delete_address),
        )
        .route(
            "/addresses/{id}/default",
            put(handlers::address::set_default_address),
        )
        // 下单
        .route("/coupons/quote", post(handlers::coupon::quote_coupon))
        .route("/orders/preview", post(handlers::order::preview_order))
        .route(
            "/orders",
            get(handlers::order::list_my_orders).post(handlers::order::place_order),
        )
        .route("/orders/{id}", get(handlers::order::get_my_order))
        .route("/orders/{id}/cancel", post(handlers::order::cancel_my_order))
        .route("/orders/{id}/confirm", post(handlers::order::confirm_receipt))
        .route("/orders/{id}/payments", post(handlers::order::submit_payment))
        // 评价
        .route(
            "/reviews",
            get(handlers::review::list_my_reviews).post(handlers::review::submit_review),
        )
        .route(
            "/reviews/{id}",
            axum::routing::delete(handlers::review::delete_my_review),
        )
}

/// 账号管理路由
fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admins",
            get(handlers::account::list_admins).post(handlers::account::create_admin),
        )
        .route("/admins/{id}", get(handlers::account::get_admin))
        .route(
            "/admins/{id}/status",
            put(handlers::account::set_admin_status),
        )
        .route("/buyers", get(handlers::account::list_buyers))
        .route("/buyers/{id}", get(handlers::account::get_buyer))
        .route(
            "/buyers/{id}/status",
            put(handlers::account::set_buyer_status),
        )
}

/// 商品目录管理路由
fn catalog_routes() -> Router<AppState> {
    Router::new()
        // 分类
        .route(
            "/categories",
            get(handlers::catalog::admin_category_tree).post(handlers::catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::catalog::get_category)
                .put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        // 品牌 / 成色 / 包装状况
        .route(
            "/master-data/{kind}",
            get(handlers::catalog::list_master_data).post(handlers::catalog::create_master_data),
        )
        .route(
            "/master-data/{kind}/{id}",
            get(handlers::catalog::get_master_data)
                .put(handlers::catalog::update_master_data)
                .delete(handlers::catalog::delete_master_data),
        )
        // 仓库
        .route(
            "/warehouses",
            get(handlers::catalog::list_warehouses).post(handlers::catalog::create_warehouse),
        )
        .route(
            "/warehouses/{id}",
            get(handlers::catalog::get_warehouse)
                .put(handlers::catalog::update_warehouse)
                .delete(handlers::catalog::delete_warehouse),
        )
        // 商品
        .route(
            "/products",
            get(handlers::product::search_admin).post(handlers::product::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::product::get_product)
                .put(handlers::product::update_product)
                .delete(handlers::product::delete_product),
        )
        .route("/products/{id}/stock", post(handlers::product::adjust_stock))
        // 排序
        .route("/reorder/{table}/{id}", post(handlers::reorder::move_item))
}

/// 交易管理路由：优惠券、订单、评价
fn trade_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/coupons",
            get(handlers::coupon::list_coupons).post(handlers::coupon::create_coupon),
        )
        .route(
            "/coupons/{id}",
            get(handlers::coupon::get_coupon)
                .put(handlers::coupon::update_coupon)
                .delete(handlers::coupon::delete_coupon),
        )
        .route("/orders", get(handlers::order::list_orders))
        .route("/orders/{id}", get(handlers::order::get_order))
        .route("/orders/{id}/status", post(handlers::order::transition_order))
        .route(
            "/orders/{id}/payments/{payment_id}/verify",
            post(handlers::order::verify_payment),
        )
        .route("/reviews", get(handlers::review::list_reviews))
        .route("/reviews/{id}", get(handlers::review::get_review))
        .route(
            "/reviews/{id}/moderate",
            post(handlers::review::moderate_review),
        )
}

/// 内容管理路由
fn content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/banners",
            get(handlers::content::list_banners).post(handlers::content::create_banner),
        )
        .route(
            "/banners/{id}",
            get(handlers::content::get_banner)
                .put(handlers::content::update_banner)
                .delete(handlers::content::delete_banner),
        )
        .route(
            "/faqs",
            get(handlers::content::list_faqs).post(handlers::content::create_faq),
        )
        .route(
            "/faqs/{id}",
            get(handlers::content::get_faq)
                .put(handlers::content::update_faq)
                .delete(handlers::content::delete_faq),
        )
        .route(
            "/videos",
            get(handlers::content::list_videos).post(handlers::content::create_video),
        )
        .route(
            "/videos/{id}",
            get(handlers::content::get_video)
                .put(handlers::content::update_video)
                .delete(handlers::content::delete_video),
        )
        .route(
            "/blog-posts",
            get(handlers::content::list_posts).post(handlers::content::create_post),
        )
        .route(
            "/blog-posts/{id}",
            get(handlers::content::get_post)
                .put(handlers::content::update_post)
                .delete(handlers::content::delete_post),
        )
}

/// 后台路由
///
/// 挂载在 /api/admin 下
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .merge(account_routes())
        .merge(catalog_routes())
        .merge(trade_routes())
        .merge(content_routes())
}

/// 全部 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/public", public_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/buyer", buyer_routes())
        .nest("/api/admin", admin_routes())
}

/// 挂载全局中间件并注入状态
///
/// 由外到内：request_id → http_tracing → CORS → 安全头 → 认证。
/// CORS 必须在认证外层，预检请求不带 Token
pub fn with_layers(router: Router<AppState>, state: AppState, cors: CorsLayer) -> Router {
    router
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
