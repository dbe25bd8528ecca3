//! 订单 API 处理器
//!
//! 买家下单、取消、确认收货与提交支付凭证；后台流转状态与核实支付

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use commerce::dto::{
    AdminOrderQuery, BuyerOrderQuery, CancelOrderRequest, OrderPreview, PageRequest,
    PageResponse, PlaceOrderRequest, SubmitPaymentRequest, TransitionOrderRequest,
    VerifyPaymentRequest,
};
use commerce::{Claims, Order, OrderDetail, Payment};

use super::principal_id;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

// ==================== 买家 ====================

/// 下单预览：计价、运费与优惠，不落库
///
/// POST /api/buyer/orders/preview
pub async fn preview_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<ApiResponse<OrderPreview>>> {
    let preview = state.orders.preview(principal_id(&claims)?, req).await?;
    Ok(Json(ApiResponse::success(preview)))
}

/// 下单
///
/// POST /api/buyer/orders
pub async fn place_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state.orders.place(principal_id(&claims)?, req).await?;
    Ok(Json(ApiResponse::success_with_message(order, "Pesanan berhasil dibuat")))
}

/// 我的订单
///
/// GET /api/buyer/orders
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<BuyerOrderQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<Order>>>> {
    let orders = state
        .orders
        .list_for_buyer(principal_id(&claims)?, query, page)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 我的订单详情
///
/// GET /api/buyer/orders/{id}
pub async fn get_my_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state.orders.get_for_buyer(principal_id(&claims)?, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 取消待支付订单
///
/// POST /api/buyer/orders/{id}/cancel
pub async fn cancel_my_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state
        .orders
        .cancel_by_buyer(principal_id(&claims)?, id, req)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 确认收货
///
/// POST /api/buyer/orders/{id}/confirm
pub async fn confirm_receipt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state.orders.confirm_receipt(principal_id(&claims)?, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 提交支付凭证
///
/// POST /api/buyer/orders/{id}/payments
pub async fn submit_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitPaymentRequest>,
) -> Result<Json<ApiResponse<Payment>>> {
    let payment = state
        .orders
        .submit_payment(principal_id(&claims)?, id, req)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

// ==================== 后台 ====================

/// 订单列表
///
/// GET /api/admin/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<AdminOrderQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<Order>>>> {
    let orders = state.orders.list_admin(query, page).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 订单详情
///
/// GET /api/admin/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state.orders.get_admin(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 流转订单状态（处理中、发货、完成、取消）
///
/// POST /api/admin/orders/{id}/status
pub async fn transition_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<TransitionOrderRequest>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state
        .orders
        .transition(principal_id(&claims)?, id, req)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 核实支付凭证，累计核实金额达到应付总额时订单转为已支付
///
/// POST /api/admin/orders/{id}/payments/{payment_id}/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, payment_id)): Path<(i64, i64)>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<Payment>>> {
    let payment = state
        .orders
        .verify_payment(principal_id(&claims)?, id, payment_id, req)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}
