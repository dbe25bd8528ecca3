//! 优惠券 API 处理器
//!
//! 后台维护优惠券；买家在下单前试算优惠

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use commerce::dto::{
    CouponQuery, CouponQuote, CreateCouponRequest, PageRequest, PageResponse, QuoteCouponRequest,
    UpdateCouponRequest,
};
use commerce::{Claims, CouponView};
use tracing::info;

use super::principal_id;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 优惠券列表
///
/// GET /api/admin/coupons
pub async fn list_coupons(
    State(state): State<AppState>,
    Query(query): Query<CouponQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<CouponView>>>> {
    let coupons = state.coupons.list(query, page).await?;
    Ok(Json(ApiResponse::success(coupons)))
}

/// 创建优惠券
///
/// POST /api/admin/coupons
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(req): Json<CreateCouponRequest>,
) -> Result<Json<ApiResponse<CouponView>>> {
    let coupon = state.coupons.create(req).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

/// 优惠券详情
///
/// GET /api/admin/coupons/{id}
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CouponView>>> {
    let coupon = state.coupons.get(id).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

/// 修改优惠券，已被使用的优惠券不能再改折扣规则
///
/// PUT /api/admin/coupons/{id}
pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCouponRequest>,
) -> Result<Json<ApiResponse<CouponView>>> {
    let coupon = state.coupons.update(id, req).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

/// 删除优惠券，已被使用时拒绝
///
/// DELETE /api/admin/coupons/{id}
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.coupons.delete(id).await?;
    info!(coupon_id = id, "Coupon deleted");
    Ok(Json(ApiResponse::success_empty()))
}

/// 按购物清单试算优惠券
///
/// POST /api/buyer/coupons/quote
pub async fn quote_coupon(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<QuoteCouponRequest>,
) -> Result<Json<ApiResponse<CouponQuote>>> {
    let quote = state.orders.quote_coupon(principal_id(&claims)?, req).await?;
    Ok(Json(ApiResponse::success(quote)))
}
