//! 商品评价 API 处理器

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use commerce::dto::{
    ModerateReviewRequest, PageRequest, PageResponse, ProductReviews, ReviewQuery,
    SubmitReviewRequest,
};
use commerce::{Claims, Review};

use super::principal_id;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 商品评价页：评分汇总与已通过审核的评价
///
/// `key` 可以是商品 ID 或 slug
///
/// GET /api/public/products/{key}/reviews
pub async fn product_reviews(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<ProductReviews>>> {
    let product_id = match key.parse::<i64>() {
        Ok(id) => id,
        Err(_) => state.products.get_public_by_slug(&key).await?.product.id,
    };
    let reviews = state.reviews.product_reviews(product_id, page).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

/// 提交评价，订单完成后才能评价
///
/// POST /api/buyer/reviews
pub async fn submit_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<Json<ApiResponse<Review>>> {
    let review = state.reviews.submit(principal_id(&claims)?, req).await?;
    Ok(Json(ApiResponse::success_with_message(review, "Ulasan terkirim dan menunggu moderasi")))
}

/// 我的评价
///
/// GET /api/buyer/reviews
pub async fn list_my_reviews(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<Review>>>> {
    let reviews = state.reviews.list_mine(principal_id(&claims)?, page).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

/// 删除待审核的评价
///
/// DELETE /api/buyer/reviews/{id}
pub async fn delete_my_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.reviews.delete_own(principal_id(&claims)?, id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

/// 后台评价列表
///
/// GET /api/admin/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<Review>>>> {
    let reviews = state.reviews.list_admin(query, page).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

/// 评价详情
///
/// GET /api/admin/reviews/{id}
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Review>>> {
    let review = state.reviews.get(id).await?;
    Ok(Json(ApiResponse::success(review)))
}

/// 审核评价
///
/// POST /api/admin/reviews/{id}/moderate
pub async fn moderate_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<ModerateReviewRequest>,
) -> Result<Json<ApiResponse<Review>>> {
    let review = state
        .reviews
        .moderate(principal_id(&claims)?, id, req)
        .await?;
    Ok(Json(ApiResponse::success(review)))
}
