//! 商品 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State},
};
use commerce::ProductDetail;
use commerce::dto::{
    AdjustStockRequest, CreateProductRequest, PageRequest, PageResponse, ProductQuery,
    UpdateProductRequest,
};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 库存调整结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub product_id: i64,
    pub stock: i32,
}

/// 前台商品检索（仅上架商品）
///
/// GET /api/public/products
pub async fn search_public(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<ProductDetail>>>> {
    let products = state.products.search_public(query, page).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// 按 slug 获取前台商品
///
/// GET /api/public/products/{key}
pub async fn public_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = state.products.get_public_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// 后台商品检索
///
/// GET /api/admin/products
pub async fn search_admin(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<ProductDetail>>>> {
    let products = state.products.search_admin(query, page).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// 创建商品
///
/// POST /api/admin/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = state.products.create(req).await?;
    info!(product_id = product.product.id, sku = %product.product.sku, "Product created");
    Ok(Json(ApiResponse::success(product)))
}

/// 商品详情
///
/// GET /api/admin/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = state.products.get(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// 修改商品
///
/// PUT /api/admin/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = state.products.update(id, req).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// 删除商品，已有订单引用时拒绝
///
/// DELETE /api/admin/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.products.delete(id).await?;
    info!(product_id = id, "Product deleted");
    Ok(Json(ApiResponse::success_empty()))
}

/// 调整库存
///
/// POST /api/admin/products/{id}/stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<StockResponse>>> {
    let stock = state.products.adjust_stock(id, req).await?;
    Ok(Json(ApiResponse::success(StockResponse {
        product_id: id,
        stock,
    })))
}
