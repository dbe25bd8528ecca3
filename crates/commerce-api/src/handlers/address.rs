//! 收货地址 API 处理器

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use commerce::Claims;
use commerce::dto::{AddressRequest, AddressResponse};

use super::principal_id;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 我的地址列表
///
/// GET /api/buyer/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<AddressResponse>>>> {
    let addresses = state.addresses.list(principal_id(&claims)?).await?;
    Ok(Json(ApiResponse::success(addresses)))
}

/// 新建地址
///
/// POST /api/buyer/addresses
pub async fn create_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<ApiResponse<AddressResponse>>> {
    let address = state.addresses.create(principal_id(&claims)?, req).await?;
    Ok(Json(ApiResponse::success(address)))
}

/// 地址详情
///
/// GET /api/buyer/addresses/{id}
pub async fn get_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AddressResponse>>> {
    let address = state.addresses.get(principal_id(&claims)?, id).await?;
    Ok(Json(ApiResponse::success(address)))
}

/// 修改地址
///
/// PUT /api/buyer/addresses/{id}
pub async fn update_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<ApiResponse<AddressResponse>>> {
    let address = state.addresses.update(principal_id(&claims)?, id, req).await?;
    Ok(Json(ApiResponse::success(address)))
}

/// 设为默认地址
///
/// PUT /api/buyer/addresses/{id}/default
pub async fn set_default_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AddressResponse>>> {
    let address = state.addresses.set_default(principal_id(&claims)?, id).await?;
    Ok(Json(ApiResponse::success(address)))
}

/// 删除地址
///
/// DELETE /api/buyer/addresses/{id}
pub async fn delete_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.addresses.delete(principal_id(&claims)?, id).await?;
    Ok(Json(ApiResponse::success_empty()))
}
