//! 账号管理 API 处理器
//!
//! 后台管理员与买家账号的查询、创建、启用停用，以及买家维护自己的资料

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use commerce::dto::{
    AccountFilter, CreateAdminRequest, PageRequest, PageResponse, SetActiveRequest,
    UpdateBuyerProfileRequest,
};
use commerce::{Admin, Buyer, Claims};
use tracing::info;

use super::principal_id;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 管理员列表
///
/// GET /api/admin/admins
pub async fn list_admins(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<Admin>>>> {
    let admins = state.accounts.list_admins(filter, page).await?;
    Ok(Json(ApiResponse::success(admins)))
}

/// 创建管理员
///
/// POST /api/admin/admins
pub async fn create_admin(
    State(state): State<AppState>,
    Json(req): Json<CreateAdminRequest>,
) -> Result<Json<ApiResponse<Admin>>> {
    let admin = state.accounts.create_admin(req).await?;
    Ok(Json(ApiResponse::success(admin)))
}

/// 管理员详情
///
/// GET /api/admin/admins/{id}
pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Admin>>> {
    let admin = state.accounts.get_admin(id).await?;
    Ok(Json(ApiResponse::success(admin)))
}

/// 启用 / 停用管理员，不能停用自己
///
/// PUT /api/admin/admins/{id}/status
pub async fn set_admin_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<Admin>>> {
    let actor_id = principal_id(&claims)?;
    let admin = state
        .accounts
        .set_admin_active(actor_id, id, req.is_active)
        .await?;
    info!(actor_id, admin_id = id, is_active = req.is_active, "管理员状态已变更");
    Ok(Json(ApiResponse::success(admin)))
}

/// 买家列表
///
/// GET /api/admin/buyers
pub async fn list_buyers(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<Buyer>>>> {
    let buyers = state.accounts.list_buyers(filter, page).await?;
    Ok(Json(ApiResponse::success(buyers)))
}

/// 买家详情
///
/// GET /api/admin/buyers/{id}
pub async fn get_buyer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Buyer>>> {
    let buyer = state.accounts.get_buyer(id).await?;
    Ok(Json(ApiResponse::success(buyer)))
}

/// 启用 / 停用买家，停用时吊销其全部会话
///
/// PUT /api/admin/buyers/{id}/status
pub async fn set_buyer_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<Buyer>>> {
    let buyer = state.accounts.set_buyer_active(id, req.is_active).await?;
    Ok(Json(ApiResponse::success(buyer)))
}

/// 买家查看自己的资料
///
/// GET /api/buyer/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Buyer>>> {
    let buyer = state.accounts.get_buyer(principal_id(&claims)?).await?;
    Ok(Json(ApiResponse::success(buyer)))
}

/// 买家修改自己的资料
///
/// PUT /api/buyer/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateBuyerProfileRequest>,
) -> Result<Json<ApiResponse<Buyer>>> {
    let buyer = state
        .accounts
        .update_buyer_profile(principal_id(&claims)?, req)
        .await?;
    Ok(Json(ApiResponse::success(buyer)))
}
