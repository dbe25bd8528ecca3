//! 商品目录 API 处理器
//!
//! 分类树、品牌/成色/包装状况主数据与仓库

use axum::{
    Json,
    extract::{Path, State},
};
use commerce::dto::{
    CreateCategoryRequest, MasterDataRequest, UpdateCategoryRequest, WarehouseRequest,
};
use commerce::{Category, CategoryNode, MasterData, MasterDataKind, Warehouse};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::response::ApiResponse;
use crate::state::AppState;

fn parse_kind(segment: &str) -> Result<MasterDataKind> {
    MasterDataKind::from_path(segment)
        .ok_or_else(|| ApiError::NotFound(format!("Jenis data master tidak dikenal: {}", segment)))
}

// ==================== 分类 ====================

/// 前台分类树（仅启用的分类）
///
/// GET /api/public/categories
pub async fn public_category_tree(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryNode>>>> {
    let tree = state.categories.public_tree().await?;
    Ok(Json(ApiResponse::success(tree)))
}

/// 按 slug 获取前台分类
///
/// GET /api/public/categories/{slug}
pub async fn public_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state.categories.get_public_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// 后台分类树（含停用分类）
///
/// GET /api/admin/categories
pub async fn admin_category_tree(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryNode>>>> {
    let tree = state.categories.admin_tree().await?;
    Ok(Json(ApiResponse::success(tree)))
}

/// 创建分类
///
/// POST /api/admin/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state.categories.create(req).await?;
    info!(category_id = category.id, name = %category.name, "Category created");
    Ok(Json(ApiResponse::success(category)))
}

/// 分类详情
///
/// GET /api/admin/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state.categories.get(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// 修改分类
///
/// PUT /api/admin/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state.categories.update(id, req).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// 删除分类
///
/// DELETE /api/admin/categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.categories.delete(id).await?;
    info!(category_id = id, "Category deleted");
    Ok(Json(ApiResponse::success_empty()))
}

// ==================== 主数据 ====================

/// 前台主数据列表（仅启用项）
///
/// GET /api/public/master-data/{kind}
pub async fn public_master_data(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<Vec<MasterData>>>> {
    let items = state.master_data.list(parse_kind(&kind)?, true).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// 后台主数据列表
///
/// GET /api/admin/master-data/{kind}
pub async fn list_master_data(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<Vec<MasterData>>>> {
    let items = state.master_data.list(parse_kind(&kind)?, false).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// 创建主数据
///
/// POST /api/admin/master-data/{kind}
pub async fn create_master_data(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(req): Json<MasterDataRequest>,
) -> Result<Json<ApiResponse<MasterData>>> {
    let item = state.master_data.create(parse_kind(&kind)?, req).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// 主数据详情
///
/// GET /api/admin/master-data/{kind}/{id}
pub async fn get_master_data(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<MasterData>>> {
    let item = state.master_data.get(parse_kind(&kind)?, id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// 修改主数据
///
/// PUT /api/admin/master-data/{kind}/{id}
pub async fn update_master_data(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Json(req): Json<MasterDataRequest>,
) -> Result<Json<ApiResponse<MasterData>>> {
    let item = state.master_data.update(parse_kind(&kind)?, id, req).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// 删除主数据，仍被商品引用时拒绝
///
/// DELETE /api/admin/master-data/{kind}/{id}
pub async fn delete_master_data(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<()>>> {
    state.master_data.delete(parse_kind(&kind)?, id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

// ==================== 仓库 ====================

/// 仓库列表
///
/// GET /api/admin/warehouses
pub async fn list_warehouses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Warehouse>>>> {
    let warehouses = state.warehouses.list(false).await?;
    Ok(Json(ApiResponse::success(warehouses)))
}

/// 创建仓库
///
/// POST /api/admin/warehouses
pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(req): Json<WarehouseRequest>,
) -> Result<Json<ApiResponse<Warehouse>>> {
    let warehouse = state.warehouses.create(req).await?;
    Ok(Json(ApiResponse::success(warehouse)))
}

/// 仓库详情
///
/// GET /api/admin/warehouses/{id}
pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Warehouse>>> {
    let warehouse = state.warehouses.get(id).await?;
    Ok(Json(ApiResponse::success(warehouse)))
}

/// 修改仓库
///
/// PUT /api/admin/warehouses/{id}
pub async fn update_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<WarehouseRequest>,
) -> Result<Json<ApiResponse<Warehouse>>> {
    let warehouse = state.warehouses.update(id, req).await?;
    Ok(Json(ApiResponse::success(warehouse)))
}

/// 删除仓库
///
/// DELETE /api/admin/warehouses/{id}
pub async fn delete_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.warehouses.delete(id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_unknown_master_data_kind_is_not_found() {
        assert_eq!(parse_kind("conditions").unwrap(), MasterDataKind::Condition);

        let err = parse_kind("colors").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
