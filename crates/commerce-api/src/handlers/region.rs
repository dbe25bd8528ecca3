//! 行政区划 API 处理器
//!
//! 省 / 市 / 区县 / 街道逐级查询，均为公开接口

use axum::{
    Json,
    extract::{Path, State},
};
use commerce::{City, District, Province, RegionPath, SubDistrict};

use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 省份列表
///
/// GET /api/public/regions/provinces
pub async fn list_provinces(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Province>>>> {
    let provinces = state.regions.list_provinces().await?;
    Ok(Json(ApiResponse::success(provinces)))
}

/// 省份下的城市
///
/// GET /api/public/regions/provinces/{id}/cities
pub async fn list_cities(
    State(state): State<AppState>,
    Path(province_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<City>>>> {
    let cities = state.regions.list_cities(province_id).await?;
    Ok(Json(ApiResponse::success(cities)))
}

/// 城市下的区县
///
/// GET /api/public/regions/cities/{id}/districts
pub async fn list_districts(
    State(state): State<AppState>,
    Path(city_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<District>>>> {
    let districts = state.regions.list_districts(city_id).await?;
    Ok(Json(ApiResponse::success(districts)))
}

/// 区县下的街道
///
/// GET /api/public/regions/districts/{id}/sub-districts
pub async fn list_sub_districts(
    State(state): State<AppState>,
    Path(district_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<SubDistrict>>>> {
    let sub_districts = state.regions.list_sub_districts(district_id).await?;
    Ok(Json(ApiResponse::success(sub_districts)))
}

/// 由街道反查完整区划路径
///
/// GET /api/public/regions/sub-districts/{id}/path
pub async fn resolve_path(
    State(state): State<AppState>,
    Path(sub_district_id): Path<i64>,
) -> Result<Json<ApiResponse<RegionPath>>> {
    let path = state.regions.resolve_path(sub_district_id).await?;
    Ok(Json(ApiResponse::success(path)))
}
