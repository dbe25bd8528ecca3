//! 内容 API 处理器
//!
//! 横幅、常见问题、视频与博客文章：前台只读，后台维护

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use commerce::dto::{
    BannerRequest, BlogPostQuery, BlogPostRequest, FaqRequest, PageRequest, PageResponse,
    VideoRequest,
};
use commerce::{Banner, BlogPost, Claims, Faq, Video};
use serde::Deserialize;

use super::principal_id;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 前台文章检索参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSearchParams {
    pub keyword: Option<String>,
}

// ==================== 前台 ====================

/// 当前可展示的横幅
///
/// GET /api/public/banners
pub async fn visible_banners(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Banner>>>> {
    let banners = state.content.visible_banners().await?;
    Ok(Json(ApiResponse::success(banners)))
}

/// 启用的常见问题
///
/// GET /api/public/faqs
pub async fn public_faqs(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Faq>>>> {
    let faqs = state.content.list_faqs(true).await?;
    Ok(Json(ApiResponse::success(faqs)))
}

/// 启用的视频
///
/// GET /api/public/videos
pub async fn public_videos(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Video>>>> {
    let videos = state.content.list_videos(true).await?;
    Ok(Json(ApiResponse::success(videos)))
}

/// 已发布的文章
///
/// GET /api/public/blog-posts
pub async fn published_posts(
    State(state): State<AppState>,
    Query(params): Query<PostSearchParams>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<BlogPost>>>> {
    let posts = state.content.published_posts(params.keyword, page).await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// 按 slug 读取已发布的文章
///
/// GET /api/public/blog-posts/{slug}
pub async fn published_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BlogPost>>> {
    let post = state.content.published_post(&slug).await?;
    Ok(Json(ApiResponse::success(post)))
}

// ==================== 横幅 ====================

/// GET /api/admin/banners
pub async fn list_banners(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Banner>>>> {
    let banners = state.content.list_banners().await?;
    Ok(Json(ApiResponse::success(banners)))
}

/// POST /api/admin/banners
pub async fn create_banner(
    State(state): State<AppState>,
    Json(req): Json<BannerRequest>,
) -> Result<Json<ApiResponse<Banner>>> {
    let banner = state.content.create_banner(req).await?;
    Ok(Json(ApiResponse::success(banner)))
}

/// GET /api/admin/banners/{id}
pub async fn get_banner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Banner>>> {
    let banner = state.content.get_banner(id).await?;
    Ok(Json(ApiResponse::success(banner)))
}

/// PUT /api/admin/banners/{id}
pub async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<BannerRequest>,
) -> Result<Json<ApiResponse<Banner>>> {
    let banner = state.content.update_banner(id, req).await?;
    Ok(Json(ApiResponse::success(banner)))
}

/// DELETE /api/admin/banners/{id}
pub async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.content.delete_banner(id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

// ==================== 常见问题 ====================

/// GET /api/admin/faqs
pub async fn list_faqs(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Faq>>>> {
    let faqs = state.content.list_faqs(false).await?;
    Ok(Json(ApiResponse::success(faqs)))
}

/// POST /api/admin/faqs
pub async fn create_faq(
    State(state): State<AppState>,
    Json(req): Json<FaqRequest>,
) -> Result<Json<ApiResponse<Faq>>> {
    let faq = state.content.create_faq(req).await?;
    Ok(Json(ApiResponse::success(faq)))
}

/// GET /api/admin/faqs/{id}
pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Faq>>> {
    let faq = state.content.get_faq(id).await?;
    Ok(Json(ApiResponse::success(faq)))
}

/// PUT /api/admin/faqs/{id}
pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<FaqRequest>,
) -> Result<Json<ApiResponse<Faq>>> {
    let faq = state.content.update_faq(id, req).await?;
    Ok(Json(ApiResponse::success(faq)))
}

/// DELETE /api/admin/faqs/{id}
pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.content.delete_faq(id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

// ==================== 视频 ====================

/// GET /api/admin/videos
pub async fn list_videos(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Video>>>> {
    let videos = state.content.list_videos(false).await?;
    Ok(Json(ApiResponse::success(videos)))
}

/// POST /api/admin/videos
pub async fn create_video(
    State(state): State<AppState>,
    Json(req): Json<VideoRequest>,
) -> Result<Json<ApiResponse<Video>>> {
    let video = state.content.create_video(req).await?;
    Ok(Json(ApiResponse::success(video)))
}

/// GET /api/admin/videos/{id}
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Video>>> {
    let video = state.content.get_video(id).await?;
    Ok(Json(ApiResponse::success(video)))
}

/// PUT /api/admin/videos/{id}
pub async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<VideoRequest>,
) -> Result<Json<ApiResponse<Video>>> {
    let video = state.content.update_video(id, req).await?;
    Ok(Json(ApiResponse::success(video)))
}

/// DELETE /api/admin/videos/{id}
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.content.delete_video(id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

// ==================== 文章 ====================

/// 后台文章列表，可按状态与关键字过滤
///
/// GET /api/admin/blog-posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogPostQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<BlogPost>>>> {
    let posts = state.content.list_posts(query, page).await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// 创建文章，作者为当前管理员
///
/// POST /api/admin/blog-posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BlogPostRequest>,
) -> Result<Json<ApiResponse<BlogPost>>> {
    let post = state
        .content
        .create_post(principal_id(&claims)?, req)
        .await?;
    Ok(Json(ApiResponse::success(post)))
}

/// GET /api/admin/blog-posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BlogPost>>> {
    let post = state.content.get_post(id).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// PUT /api/admin/blog-posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<BlogPostRequest>,
) -> Result<Json<ApiResponse<BlogPost>>> {
    let post = state.content.update_post(id, req).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// DELETE /api/admin/blog-posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.content.delete_post(id).await?;
    Ok(Json(ApiResponse::success_empty()))
}
