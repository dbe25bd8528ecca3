//! 内容 DTO

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::models::PublishStatus;

/// 横幅请求（创建与修改共用）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BannerRequest {
    #[validate(length(min = 1, max = 150, message = "Judul harus 1-150 karakter"))]
    pub title: String,
    #[validate(url(message = "URL gambar tidak valid"))]
    pub image_url: String,
    #[validate(url(message = "URL tautan tidak valid"))]
    pub link_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// 常见问题请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FaqRequest {
    #[validate(length(min = 1, max = 300, message = "Pertanyaan harus 1-300 karakter"))]
    pub question: String,
    #[validate(length(min = 1, message = "Jawaban wajib diisi"))]
    pub answer: String,
    pub is_active: Option<bool>,
}

/// 视频请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    #[validate(length(min = 1, max = 150, message = "Judul harus 1-150 karakter"))]
    pub title: String,
    /// 仅允许 http / https
    pub video_url: String,
    #[validate(url(message = "URL thumbnail tidak valid"))]
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// 文章请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostRequest {
    #[validate(length(min = 1, max = 200, message = "Judul harus 1-200 karakter"))]
    pub title: String,
    #[validate(length(max = 500, message = "Ringkasan maksimal 500 karakter"))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1, message = "Isi artikel wajib diisi"))]
    pub body: String,
    #[validate(url(message = "URL gambar sampul tidak valid"))]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
}

/// 后台文章列表过滤
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostQuery {
    pub status: Option<PublishStatus>,
    pub keyword: Option<String>,
}
