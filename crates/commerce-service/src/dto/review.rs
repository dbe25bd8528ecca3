//! 评价 DTO

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::PageResponse;
use crate::models::{PublicReview, RatingSummary, ReviewStatus};

/// 提交评价请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub product_id: i64,
    pub order_id: i64,
    #[validate(range(min = 1, max = 5, message = "Rating harus antara 1 dan 5"))]
    pub rating: i32,
    #[validate(length(max = 2000, message = "Isi ulasan maksimal 2000 karakter"))]
    pub comment: Option<String>,
}

/// 审核评价请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReviewRequest {
    pub approve: bool,
    #[validate(length(min = 1, max = 500, message = "Alasan penolakan harus 1-500 karakter"))]
    pub reason: Option<String>,
}

/// 后台评价列表过滤
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub status: Option<ReviewStatus>,
    pub product_id: Option<i64>,
}

/// 商品评价页：评分汇总 + 当前页评价
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviews {
    pub summary: RatingSummary,
    pub reviews: PageResponse<PublicReview>,
}
