//! 商品评价（Ulasan）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ReviewStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub buyer_id: i64,
    pub product_id: i64,
    pub order_id: i64,
    /// 1-5 星
    pub rating: i32,
    #[sqlx(default)]
    pub comment: Option<String>,
    pub status: ReviewStatus,
    #[sqlx(default)]
    pub rejection_reason: Option<String>,
    #[sqlx(default)]
    pub moderated_by: Option<i64>,
    #[sqlx(default)]
    pub moderated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 前台展示的评价，只暴露买家名称
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicReview {
    pub id: i64,
    pub buyer_name: String,
    pub rating: i32,
    #[sqlx(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 评分汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// 平均分，保留一位小数
    pub average: f64,
    pub count: i64,
    /// 下标 0..5 依次对应 1..5 星的数量
    pub distribution: [i64; 5],
}

impl RatingSummary {
    /// 从 (星级, 数量) 分组结果汇总，非法星级忽略
    pub fn from_counts(counts: &[(i32, i64)]) -> Self {
        let mut distribution = [0i64; 5];
        for &(rating, count) in counts {
            if (1..=5).contains(&rating) {
                distribution[(rating - 1) as usize] += count;
            }
        }

        let count: i64 = distribution.iter().sum();
        let weighted: i64 = distribution
            .iter()
            .enumerate()
            .map(|(i, n)| (i as i64 + 1) * n)
            .sum();
        let average = if count == 0 {
            0.0
        } else {
            (weighted as f64 / count as f64 * 10.0).round() / 10.0
        };

        Self {
            average,
            count,
            distribution,
        }
    }
}
