//! 优惠券（Kupon）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{CouponStatus, DiscountType};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// 百分比时为 1-100，固定金额时为 IDR
    pub discount_value: i64,
    /// 百分比折扣的封顶金额
    #[sqlx(default)]
    pub max_discount: Option<i64>,
    pub min_purchase: i64,
    /// 总使用次数上限，None 表示不限
    #[sqlx(default)]
    pub usage_limit: Option<i32>,
    /// 每个买家的使用次数上限
    #[sqlx(default)]
    pub per_buyer_limit: Option<i32>,
    pub used_count: i32,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    /// 适用分类，空表示全部分类
    pub category_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// 派生状态，优先级：已过期 > 停用 > 未开始 > 已用完 > 生效中
    ///
    /// 过期 Worker 会同时停用优惠券，过期判断必须在停用之前
    pub fn status(&self, now: DateTime<Utc>) -> CouponStatus {
        if now >= self.expires_at {
            CouponStatus::Expired
        } else if !self.is_active {
            CouponStatus::Inactive
        } else if now < self.starts_at {
            CouponStatus::Scheduled
        } else if self.is_exhausted() {
            CouponStatus::Exhausted
        } else {
            CouponStatus::Active
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.used_count >= limit)
    }

    /// 该分类是否在适用范围内
    pub fn applies_to(&self, category_id: i64) -> bool {
        self.category_ids.is_empty() || self.category_ids.contains(&category_id)
    }
}

/// 优惠券 + 派生状态，用于后台列表展示
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponView {
    #[serde(flatten)]
    pub coupon: Coupon,
    pub status: CouponStatus,
}

impl CouponView {
    pub fn new(coupon: Coupon, now: DateTime<Utc>) -> Self {
        let status = coupon.status(now);
        Self { coupon, status }
    }
}

/// 待写入的优惠券字段
#[derive(Debug, Clone, PartialEq)]
pub struct CouponInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    pub min_purchase: i64,
    pub usage_limit: Option<i32>,
    pub per_buyer_limit: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub category_ids: Vec<i64>,
}

impl CouponInput {
    pub fn from_coupon(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            name: coupon.name.clone(),
            description: coupon.description.clone(),
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            max_discount: coupon.max_discount,
            min_purchase: coupon.min_purchase,
            usage_limit: coupon.usage_limit,
            per_buyer_limit: coupon.per_buyer_limit,
            starts_at: coupon.starts_at,
            expires_at: coupon.expires_at,
            is_active: coupon.is_active,
            category_ids: coupon.category_ids.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    pub fn coupon() -> Coupon {
        let now = Utc::now();
        Coupon {
            id: 1,
            code: "HEMAT10".to_string(),
            name: "Hemat 10%".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            max_discount: None,
            min_purchase: 0,
            usage_limit: None,
            per_buyer_limit: None,
            used_count: 0,
            starts_at: now - Duration::days(1),
            expires_at: now + Duration::days(30),
            is_active: true,
            category_ids: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::coupon;
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_precedence() {
        let now = Utc::now();

        assert_eq!(coupon().status(now), CouponStatus::Active);

        let mut c = coupon();
        c.is_active = false;
        assert_eq!(c.status(now), CouponStatus::Inactive);

        let mut c = coupon();
        c.is_active = false;
        c.starts_at = now + Duration::hours(1);
        assert_eq!(c.status(now), CouponStatus::Inactive);

        let mut c = coupon();
        c.starts_at = now + Duration::hours(1);
        assert_eq!(c.status(now), CouponStatus::Scheduled);

        let mut c = coupon();
        c.expires_at = now;
        assert_eq!(c.status(now), CouponStatus::Expired);

        let mut c = coupon();
        c.usage_limit = Some(5);
        c.used_count = 5;
        assert_eq!(c.status(now), CouponStatus::Exhausted);
    }

    #[test]
    fn test_expired_coupon_stays_expired_after_deactivation() {
        let now = Utc::now();
        let mut c = coupon();
        c.expires_at = now - Duration::days(1);
        assert_eq!(c.status(now), CouponStatus::Expired);

        // 过期 Worker 停用后仍按已过期展示和筛选
        c.is_active = false;
        assert_eq!(c.status(now), CouponStatus::Expired);

        c.usage_limit = Some(1);
        c.used_count = 1;
        assert_eq!(c.status(now), CouponStatus::Expired);
    }

    #[test]
    fn test_category_scope() {
        let mut c = coupon();
        assert!(c.applies_to(99));

        c.category_ids = vec![1, 2];
        assert!(c.applies_to(2));
        assert!(!c.applies_to(3));
    }

    #[test]
    fn test_view_serializes_status() {
        let view = CouponView::new(coupon(), Utc::now());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["code"], "HEMAT10");
        assert_eq!(json["discountType"], "percentage");
    }
}
