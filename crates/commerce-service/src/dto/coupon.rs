//! 优惠券 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::order::OrderLineRequest;
use crate::models::{CouponStatus, DiscountType};

/// 创建优惠券请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    /// 保存前转为大写
    pub code: String,
    #[validate(length(min = 1, max = 100, message = "Nama kupon harus 1-100 karakter"))]
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Minimum belanja tidak boleh negatif"))]
    pub min_purchase: i64,
    #[validate(range(min = 1, message = "Batas total pemakaian harus lebih dari 0"))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1, message = "Batas pemakaian per pembeli harus lebih dari 0"))]
    pub per_buyer_limit: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// 更新优惠券请求
///
/// 券码不可修改；已被使用的优惠券不允许修改折扣规则
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCouponRequest {
    #[validate(length(min = 1, max = 100, message = "Nama kupon harus 1-100 karakter"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub max_discount: Option<i64>,
    #[validate(range(min = 0, message = "Minimum belanja tidak boleh negatif"))]
    pub min_purchase: Option<i64>,
    #[validate(range(min = 1, message = "Batas total pemakaian harus lebih dari 0"))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1, message = "Batas pemakaian per pembeli harus lebih dari 0"))]
    pub per_buyer_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub category_ids: Option<Vec<i64>>,
}

/// 优惠券列表过滤
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuery {
    pub status: Option<CouponStatus>,
    pub keyword: Option<String>,
}

/// 优惠券试算请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCouponRequest {
    #[validate(length(min = 1, max = 32, message = "Kode kupon wajib diisi"))]
    pub code: String,
    #[validate(length(min = 1, message = "Daftar produk tidak boleh kosong"), nested)]
    pub lines: Vec<OrderLineRequest>,
}

/// 参与优惠券计算的订单行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponLine {
    pub category_id: i64,
    pub line_total: i64,
}

/// 试算结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub coupon_id: i64,
    pub code: String,
    /// 适用范围内的商品小计
    pub eligible_subtotal: i64,
    pub discount: i64,
}
