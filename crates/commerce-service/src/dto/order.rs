//! 订单与支付 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{OrderFilter, OrderStatus, PaymentMethod};

/// 下单商品行
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: i64,
    #[validate(range(min = 1, message = "Jumlah beli harus lebih dari 0"))]
    pub quantity: i32,
}

/// 下单请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub address_id: i64,
    #[validate(length(min = 1, max = 100, message = "Jumlah baris pesanan harus 1-100"), nested)]
    pub lines: Vec<OrderLineRequest>,
    pub coupon_code: Option<String>,
    #[validate(length(max = 500, message = "Catatan pesanan maksimal 500 karakter"))]
    pub note: Option<String>,
}

/// 计价后的商品行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: i64,
    pub category_id: i64,
    pub sku: String,
    pub product_name: String,
    pub unit: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
    pub weight_grams: i64,
}

/// 下单预览（不落库）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPreview {
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
    pub coupon_code: Option<String>,
    pub discount_amount: i64,
    pub total_weight_grams: i64,
    pub shipping_fee: i64,
    pub total_amount: i64,
}

/// 取消订单请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    #[validate(length(max = 500, message = "Alasan pembatalan maksimal 500 karakter"))]
    pub reason: Option<String>,
}

/// 后台订单状态变更请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOrderRequest {
    pub status: OrderStatus,
    #[validate(length(max = 500, message = "Catatan maksimal 500 karakter"))]
    pub note: Option<String>,
    /// 发货时必填
    #[validate(length(min = 1, max = 100, message = "Nomor resi harus 1-100 karakter"))]
    pub tracking_number: Option<String>,
}

/// 提交支付凭证请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPaymentRequest {
    pub method: PaymentMethod,
    #[validate(range(min = 1, message = "Jumlah pembayaran harus lebih dari 0"))]
    pub amount: i64,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Nomor referensi pembayaran harus 1-100 karakter"
    ))]
    pub reference: String,
    #[validate(url(message = "URL bukti pembayaran tidak valid"))]
    pub proof_url: Option<String>,
}

/// 审核支付请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub approve: bool,
    #[validate(length(min = 1, max = 500, message = "Alasan penolakan harus 1-500 karakter"))]
    pub reason: Option<String>,
}

/// 买家订单列表过滤
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerOrderQuery {
    pub status: Option<OrderStatus>,
}

/// 后台订单列表过滤
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderQuery {
    pub status: Option<OrderStatus>,
    pub buyer_id: Option<i64>,
    pub order_number: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl From<AdminOrderQuery> for OrderFilter {
    fn from(query: AdminOrderQuery) -> Self {
        Self {
            buyer_id: query.buyer_id,
            status: query.status,
            order_number: query
                .order_number
                .map(|n| n.trim().to_uppercase())
                .filter(|n| !n.is_empty()),
            created_from: query.created_from,
            created_to: query.created_to,
        }
    }
}
